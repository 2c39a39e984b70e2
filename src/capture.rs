//! [`CaptureLoop`], the background task moving child output into the ledger.

use crate::channel::ProcessChannel;
use crate::error::ProcessError;
use crate::ledger::OutputLedger;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// A process channel shared between its scenario and the capture task.
pub type SharedChannel = Arc<Mutex<Box<dyn ProcessChannel>>>;

/// Handle to the task that keeps reading a channel into an [`OutputLedger`].
///
/// The task checks its cancellation flag before every read and before every
/// append, so once [`shutdown`](Self::shutdown) returns it no longer touches
/// the channel or the ledger. Dropping the handle cancels the task too.
pub struct CaptureLoop {
    cancelled: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CaptureLoop {
    /// Start capturing. Must be called from within a tokio runtime.
    pub fn spawn(channel: SharedChannel, ledger: OutputLedger, interval: Duration) -> Self {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let handle = tokio::spawn(async move {
            run(channel, ledger, interval, flag).await;
        });
        Self {
            cancelled,
            handle: Some(handle),
        }
    }

    /// Whether the task exited, either on end of stream or after cancellation.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Cancel the task and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                warn!(%err, "capture task did not exit cleanly");
            }
        }
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

async fn run(
    channel: SharedChannel,
    ledger: OutputLedger,
    interval: Duration,
    cancelled: Arc<AtomicBool>,
) {
    loop {
        tokio::time::sleep(interval).await;
        if cancelled.load(Ordering::SeqCst) {
            debug!("capture cancelled");
            return;
        }

        let chunk = channel.lock().await.read().await;
        match chunk {
            Ok(data) if data.is_empty() => {}
            Ok(data) => {
                if cancelled.load(Ordering::SeqCst) {
                    debug!("capture cancelled");
                    return;
                }
                trace!(bytes = data.len(), "captured output");
                ledger.append(&data);
            }
            Err(ProcessError::EndOfStream) => {
                debug!(captured = ledger.len(), "capture reached end of stream");
                return;
            }
            // Crashes surface through stop/exit status, not through capture.
            Err(err) => trace!(%err, "ignoring read error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::{Instant, sleep};

    /// Replays a fixed list of read results, then reports end of stream.
    struct ScriptedChannel {
        reads: VecDeque<Result<Vec<u8>, ProcessError>>,
        calls: Arc<AtomicUsize>,
        endless: bool,
    }

    impl ScriptedChannel {
        fn shared(
            reads: Vec<Result<Vec<u8>, ProcessError>>,
            endless: bool,
        ) -> (SharedChannel, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let channel: Box<dyn ProcessChannel> = Box::new(Self {
                reads: reads.into(),
                calls: calls.clone(),
                endless,
            });
            (Arc::new(Mutex::new(channel)), calls)
        }
    }

    #[async_trait]
    impl ProcessChannel for ScriptedChannel {
        async fn start(&mut self) -> Result<(), ProcessError> {
            Ok(())
        }

        async fn read(&mut self) -> Result<Vec<u8>, ProcessError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reads.pop_front() {
                Some(result) => result,
                None if self.endless => Ok(Vec::new()),
                None => Err(ProcessError::EndOfStream),
            }
        }

        async fn write(&mut self, _text: &str) -> Result<(), ProcessError> {
            Ok(())
        }

        async fn stop(&mut self) -> Result<(), ProcessError> {
            Ok(())
        }

        fn process_id(&self) -> Option<u32> {
            None
        }
    }

    async fn wait_finished(capture: &CaptureLoop) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !capture.is_finished() {
            assert!(Instant::now() < deadline, "capture never finished");
            sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_appends_until_end_of_stream() {
        let (channel, _) = ScriptedChannel::shared(
            vec![
                Ok(b"Name: ".to_vec()),
                Ok(Vec::new()),
                Ok(b"AAA".to_vec()),
            ],
            false,
        );
        let ledger = OutputLedger::new();
        let capture = CaptureLoop::spawn(channel, ledger.clone(), Duration::from_millis(1));

        wait_finished(&capture).await;
        assert_eq!(ledger.dump(), b"Name: AAA");
        capture.shutdown().await;
    }

    #[tokio::test]
    async fn test_transient_errors_are_ignored() {
        let (channel, _) = ScriptedChannel::shared(
            vec![
                Ok(b"before".to_vec()),
                Err(ProcessError::Io(std::io::Error::other("hiccup"))),
                Ok(b" after".to_vec()),
            ],
            false,
        );
        let ledger = OutputLedger::new();
        let capture = CaptureLoop::spawn(channel, ledger.clone(), Duration::from_millis(1));

        wait_finished(&capture).await;
        assert_eq!(ledger.dump(), b"before after");
    }

    #[tokio::test]
    async fn test_shutdown_stops_reading() {
        let (channel, calls) = ScriptedChannel::shared(Vec::new(), true);
        let ledger = OutputLedger::new();
        let capture = CaptureLoop::spawn(channel, ledger, Duration::from_millis(1));

        sleep(Duration::from_millis(20)).await;
        capture.shutdown().await;

        let after_shutdown = calls.load(Ordering::SeqCst);
        assert!(after_shutdown > 0);
        sleep(Duration::from_millis(20)).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_shutdown);
    }

    #[tokio::test]
    async fn test_drop_cancels_task() {
        let (channel, calls) = ScriptedChannel::shared(Vec::new(), true);
        let capture = CaptureLoop::spawn(channel, OutputLedger::new(), Duration::from_millis(1));
        sleep(Duration::from_millis(10)).await;
        drop(capture);

        // One read may still be in flight when the flag flips.
        sleep(Duration::from_millis(10)).await;
        let settled = calls.load(Ordering::SeqCst);
        sleep(Duration::from_millis(20)).await;
        assert_eq!(calls.load(Ordering::SeqCst), settled);
    }
}
