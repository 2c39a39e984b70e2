use crate::error::ProcessError;
use std::io::{self, Read};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread;
use tracing::trace;

/// Size of a single read from the child.
const READ_CHUNK: usize = 1024;

/// Upper bound on what one [`drain`] call hands back.
const MAX_DRAIN: usize = 16 * 1024;

/// Spawns a background thread that forwards everything `reader` yields to `tx`.
///
/// The thread ends on end-of-file, on a read error, or once every receiver is
/// gone. Dropping its sender is how the channel learns the stream ended.
pub(crate) fn spawn_reader<R: Read + Send + 'static>(
    mut reader: R,
    tx: Sender<Vec<u8>>,
) -> io::Result<()> {
    thread::Builder::new()
        .name("expectty-reader".into())
        .spawn(move || {
            let mut buffer = [0u8; READ_CHUNK];
            loop {
                match reader.read(&mut buffer) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(buffer[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    // A PTY master reports EIO once the child side is gone.
                    Err(err) => {
                        trace!(%err, "reader stopped");
                        break;
                    }
                }
            }
        })?;
    Ok(())
}

/// Collects the chunks queued by the reader threads without blocking.
///
/// Returns an empty chunk when nothing is queued yet, and
/// [`ProcessError::EndOfStream`] only once all readers have exited and their
/// output has been handed out.
pub(crate) fn drain(rx: &Receiver<Vec<u8>>) -> Result<Vec<u8>, ProcessError> {
    let mut chunk = Vec::new();
    while chunk.len() < MAX_DRAIN {
        match rx.try_recv() {
            Ok(data) => chunk.extend_from_slice(&data),
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) if chunk.is_empty() => {
                return Err(ProcessError::EndOfStream);
            }
            Err(TryRecvError::Disconnected) => break,
        }
    }
    Ok(chunk)
}
