//! [`ScenarioController`] and the [`Scenario`] it keeps alive.

use crate::capture::{CaptureLoop, SharedChannel};
use crate::channel::open_channel;
use crate::config::ScenarioConfig;
use crate::error::ProcessError;
use crate::expect::{ExpectOutcome, ExpectRequest, await_match};
use crate::ledger::OutputLedger;
use crate::report::Reporter;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// One running child: its channel, everything it wrote, and the task
/// capturing that output.
pub struct Scenario {
    channel: SharedChannel,
    ledger: OutputLedger,
    capture: CaptureLoop,
    pid: Option<u32>,
}

impl Scenario {
    /// Spawn `command` and start capturing its output.
    ///
    /// The capture task is only created once the child is running, so a
    /// failed start leaves nothing behind.
    pub async fn start(
        config: &ScenarioConfig,
        command: &str,
        args: &[String],
    ) -> Result<Self, ProcessError> {
        let mut channel = open_channel(config, command, args);
        channel.start().await?;
        let pid = channel.process_id();

        let channel: SharedChannel = Arc::new(Mutex::new(channel));
        let ledger = OutputLedger::new();
        let capture = CaptureLoop::spawn(channel.clone(), ledger.clone(), config.capture_interval);
        debug!(command, ?pid, channel = %config.channel, "scenario started");

        Ok(Self {
            channel,
            ledger,
            capture,
            pid,
        })
    }

    pub fn ledger(&self) -> &OutputLedger {
        &self.ledger
    }

    pub fn process_id(&self) -> Option<u32> {
        self.pid
    }

    pub async fn write(&self, text: &str) -> Result<(), ProcessError> {
        self.channel.lock().await.write(text).await
    }

    /// Stop capturing, then terminate the child.
    pub async fn stop(self) -> Result<(), ProcessError> {
        self.capture.shutdown().await;
        let result = self.channel.lock().await.stop().await;
        debug!(pid = ?self.pid, captured = self.ledger.len(), "scenario stopped");
        result
    }
}

/// Owner of the single active [`Scenario`] and entry point for the four
/// operations a driver can issue: `launch`, `write`, `expect` and `stop`.
///
/// Every operation other than `launch` quietly does nothing when no scenario
/// is running, so a script can keep issuing verbs after a critical failure
/// tore its scenario down.
pub struct ScenarioController {
    config: ScenarioConfig,
    reporter: Arc<dyn Reporter>,
    active: Option<Scenario>,
}

impl ScenarioController {
    pub fn new(config: ScenarioConfig, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            config,
            reporter,
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Ledger of the active scenario, if any.
    pub fn ledger(&self) -> Option<&OutputLedger> {
        self.active.as_ref().map(Scenario::ledger)
    }

    /// Pid of the active scenario's child, if any.
    pub fn process_id(&self) -> Option<u32> {
        self.active.as_ref().and_then(Scenario::process_id)
    }

    /// Replace whatever is running with a fresh scenario for `command`.
    ///
    /// The previous scenario is stopped first; if that fails the error is
    /// logged and the launch goes ahead anyway.
    ///
    /// # Errors
    ///
    /// [`ProcessError::MissingCommand`] for an empty command, before anything
    /// is reported or stopped. [`ProcessError::SpawnFailed`] when the program
    /// cannot be started, in which case no scenario is active afterwards.
    pub async fn launch(&mut self, command: &str, args: &[String]) -> Result<(), ProcessError> {
        if command.is_empty() {
            return Err(ProcessError::MissingCommand);
        }
        let mut items = vec![command];
        items.extend(args.iter().map(String::as_str));
        self.reporter.instruction("launch", &items);

        self.stop_active().await;
        self.active = Some(Scenario::start(&self.config, command, args).await?);
        Ok(())
    }

    /// Send one line of input to the active scenario.
    ///
    /// # Errors
    ///
    /// [`ProcessError::WriteFailed`] if the child's input is closed.
    pub async fn write(&mut self, input: &str) -> Result<(), ProcessError> {
        let Some(scenario) = &self.active else {
            return Ok(());
        };
        self.reporter.instruction("write", &[input]);
        scenario.write(input).await
    }

    /// Wait for `request.expected` to appear in the active scenario's output.
    ///
    /// Never fails: the outcome is reported and returned. A critical timeout
    /// stops the scenario before returning.
    pub async fn expect(&mut self, request: &ExpectRequest) -> ExpectOutcome {
        let Some(scenario) = &self.active else {
            return ExpectOutcome::Inactive;
        };
        self.reporter
            .instruction("expect", &[request.expected.as_str()]);

        let outcome = await_match(scenario.ledger(), request, self.config.poll_tick).await;
        self.reporter.outcome(outcome);
        if outcome == ExpectOutcome::CriticalTimeout {
            self.stop_active().await;
        }
        outcome
    }

    /// Stop the active scenario, if any.
    pub async fn stop(&mut self) {
        self.reporter.instruction("stop", &[]);
        self.stop_active().await;
    }

    /// Like [`stop`](Self::stop) without reporting an instruction; meant for
    /// cleaning up once a driver is done.
    pub async fn shutdown(&mut self) {
        self.stop_active().await;
    }

    async fn stop_active(&mut self) {
        if let Some(scenario) = self.active.take() {
            let pid = scenario.process_id();
            if let Err(err) = scenario.stop().await {
                warn!(?pid, %err, "failed to stop scenario");
            }
        }
    }
}
