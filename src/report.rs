//! Rendering of the instructions a scenario executes.
//!
//! Reporting is purely observational: nothing a [`Reporter`] does flows back
//! into the controller.

use crate::expect::ExpectOutcome;
use std::io::{self, Write};
use std::sync::Mutex;

/// Receives every instruction before it runs and every `expect` outcome.
pub trait Reporter: Send + Sync {
    /// `verb` is one of `launch`, `write`, `expect`, `stop`.
    fn instruction(&self, verb: &str, args: &[&str]);

    /// Result of the `expect` announced by the preceding instruction.
    fn outcome(&self, outcome: ExpectOutcome);
}

/// Plain-text rendering in the form `verb(arg,arg)`.
///
/// An `expect` stays on one line with its result: `expect(Name: ) OK`.
pub struct ConsoleReporter<W> {
    out: Mutex<W>,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn emit(&self, text: &str) {
        let mut out = self
            .out
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        // A closed stdout must not take the run down with it.
        let _ = out.write_all(text.as_bytes()).and_then(|()| out.flush());
    }
}

impl<W: Write + Send> Reporter for ConsoleReporter<W> {
    fn instruction(&self, verb: &str, args: &[&str]) {
        let line = format!("{verb}({})", args.join(","));
        if verb == "expect" {
            self.emit(&line);
        } else {
            self.emit(&format!("{line}\n"));
        }
    }

    fn outcome(&self, outcome: ExpectOutcome) {
        let text = match outcome {
            ExpectOutcome::Matched => " OK\n",
            ExpectOutcome::SoftTimeout => " ERROR\n",
            ExpectOutcome::CriticalTimeout => " FATAL\n",
            ExpectOutcome::Inactive => "\n",
        };
        self.emit(text);
    }
}

/// Sends everything to `tracing` instead of the terminal.
#[derive(Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn instruction(&self, verb: &str, args: &[&str]) {
        tracing::info!(verb, args = ?args, "instruction");
    }

    fn outcome(&self, outcome: ExpectOutcome) {
        match outcome {
            ExpectOutcome::Matched | ExpectOutcome::Inactive => {
                tracing::info!(%outcome, "expect finished");
            }
            ExpectOutcome::SoftTimeout => tracing::warn!(%outcome, "expect failed"),
            ExpectOutcome::CriticalTimeout => tracing::error!(%outcome, "expect failed"),
        }
    }
}
