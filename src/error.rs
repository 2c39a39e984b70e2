//! Error types shared by the process channels, the ledger and the controller.

use std::io;
use thiserror::Error;

/// Errors raised while controlling a child process.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// `launch` was called without a program to run.
    #[error("command to execute must be provided")]
    MissingCommand,

    /// The program could not be resolved, or the spawn itself failed.
    #[error("failed to spawn `{command}`: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// `start` was called on a channel that already owns a child.
    #[error("process channel already started")]
    AlreadyStarted,

    /// Input could not be delivered to the child.
    #[error("failed to write to the process: {0}")]
    WriteFailed(#[source] io::Error),

    /// The child closed its side of the channel and all output was drained.
    #[error("end of stream")]
    EndOfStream,

    /// Waiting for or terminating the child failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ProcessError {
    pub(crate) fn spawn_failed(
        command: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        ProcessError::SpawnFailed {
            command: command.into(),
            source: source.into(),
        }
    }

    pub(crate) fn closed() -> Self {
        ProcessError::WriteFailed(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "process channel is closed",
        ))
    }
}

/// Errors raised by [`OutputLedger::seek`](crate::OutputLedger::seek).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeekError {
    #[error("cannot seek {requested} bytes, only {available} unconsumed")]
    OutOfRange { requested: usize, available: usize },
}
