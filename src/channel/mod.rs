//! Child-process control behind one capability set, with a PTY-backed and a
//! pipe-backed variant.

mod pipe;
mod pty;
mod reader;

pub use pipe::PipeChannel;
pub use pty::PtyChannel;

use crate::config::{ChannelKind, ScenarioConfig};
use crate::error::ProcessError;
use async_trait::async_trait;
use std::path::{MAIN_SEPARATOR, PathBuf};

/// Raw output captured from the child in one read.
pub type ByteChunk = Vec<u8>;

/// A child process attached to an interactive channel.
///
/// Variants differ only in how the program path is resolved, how input lines
/// are terminated and what stopping means; callers never need to know which
/// one they hold.
#[async_trait]
pub trait ProcessChannel: Send {
    /// Resolve the program and spawn it.
    async fn start(&mut self) -> Result<(), ProcessError>;

    /// Output available right now, possibly empty.
    ///
    /// Returns [`ProcessError::EndOfStream`] once the child closed its side
    /// and everything it wrote has been returned, and on a channel that is
    /// not running.
    async fn read(&mut self) -> Result<ByteChunk, ProcessError>;

    /// Send `text` followed by the channel's line terminator.
    async fn write(&mut self, text: &str) -> Result<(), ProcessError>;

    /// Terminate the child and release the channel. Safe to call repeatedly.
    async fn stop(&mut self) -> Result<(), ProcessError>;

    fn process_id(&self) -> Option<u32>;
}

/// Build the channel variant selected by `config`. Nothing is spawned until
/// [`ProcessChannel::start`].
pub fn open_channel(
    config: &ScenarioConfig,
    command: &str,
    args: &[String],
) -> Box<dyn ProcessChannel> {
    match config.channel {
        ChannelKind::Pty => Box::new(PtyChannel::new(
            command,
            args,
            config.pty_rows,
            config.pty_cols,
        )),
        ChannelKind::Pipe => Box::new(PipeChannel::new(command, args, config.stop_grace)),
    }
}

/// Turn a program containing a path separator into an absolute path; bare
/// names are left for the `PATH` lookup at spawn time.
pub(crate) fn resolve_program(command: &str) -> Result<PathBuf, ProcessError> {
    if command.is_empty() {
        return Err(ProcessError::MissingCommand);
    }
    if !(command.contains('/') || command.contains(MAIN_SEPARATOR)) {
        return Ok(PathBuf::from(command));
    }
    std::path::absolute(command).map_err(|err| ProcessError::spawn_failed(command, err))
}
