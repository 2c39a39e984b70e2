use super::reader::{drain, spawn_reader};
use super::{ByteChunk, ProcessChannel, resolve_program};
use crate::error::ProcessError;
use async_trait::async_trait;
use portable_pty::{Child, ChildKiller, CommandBuilder, MasterPty, PtySize};
use std::io::{self, Write};
use std::sync::mpsc::{self, Receiver};
use tracing::debug;

/// A program running inside a pseudo-terminal.
///
/// Input lines end with `\n`; the terminal's line discipline echoes them back
/// into the output. Stopping hangs the child up and reaps it.
pub struct PtyChannel {
    command: String,
    args: Vec<String>,
    size: PtySize,
    session: Option<PtySession>,
}

struct PtySession {
    master: Box<dyn MasterPty + Send>,
    child: Box<dyn Child + Send + Sync>,
    writer: Box<dyn Write + Send>,
    output: Receiver<Vec<u8>>,
}

impl PtyChannel {
    pub fn new(command: &str, args: &[String], rows: u16, cols: u16) -> Self {
        Self {
            command: command.to_string(),
            args: args.to_vec(),
            size: PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            },
            session: None,
        }
    }

    fn spawn_session(&self) -> Result<PtySession, ProcessError> {
        let program = resolve_program(&self.command)?;
        let failed = |err: anyhow::Error| ProcessError::spawn_failed(&self.command, err);

        let pair = portable_pty::native_pty_system()
            .openpty(self.size)
            .map_err(failed)?;

        let mut cmd = CommandBuilder::new(program.as_os_str());
        for arg in &self.args {
            cmd.arg(arg);
        }
        // Otherwise the child starts in the user's home directory.
        if let Ok(cwd) = std::env::current_dir() {
            cmd.cwd(cwd);
        }

        let reader = pair.master.try_clone_reader().map_err(failed)?;
        let writer = pair.master.take_writer().map_err(failed)?;
        let mut child = pair.slave.spawn_command(cmd).map_err(failed)?;
        // Our copy of the slave must go, or the reader never sees the child hang up.
        drop(pair.slave);

        let (tx, output) = mpsc::channel();
        if let Err(err) = spawn_reader(reader, tx) {
            let _ = child.kill();
            return Err(ProcessError::spawn_failed(&self.command, err));
        }

        Ok(PtySession {
            master: pair.master,
            child,
            writer,
            output,
        })
    }
}

#[async_trait]
impl ProcessChannel for PtyChannel {
    async fn start(&mut self) -> Result<(), ProcessError> {
        if self.session.is_some() {
            return Err(ProcessError::AlreadyStarted);
        }
        let session = self.spawn_session()?;
        debug!(
            command = %self.command,
            pid = ?session.child.process_id(),
            "spawned pty child"
        );
        self.session = Some(session);
        Ok(())
    }

    async fn read(&mut self) -> Result<ByteChunk, ProcessError> {
        match &self.session {
            Some(session) => drain(&session.output),
            None => Err(ProcessError::EndOfStream),
        }
    }

    async fn write(&mut self, text: &str) -> Result<(), ProcessError> {
        let session = self.session.as_mut().ok_or_else(ProcessError::closed)?;
        let mut line = Vec::with_capacity(text.len() + 1);
        line.extend_from_slice(text.as_bytes());
        line.push(b'\n');
        session
            .writer
            .write_all(&line)
            .and_then(|()| session.writer.flush())
            .map_err(ProcessError::WriteFailed)
    }

    async fn stop(&mut self) -> Result<(), ProcessError> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        let PtySession {
            master,
            mut child,
            writer,
            output,
        } = session;
        drop(writer);

        // Killing may pause between signals, keep it off the async workers.
        let status = tokio::task::spawn_blocking(move || -> io::Result<_> {
            if child.try_wait()?.is_none() {
                if let Err(err) = child.kill() {
                    if child.try_wait()?.is_none() {
                        return Err(err);
                    }
                }
            }
            child.wait()
        })
        .await
        .map_err(io::Error::other)??;
        debug!(command = %self.command, ?status, "pty child exited");

        drop(master);
        drop(output);
        Ok(())
    }

    fn process_id(&self) -> Option<u32> {
        self.session
            .as_ref()
            .and_then(|session| session.child.process_id())
    }
}

impl Drop for PtyChannel {
    fn drop(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if let Ok(None) = session.child.try_wait() {
                let _ = session.child.kill();
                let _ = session.child.wait();
            }
        }
    }
}
