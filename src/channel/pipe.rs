use super::reader::{drain, spawn_reader};
use super::{ByteChunk, ProcessChannel, resolve_program};
use crate::error::ProcessError;
use async_trait::async_trait;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::debug;

const EXIT_POLL: Duration = Duration::from_millis(10);

/// A program attached to plain stdin/stdout/stderr pipes, for platforms or
/// programs where a pseudo-terminal is not wanted.
///
/// Input lines end with `\r\n`. Stdout and stderr are captured into the same
/// stream. Stopping closes stdin and waits for the child, then kills whatever
/// is left of its process group once the grace period runs out.
pub struct PipeChannel {
    command: String,
    args: Vec<String>,
    stop_grace: Duration,
    session: Option<PipeSession>,
}

struct PipeSession {
    child: Child,
    stdin: Option<ChildStdin>,
    output: Receiver<Vec<u8>>,
    reaped: bool,
}

impl PipeSession {
    /// Kill the child together with anything it started, then reap it.
    /// Blocks until the child is gone.
    fn terminate(&mut self) -> io::Result<ExitStatus> {
        kill_process_group(&self.child);
        if let Err(err) = self.child.kill() {
            if err.kind() != io::ErrorKind::InvalidInput {
                return Err(err);
            }
        }
        let status = self.child.wait()?;
        self.reaped = true;
        Ok(status)
    }
}

impl Drop for PipeSession {
    fn drop(&mut self) {
        if !self.reaped {
            let _ = self.terminate();
        }
    }
}

/// SIGKILL the child's process group. The child leads its own group, so this
/// also takes down grandchildren still holding the output pipes.
#[cfg(unix)]
fn kill_process_group(child: &Child) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(pgid) = i32::try_from(child.id()) else {
        return;
    };
    match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(err) => debug!(pgid, %err, "failed to kill process group"),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child) {}

impl PipeChannel {
    pub fn new(command: &str, args: &[String], stop_grace: Duration) -> Self {
        Self {
            command: command.to_string(),
            args: args.to_vec(),
            stop_grace,
            session: None,
        }
    }

    fn spawn_session(&self) -> Result<PipeSession, ProcessError> {
        let mut program = resolve_program(&self.command)?;
        if program.is_absolute() && !program.exists() {
            program = with_exe_suffix(program);
        }

        let mut command = Command::new(&program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        let mut child = command
            .spawn()
            .map_err(|err| ProcessError::spawn_failed(&self.command, err))?;

        let (tx, output) = mpsc::channel();
        let streams: [Option<Box<dyn io::Read + Send>>; 2] = [
            child.stdout.take().map(|s| Box::new(s) as Box<dyn io::Read + Send>),
            child.stderr.take().map(|s| Box::new(s) as Box<dyn io::Read + Send>),
        ];
        let stdin = child.stdin.take();
        let session = PipeSession {
            child,
            stdin,
            output,
            reaped: false,
        };
        for stream in streams.into_iter().flatten() {
            // Dropping the session on error kills the child.
            spawn_reader(stream, tx.clone())
                .map_err(|err| ProcessError::spawn_failed(&self.command, err))?;
        }

        Ok(session)
    }
}

/// `tool` -> `tool.exe` on platforms with an executable suffix.
fn with_exe_suffix(program: PathBuf) -> PathBuf {
    let suffix = std::env::consts::EXE_SUFFIX;
    if suffix.is_empty() {
        return program;
    }
    let mut name = program.into_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

#[async_trait]
impl ProcessChannel for PipeChannel {
    async fn start(&mut self) -> Result<(), ProcessError> {
        if self.session.is_some() {
            return Err(ProcessError::AlreadyStarted);
        }
        let session = self.spawn_session()?;
        debug!(command = %self.command, pid = session.child.id(), "spawned piped child");
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
        let stdin = self
            .session
            .as_mut()
            .and_then(|session| session.stdin.as_mut())
            .ok_or_else(ProcessError::closed)?;
        let mut line = Vec::with_capacity(text.len() + 2);
        line.extend_from_slice(text.as_bytes());
        line.extend_from_slice(b"\r\n");
        stdin
            .write_all(&line)
            .and_then(|()| stdin.flush())
            .map_err(ProcessError::WriteFailed)
    }

    async fn stop(&mut self) -> Result<(), ProcessError> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };
        // Closing stdin is the polite way to ask a line-driven program to finish.
        drop(session.stdin.take());

        let deadline = Instant::now() + self.stop_grace;
        while session.child.try_wait()?.is_none() {
            if Instant::now() >= deadline {
                debug!(command = %self.command, "grace period over, killing child");
                break;
            }
            sleep(EXIT_POLL).await;
        }

        let status = tokio::task::spawn_blocking(move || session.terminate())
            .await
            .map_err(io::Error::other)??;
        debug!(command = %self.command, %status, "piped child exited");
        Ok(())
    }

    fn process_id(&self) -> Option<u32> {
        self.session.as_ref().map(|session| session.child.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exe_suffix() {
        let program = with_exe_suffix(PathBuf::from("/opt/tools/greeter"));
        if cfg!(windows) {
            assert_eq!(program, PathBuf::from("/opt/tools/greeter.exe"));
        } else {
            assert_eq!(program, PathBuf::from("/opt/tools/greeter"));
        }
    }

    #[cfg(unix)]
    mod unix {
        use super::*;

        fn sh(script: &str) -> PipeChannel {
            PipeChannel::new(
                "sh",
                &["-c".to_string(), script.to_string()],
                Duration::from_millis(200),
            )
        }

        async fn read_to_end(channel: &mut PipeChannel) -> Vec<u8> {
            let deadline = Instant::now() + Duration::from_secs(5);
            let mut out = Vec::new();
            loop {
                match channel.read().await {
                    Ok(chunk) => out.extend_from_slice(&chunk),
                    Err(ProcessError::EndOfStream) => return out,
                    Err(err) => panic!("unexpected error: {err}"),
                }
                assert!(Instant::now() < deadline, "no end of stream");
                sleep(Duration::from_millis(10)).await;
            }
        }

        #[tokio::test]
        async fn test_stdout_and_stderr_are_captured() {
            let mut channel = sh("echo to-out; echo to-err 1>&2");
            channel.start().await.unwrap();

            let out = String::from_utf8_lossy(&read_to_end(&mut channel).await).into_owned();
            assert!(out.contains("to-out"), "got: {out:?}");
            assert!(out.contains("to-err"), "got: {out:?}");
            channel.stop().await.unwrap();
        }

        #[tokio::test]
        async fn test_write_appends_crlf() {
            let mut channel = sh("read line; printf '[%s]' \"$line\"");
            channel.start().await.unwrap();
            channel.write("AAA").await.unwrap();

            let out = read_to_end(&mut channel).await;
            assert_eq!(out, b"[AAA\r]");
            channel.stop().await.unwrap();
        }

        #[tokio::test]
        async fn test_stop_waits_for_child_closing_on_eof() {
            let mut channel = sh("cat");
            channel.start().await.unwrap();
            let started = Instant::now();
            channel.stop().await.unwrap();
            assert!(started.elapsed() < Duration::from_secs(2));
        }

        #[tokio::test]
        async fn test_stop_kills_stubborn_child() {
            let mut channel = sh("exec sleep 30");
            channel.start().await.unwrap();
            let started = Instant::now();
            channel.stop().await.unwrap();
            assert!(started.elapsed() < Duration::from_secs(5));
            channel.stop().await.unwrap();
            assert!(matches!(
                channel.write("late").await,
                Err(ProcessError::WriteFailed(_))
            ));
        }

        #[tokio::test]
        async fn test_missing_program_fails_to_spawn() {
            let mut channel = PipeChannel::new("./no/such/tool", &[], Duration::from_millis(100));
            assert!(matches!(
                channel.start().await,
                Err(ProcessError::SpawnFailed { .. })
            ));
            assert!(matches!(
                channel.read().await,
                Err(ProcessError::EndOfStream)
            ));
        }
    }
}
