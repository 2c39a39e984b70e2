//! # Expectty
//!
//! Expect-style automation for interactive command-line programs.
//!
//! Expectty spawns a program on a pseudo-terminal (or plain pipes), captures
//! everything it writes in the background, and lets a driver wait for text
//! to show up within a deadline and answer with input. It is meant for
//! testing interactive CLI tools.
//!
//! ## Quick start
//!
//! ```no_run
//! use expectty::{ExpectOutcome, ExpectRequest, ScenarioConfig, ScenarioController, TracingReporter};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut ctl = ScenarioController::new(ScenarioConfig::default(), Arc::new(TracingReporter));
//!
//!     ctl.launch("./greeter.sh", &[]).await?;
//!     assert_eq!(ctl.expect(&ExpectRequest::new("Name: ")).await, ExpectOutcome::Matched);
//!     ctl.write("AAA").await?;
//!     ctl.expect(&ExpectRequest::new("Hello, AAA").with_points(1)).await;
//!     ctl.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Scenarios
//!
//! A [`ScenarioController`] runs at most one [`Scenario`] at a time: a
//! [`ProcessChannel`] to the child, an [`OutputLedger`] holding its output,
//! and a [`CaptureLoop`] filling the ledger. Launching replaces whatever was
//! running. `write`, `expect` and `stop` are no-ops while nothing runs.
//!
//! `expect` looks for plain substrings after the ledger's cursor. A match
//! consumes the output up to and including the matched text. A miss with zero
//! points is a soft failure; with nonzero points it is critical and the
//! scenario is stopped.
//!
//! ## Scripts
//!
//! The `expectty` binary runs scripts made of four verbs:
//!
//! | Command | Description |
//! |---------|-------------|
//! | `launch ./tool.sh arg1` | Start a program, replacing any running one |
//! | `write "AAA"` | Send a line of input |
//! | `expect "Name: "` | Wait up to 1s for the text (soft failure) |
//! | `expect "Bye" 1 500` | Wait up to 500 ms, stop the program on failure |
//! | `expect "Ready" 2s` | Timeouts also accept `ms`/`s` units |
//! | `stop` | Terminate the program |
//! | `# comment` | Full-line or inline comment |
//!
//! Use [`parse_str`] or [`parse_file`] to turn a script into commands and
//! [`Engine::execute`] to run them.

pub mod capture;
pub mod channel;
pub mod command;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod expect;
pub mod ledger;
pub mod logging;
pub mod parser;
pub mod report;
pub mod scenario;

pub use capture::CaptureLoop;
pub use channel::{ByteChunk, PipeChannel, ProcessChannel, PtyChannel, open_channel};
pub use command::ScriptCommand;
pub use commands::{Expect, Launch, Stop, WriteInput};
pub use config::{ChannelKind, ScenarioConfig};
pub use engine::Engine;
pub use error::{ProcessError, SeekError};
pub use expect::{DEFAULT_EXPECT_TIMEOUT, ExpectOutcome, ExpectRequest, Severity};
pub use ledger::OutputLedger;
pub use parser::{parse_file, parse_str};
pub use report::{ConsoleReporter, Reporter, TracingReporter};
pub use scenario::{Scenario, ScenarioController};
