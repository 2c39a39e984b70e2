//! [`WriteInput`] command: sends one line of input to the running program.
//!
//! Script syntax: `write "AAA"`

use crate::command::ScriptCommand;
use crate::parser::split_arguments;
use crate::scenario::ScenarioController;
use anyhow::{Context as _, Result, anyhow};
use async_trait::async_trait;

/// Sends `text` plus the channel's line terminator. Does nothing when no
/// program is running; a failed write is fatal.
pub struct WriteInput {
    pub text: String,
}

impl WriteInput {
    pub const NAME: &'static str = "write";

    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait(?Send)]
impl ScriptCommand for WriteInput {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self> {
        let mut tokens = split_arguments(args)?;
        if tokens.len() != 1 {
            return Err(anyhow!(
                "'write' takes exactly one argument, got {}",
                tokens.len()
            ));
        }
        Ok(Self::new(tokens.remove(0)))
    }

    async fn execute(&self, ctl: &mut ScenarioController) -> Result<()> {
        ctl.write(&self.text)
            .await
            .context("Error writing to the process")
    }
}
