//! [`Launch`] command: starts a program, replacing any running one.
//!
//! Script syntax: `launch ./tool.sh arg1 "arg with spaces"`

use crate::command::ScriptCommand;
use crate::parser::split_arguments;
use crate::scenario::ScenarioController;
use anyhow::{Context as _, Result, anyhow};
use async_trait::async_trait;

/// Starts `program` with `args` as the new scenario.
///
/// Failing to start is fatal for the script.
pub struct Launch {
    pub program: String,
    pub args: Vec<String>,
}

impl Launch {
    pub const NAME: &'static str = "launch";

    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait(?Send)]
impl ScriptCommand for Launch {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self> {
        let mut tokens = split_arguments(args)?.into_iter();
        let program = tokens
            .next()
            .ok_or_else(|| anyhow!("Command to execute must be provided"))?;
        Ok(Self::new(program, tokens.collect()))
    }

    async fn execute(&self, ctl: &mut ScenarioController) -> Result<()> {
        ctl.launch(&self.program, &self.args)
            .await
            .with_context(|| format!("Error starting the command: {}", self.program))
    }
}
