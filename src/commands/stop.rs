//! [`Stop`] command: terminates the running program.
//!
//! Script syntax: `stop`

use crate::command::ScriptCommand;
use crate::scenario::ScenarioController;
use anyhow::{Result, anyhow};
use async_trait::async_trait;

/// Terminates the running program, if there is one. Never fails.
pub struct Stop;

impl Stop {
    pub const NAME: &'static str = "stop";
}

#[async_trait(?Send)]
impl ScriptCommand for Stop {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self> {
        if !args.trim().is_empty() {
            return Err(anyhow!("'stop' takes no arguments"));
        }
        Ok(Self)
    }

    async fn execute(&self, ctl: &mut ScenarioController) -> Result<()> {
        ctl.stop().await;
        Ok(())
    }
}
