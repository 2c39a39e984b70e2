use crate::command::ScriptCommand;
use crate::config::ScenarioConfig;
use crate::report::Reporter;
use crate::scenario::ScenarioController;
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

/// Runs parsed script commands one after another against a
/// [`ScenarioController`].
pub struct Engine {
    controller: ScenarioController,
}

impl Engine {
    pub fn new(config: ScenarioConfig, reporter: Arc<dyn Reporter>) -> Self {
        Self::with_controller(ScenarioController::new(config, reporter))
    }

    pub fn with_controller(controller: ScenarioController) -> Self {
        Engine { controller }
    }

    /// Execute `commands` in order.
    ///
    /// Stops at the first command that fails. Whatever scenario is still
    /// running afterwards is shut down, whether the script succeeded or not.
    pub async fn execute(&mut self, commands: Vec<Box<dyn ScriptCommand>>) -> Result<()> {
        let result = self.run(commands).await;
        self.controller.shutdown().await;
        result
    }

    async fn run(&mut self, commands: Vec<Box<dyn ScriptCommand>>) -> Result<()> {
        for (index, command) in commands.iter().enumerate() {
            debug!(index, command = command.name(), "executing");
            command.execute(&mut self.controller).await?;
        }
        Ok(())
    }
}
