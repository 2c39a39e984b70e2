//! The [`ScriptCommand`] trait implemented by every script verb.

use crate::scenario::ScenarioController;
use anyhow::Result;
use async_trait::async_trait;

/// A single script command.
///
/// To add a verb:
///
/// 1. Define `pub const NAME: &'static str` on your struct, the keyword the
///    parser matches (e.g. `"launch"`, `"expect"`).
/// 2. Re-export the struct from `src/commands/mod.rs`.
/// 3. Add one entry to the `REGISTRY` in [`crate::parser`]:
///    `(MyCmd::NAME, MyCmd::parse_boxed)`.
#[async_trait(?Send)]
pub trait ScriptCommand: 'static {
    /// The command name, accessible at runtime through a trait object.
    ///
    /// Implementations should return their `NAME` constant.
    fn name(&self) -> &'static str;

    /// Parse this command from everything after the keyword on the script line.
    fn parse(args: &str) -> Result<Self>
    where
        Self: Sized;

    /// Parse and box this command. This is the function-pointer type stored in
    /// the command registry.
    fn parse_boxed(args: &str) -> Result<Box<dyn ScriptCommand>>
    where
        Self: Sized,
    {
        Ok(Box::new(Self::parse(args)?))
    }

    /// Run the command against the scenario controller.
    ///
    /// An error aborts the whole script.
    async fn execute(&self, ctl: &mut ScenarioController) -> Result<()>;
}
