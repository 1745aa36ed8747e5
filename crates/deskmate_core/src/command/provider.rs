//! Capability provider contract.

use super::context::CommandContext;
use super::outcome::CommandResult;
use super::spec::CommandSpec;
use chrono::NaiveDate;
use serde_json::Value;

/// Inputs available when building startup greetings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WelcomeContext {
    pub today: NaiveDate,
    pub show_birthdays: bool,
    pub show_reminders: bool,
}

/// A component contributing named commands to the shell.
///
/// The provider set is fixed at startup; every provider also owns the shape
/// of its own persisted state.
pub trait Provider {
    /// Stable key used for persistence and logging, e.g. `contacts`.
    fn name(&self) -> &str;

    /// Commands in the order they appear in help.
    fn commands(&self) -> &[CommandSpec];

    /// Runs `token` with positional `args`.
    ///
    /// Only called for tokens listed by `commands()`.
    fn execute(
        &mut self,
        token: &str,
        args: &[String],
        ctx: &mut CommandContext<'_>,
    ) -> CommandResult;

    /// Optional line printed under the shell greeting.
    fn welcome_message(&self, _ctx: &WelcomeContext) -> Option<String> {
        None
    }

    /// Serializes the provider state for the persistence gateway.
    ///
    /// # Errors
    /// - The state cannot be represented as JSON; the save is then skipped.
    fn export_state(&self) -> Result<Value, serde_json::Error> {
        Ok(Value::Null)
    }

    /// Replaces the provider state with a previously exported blob.
    fn import_state(&mut self, _state: Value) -> Result<(), serde_json::Error> {
        Ok(())
    }
}
