//! Built-in shell commands: help, exit and settings.

use super::context::CommandContext;
use super::outcome::{expect_no_args, CommandError, CommandOutput, CommandResult};
use super::prompt::{acquire_fields, EntryPolicy, FieldRequest};
use super::provider::Provider;
use super::render::{Renderer, Theme};
use super::spec::CommandSpec;
use crate::field::FieldKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SHELL_PROVIDER_NAME: &str = "shell";
pub const BYE_MSG: &str = "Bye!";

/// Name value that clears the stored user name.
const CLEAR_NAME_MARKER: &str = "~";

const SHELL_COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("help", "h|help", "Show this message"),
    CommandSpec::new("h", "h|help", "Show this message"),
    CommandSpec::new("settings", "settings", "Configure assistant"),
    CommandSpec::new("exit", "q|exit|close", "Finish to work with an assistant"),
    CommandSpec::new("close", "q|exit|close", "Finish to work with an assistant"),
    CommandSpec::new("q", "q|exit|close", "Finish to work with an assistant"),
];

/// User preferences persisted with the shell state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellSettings {
    /// Name used in the greeting; empty for none.
    pub user_name: String,
    pub show_birthdays: bool,
    pub show_reminders: bool,
    /// `Theme` index.
    pub color_theme: i64,
    pub paged_output: bool,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            user_name: String::new(),
            show_birthdays: true,
            show_reminders: true,
            color_theme: Theme::Colored.index(),
            paged_output: true,
        }
    }
}

impl ShellSettings {
    /// Rendering context matching these preferences.
    pub fn renderer(&self) -> Renderer {
        Renderer {
            theme: Theme::from_index(self.color_theme).unwrap_or(Theme::Colored),
            paged: self.paged_output,
        }
    }
}

/// Provider for the shell's own commands.
#[derive(Debug, Default)]
pub struct ShellProvider {
    settings: ShellSettings,
}

impl ShellProvider {
    pub fn new(settings: ShellSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ShellSettings {
        &self.settings
    }

    fn configure(&mut self, args: &[String], ctx: &mut CommandContext<'_>) -> CommandResult {
        expect_no_args(args)?;
        let current = &self.settings;
        let name_hint = if current.user_name.is_empty() {
            String::new()
        } else {
            format!(" (current {})", current.user_name)
        };

        let requests = [
            FieldRequest::new(
                FieldKind::Name,
                format!("Name /'{CLEAR_NAME_MARKER}' to delete/{name_hint}: "),
            ),
            FieldRequest::new(
                FieldKind::YesNo,
                format!("Show birthdays (current {}): ", yes_no(current.show_birthdays)),
            ),
            FieldRequest::new(
                FieldKind::YesNo,
                format!("Show reminders (current {}): ", yes_no(current.show_reminders)),
            ),
            FieldRequest::new(
                FieldKind::Number,
                format!("Color theme (current {}): ", current.color_theme),
            )
            .with_assertion(|value| match value.as_number().and_then(Theme::from_index) {
                Some(_) => Ok(()),
                None => Err(format!(
                    "Color theme should be in a range [0..{}]",
                    Theme::MAX_INDEX
                )),
            }),
            FieldRequest::new(
                FieldKind::YesNo,
                format!("Paged output (current {}): ", yes_no(current.paged_output)),
            ),
        ];
        let acquired = acquire_fields(ctx, &requests, EntryPolicy::NONE)?;
        if acquired.filled() == 0 {
            return Err(CommandError::user("No settings to apply"));
        }

        if let Some(name) = acquired.text(0) {
            self.settings.user_name = if name == CLEAR_NAME_MARKER {
                String::new()
            } else {
                name
            };
        }
        if let Some(flag) = acquired.flag(1) {
            self.settings.show_birthdays = flag;
        }
        if let Some(flag) = acquired.flag(2) {
            self.settings.show_reminders = flag;
        }
        if let Some(theme) = acquired.number(3) {
            self.settings.color_theme = theme;
        }
        if let Some(flag) = acquired.flag(4) {
            self.settings.paged_output = flag;
        }
        Ok(CommandOutput::Line("New settings applied".to_string()))
    }
}

impl Provider for ShellProvider {
    fn name(&self) -> &str {
        SHELL_PROVIDER_NAME
    }

    fn commands(&self) -> &[CommandSpec] {
        SHELL_COMMANDS
    }

    fn execute(
        &mut self,
        token: &str,
        args: &[String],
        ctx: &mut CommandContext<'_>,
    ) -> CommandResult {
        match token {
            "help" | "h" => {
                expect_no_args(args)?;
                Ok(CommandOutput::Help)
            }
            "exit" | "close" | "q" => Ok(CommandOutput::Exit(BYE_MSG.to_string())),
            "settings" => self.configure(args, ctx),
            other => Err(CommandError::Internal(format!(
                "shell provider cannot run `{other}`"
            ))),
        }
    }

    fn export_state(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(&self.settings)
    }

    fn import_state(&mut self, state: Value) -> Result<(), serde_json::Error> {
        self.settings = serde_json::from_value(state)?;
        Ok(())
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
