//! Per-invocation context handed to command handlers.

use super::outcome::CommandError;
use super::render::{Renderer, Style};
use super::terminal::{LineInput, Terminal};
use chrono::NaiveDate;

/// Terminal access plus the dispatcher's notion of "today".
///
/// Lives for a single handler call.
pub struct CommandContext<'a> {
    terminal: &'a mut dyn Terminal,
    renderer: &'a Renderer,
    today: NaiveDate,
}

impl<'a> CommandContext<'a> {
    pub fn new(terminal: &'a mut dyn Terminal, renderer: &'a Renderer, today: NaiveDate) -> Self {
        Self {
            terminal,
            renderer,
            today,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Prompts for one line.
    pub fn ask(&mut self, prompt: &str) -> Result<LineInput, CommandError> {
        let painted = self.renderer.paint(prompt, Style::Prompt);
        Ok(self.terminal.read_line(&painted)?)
    }

    /// Shows a recoverable error without ending the command.
    pub fn show_error(&mut self, message: &str) -> Result<(), CommandError> {
        Ok(self.renderer.print(&mut *self.terminal, message, Style::Error)?)
    }
}
