//! Presentation of shell output: styles, color themes and paging.

use super::terminal::{LineInput, Terminal};
use crossterm::style::{style as styled, Color, Stylize};
use std::io;

const PAGER_HINT: &str = "-- press enter for more lines ('q' or ctrl+d to skip) --";

/// Semantic style of one piece of output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Plain,
    Welcome,
    Prompt,
    Ok,
    Error,
    Hint,
}

/// Color theme selected in the shell settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    /// No escape sequences.
    Plain,
    Colored,
}

impl Theme {
    pub const MAX_INDEX: i64 = 1;

    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Self::Plain),
            1 => Some(Self::Colored),
            _ => None,
        }
    }

    pub fn index(self) -> i64 {
        match self {
            Self::Plain => 0,
            Self::Colored => 1,
        }
    }

    pub fn paint(self, text: &str, style: Style) -> String {
        if self == Self::Plain {
            return text.to_string();
        }
        let color = match style {
            Style::Plain => return text.to_string(),
            Style::Welcome | Style::Ok => Color::Green,
            Style::Prompt => Color::Magenta,
            Style::Error => Color::Red,
            Style::Hint => Color::DarkGrey,
        };
        styled(text).with(color).to_string()
    }
}

/// Rendering context owned by the dispatcher for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Renderer {
    pub theme: Theme,
    /// Split long outputs into terminal-sized pages.
    pub paged: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            theme: Theme::Colored,
            paged: true,
        }
    }
}

impl Renderer {
    /// Uncolored, unpaged renderer.
    pub fn plain() -> Self {
        Self {
            theme: Theme::Plain,
            paged: false,
        }
    }

    pub fn paint(&self, text: &str, style: Style) -> String {
        self.theme.paint(text, style)
    }

    pub fn print(&self, terminal: &mut dyn Terminal, text: &str, style: Style) -> io::Result<()> {
        terminal.write_line(&self.paint(text, style))
    }

    /// Prints `lines`, pausing between pages when paging is enabled and the
    /// terminal height is known.
    ///
    /// Answering `q` (or ending input) at the pause skips the remainder.
    pub fn present(
        &self,
        terminal: &mut dyn Terminal,
        lines: &[String],
        style: Style,
    ) -> io::Result<()> {
        let page_size = match terminal.height() {
            Some(rows) if self.paged && rows > 1 => usize::from(rows - 1),
            _ => usize::MAX,
        };

        let mut pages = lines.chunks(page_size.max(1)).peekable();
        while let Some(page) = pages.next() {
            self.print(terminal, &page.join("\n"), style)?;
            if pages.peek().is_none() {
                break;
            }
            match terminal.read_line(&self.paint(PAGER_HINT, Style::Hint))? {
                LineInput::Line(answer) if !answer.trim().eq_ignore_ascii_case("q") => {}
                _ => break,
            }
        }
        Ok(())
    }
}
