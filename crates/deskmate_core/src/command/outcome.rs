//! Handler results and their error classification.

use crate::field::FieldError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fixed message for unknown tokens and argument-shape failures.
pub const INVALID_COMMAND_MSG: &str = "Invalid command!";
/// Message used when the user cancels a mandatory prompt.
pub const INTERRUPTED_MSG: &str = "Command was interrupted";
/// Look-ahead used by digest commands called without a day count.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;
const MAX_WINDOW_DAYS: u32 = 366;

pub type CommandResult = Result<CommandOutput, CommandError>;

/// Successful handler output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    Line(String),
    /// Multi-line output, paged when long.
    Lines(Vec<String>),
    /// Consolidated help, rendered by the dispatcher from its registry.
    Help,
    /// Terminates the shell after printing the farewell.
    Exit(String),
}

/// Failure kinds surfaced at the dispatch boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Recoverable user error: validation, not-found, duplicate, interrupted.
    User(String),
    /// Positional arguments do not match the command's usage.
    ArgumentShape,
    UnknownCommand,
    /// Unexpected failure (I/O, storage); the shell keeps running.
    Internal(String),
}

impl CommandError {
    pub fn user(message: impl Into<String>) -> Self {
        Self::User(message.into())
    }

    pub fn interrupted() -> Self {
        Self::User(INTERRUPTED_MSG.to_string())
    }
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User(message) => write!(f, "{message}"),
            Self::ArgumentShape | Self::UnknownCommand => write!(f, "{INVALID_COMMAND_MSG}"),
            Self::Internal(message) => write!(f, "Something went wrong: {message}"),
        }
    }
}

impl Error for CommandError {}

impl From<FieldError> for CommandError {
    fn from(value: FieldError) -> Self {
        Self::User(value.to_string())
    }
}

impl From<std::io::Error> for CommandError {
    fn from(value: std::io::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

/// Rejects any positional argument.
pub fn expect_no_args(args: &[String]) -> Result<(), CommandError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(CommandError::ArgumentShape)
    }
}

/// Reads the optional `[days]` argument of digest commands.
///
/// # Errors
/// - `CommandError::ArgumentShape` for more than one argument.
/// - `CommandError::User` when the value is not in `1..=366`.
pub fn window_arg(args: &[String]) -> Result<u32, CommandError> {
    match args {
        [] => Ok(DEFAULT_WINDOW_DAYS),
        [days] => days
            .parse::<u32>()
            .ok()
            .filter(|days| (1..=MAX_WINDOW_DAYS).contains(days))
            .ok_or_else(|| {
                CommandError::user(format!("Days should be in a range [1..{MAX_WINDOW_DAYS}]"))
            }),
        _ => Err(CommandError::ArgumentShape),
    }
}
