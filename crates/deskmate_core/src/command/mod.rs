//! Command registry, dispatch engine and interactive shell.
//!
//! # Responsibility
//! - Collect commands from every provider into one flat namespace.
//! - Route user input, run interactive field prompts and render results.
//!
//! # Invariants
//! - The provider set and registry are fixed once the dispatcher exists.
//! - Handlers report failures through `CommandResult`; nothing is thrown
//!   past the dispatch boundary.

pub mod context;
pub mod dispatch;
pub mod outcome;
pub mod prompt;
pub mod provider;
pub mod registry;
pub mod render;
pub mod shell;
pub mod spec;
pub mod terminal;

pub use context::CommandContext;
pub use dispatch::{triggers_save, Dispatcher, Reply, SAVE_PATTERNS};
pub use outcome::{
    expect_no_args, window_arg, CommandError, CommandOutput, CommandResult, DEFAULT_WINDOW_DAYS,
    INTERRUPTED_MSG, INVALID_COMMAND_MSG,
};
pub use prompt::{
    acquire_fields, resolve_fields, search_text, Acquired, Assertion, EntryPolicy, FieldRequest,
};
pub use provider::{Provider, WelcomeContext};
pub use registry::{CommandRegistry, RegisteredCommand, RegistryError};
pub use render::{Renderer, Style, Theme};
pub use shell::{ShellProvider, ShellSettings, BYE_MSG, SHELL_PROVIDER_NAME};
pub use spec::CommandSpec;
pub use terminal::{InterruptHandle, LineInput, ScriptedTerminal, StdTerminal, Terminal};
