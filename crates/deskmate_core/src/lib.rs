//! Core logic of the deskmate assistant: contact book, notebook, the
//! annual-event scheduler and the command shell tying them together.

pub mod assistant;
pub mod command;
pub mod config;
pub mod contacts;
pub mod field;
pub mod logging;
pub mod notes;
pub mod schedule;
pub mod store;

pub use assistant::build_assistant;
pub use command::{
    CommandError, CommandOutput, CommandRegistry, Dispatcher, InterruptHandle, Provider,
    RegistryError, Renderer, ScriptedTerminal, StdTerminal, Terminal,
};
pub use config::{AppConfig, ConfigError};
pub use contacts::{Contact, ContactBook, ContactsProvider};
pub use field::{FieldError, FieldKind, FieldValue};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use notes::{Note, NotesBook, NotesProvider};
pub use schedule::{next_occurrences, render_digest, AnnualEvent, Digest, DigestLayout};
pub use store::{
    open_state_db, open_state_db_in_memory, MemoryStateGateway, SqliteStateGateway,
    StateGateway, StateSnapshot, StoreError, StoreResult, SCHEMA_VERSION,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
