//! Notebook provider.
//!
//! # Responsibility
//! - Keep notes keyed by topic, with tags and an optional annual reminder.
//! - Expose note commands, tag queries and the upcoming-reminders digest.
//!
//! # Invariants
//! - Topics are unique ignoring case.
//! - Tags are stored normalized: lower-case, no `#`, sorted, unique.
//! - A note keeps its `id` across edits and renames.

mod book;
mod provider;

pub use book::{Note, NoteId, NotesBook, NotesError, NotesResult};
pub use provider::{NotesProvider, NOTES_PROVIDER_NAME};
