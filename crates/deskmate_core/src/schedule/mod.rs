//! Recurring annual event scheduler.
//!
//! # Responsibility
//! - Select birthdays/reminders falling in the next N days.
//! - Render the selection grouped per weekday (or per date for long windows).
//!
//! # Invariants
//! - Pure functions only: no clock access, no cached state.
//! - Weekend occurrences are always announced in the Monday bucket.

mod digest;
mod occurrence;

pub use digest::{render_digest, DigestLayout};
pub use occurrence::{next_occurrences, AnnualEvent, Digest};
