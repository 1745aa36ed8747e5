//! Contact book provider.
//!
//! # Responsibility
//! - Keep contact records keyed by name.
//! - Expose contact commands and the upcoming-birthdays digest.
//!
//! # Invariants
//! - Names are unique ignoring case; the stored spelling is the last one
//!   entered.
//! - A contact never holds the same phone number twice.

mod book;
mod provider;

pub use book::{Contact, ContactBook, ContactsError, ContactsResult};
pub use provider::{ContactsProvider, CONTACTS_PROVIDER_NAME};
