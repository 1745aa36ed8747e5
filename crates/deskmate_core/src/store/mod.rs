//! Persistence gateway for provider state.
//!
//! # Responsibility
//! - Load and save the full assistant state keyed by provider name.
//!
//! # Invariants
//! - `load` never fails: unreadable data yields an empty (or partial)
//!   snapshot and a warning.
//! - `save` replaces the whole stored state ("last full save wins"). There is
//!   no cross-process lock; two shells on one file overwrite each other.

use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

mod schema;
mod sqlite;

pub use schema::{open_state_db, open_state_db_in_memory, SCHEMA_VERSION};
pub use sqlite::SqliteStateGateway;

/// Provider name → opaque provider blob.
pub type StateSnapshot = BTreeMap<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage backend for the assistant state.
pub trait StateGateway {
    /// Returns the last saved snapshot, or an empty one.
    fn load(&self) -> StateSnapshot;
    /// Persists `snapshot` as the complete new state.
    fn save(&mut self, snapshot: &StateSnapshot) -> StoreResult<()>;
}

#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    /// The state file was written by a newer build.
    UnsupportedSchema {
        found: u32,
        supported: u32,
    },
    Io(std::io::Error),
    Serialize(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchema { found, supported } => write!(
                f,
                "data file schema version {found} is newer than supported {supported}"
            ),
            Self::Io(err) => write!(f, "{err}"),
            Self::Serialize(err) => write!(f, "state serialization failed: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchema { .. } => None,
            Self::Io(err) => Some(err),
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// In-process gateway; clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateGateway {
    inner: Rc<RefCell<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    snapshot: StateSnapshot,
    saves: usize,
}

impl MemoryStateGateway {
    /// Stores one provider blob as if it had been saved earlier.
    pub fn seed(&self, provider: &str, state: Value) {
        self.inner
            .borrow_mut()
            .snapshot
            .insert(provider.to_string(), state);
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.inner.borrow().snapshot.clone()
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.inner.borrow().saves
    }
}

impl StateGateway for MemoryStateGateway {
    fn load(&self) -> StateSnapshot {
        self.snapshot()
    }

    fn save(&mut self, snapshot: &StateSnapshot) -> StoreResult<()> {
        let mut inner = self.inner.borrow_mut();
        inner.snapshot = snapshot.clone();
        inner.saves += 1;
        Ok(())
    }
}
