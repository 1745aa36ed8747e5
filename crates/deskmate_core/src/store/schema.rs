//! State file schema and connection setup.
//!
//! # Invariants
//! - The file holds exactly one table, `provider_state`, stamped with
//!   `SCHEMA_VERSION` in `PRAGMA user_version`.
//! - A file stamped by a newer build is refused and left untouched.

use super::{StoreError, StoreResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Schema version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

const CREATE_PROVIDER_STATE: &str = "
CREATE TABLE IF NOT EXISTS provider_state (
    provider TEXT PRIMARY KEY NOT NULL,
    payload TEXT NOT NULL,
    saved_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000)
);";

/// Opens (creating if needed) a state file with the schema in place.
///
/// # Errors
/// - `StoreError::UnsupportedSchema` for a file from a newer build.
/// - `StoreError::Sqlite` when the file is not a usable database.
pub fn open_state_db(path: impl AsRef<Path>) -> StoreResult<Connection> {
    open_with("file", || Connection::open(path))
}

/// In-memory database with the schema in place.
pub fn open_state_db_in_memory() -> StoreResult<Connection> {
    open_with("memory", Connection::open_in_memory)
}

fn open_with(
    mode: &'static str,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> StoreResult<Connection> {
    let started_at = Instant::now();
    let result = connect()
        .map_err(StoreError::from)
        .and_then(|mut conn| ensure_schema(&mut conn).map(|()| conn));

    match &result {
        Ok(_) => info!(
            "event=state_db_open module=store status=ok mode={} duration_ms={}",
            mode,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=state_db_open module=store status=error mode={} error={}",
            mode, err
        ),
    }
    result
}

fn ensure_schema(conn: &mut Connection) -> StoreResult<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    let found: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    match found {
        newer if newer > SCHEMA_VERSION => Err(StoreError::UnsupportedSchema {
            found: newer,
            supported: SCHEMA_VERSION,
        }),
        SCHEMA_VERSION => Ok(()),
        _ => {
            let tx = conn.transaction()?;
            tx.execute_batch(CREATE_PROVIDER_STATE)?;
            tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
            tx.commit()?;
            info!(
                "event=state_schema module=store status=ok from_version={} to_version={}",
                found, SCHEMA_VERSION
            );
            Ok(())
        }
    }
}
