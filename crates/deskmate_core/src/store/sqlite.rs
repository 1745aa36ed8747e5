//! SQLite-backed state gateway.

use super::schema::open_state_db;
use super::{StateGateway, StateSnapshot, StoreResult};
use log::{info, warn};
use rusqlite::{params, Connection};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Stores each provider blob as one JSON row in a SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteStateGateway {
    path: PathBuf,
}

impl SqliteStateGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_rows(conn: &Connection) -> StoreResult<Vec<(String, String)>> {
        let mut stmt =
            conn.prepare("SELECT provider, payload FROM provider_state ORDER BY provider;")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl StateGateway for SqliteStateGateway {
    fn load(&self) -> StateSnapshot {
        let mut snapshot = StateSnapshot::new();
        if !self.path.exists() {
            info!("event=state_load module=store status=ok providers=0 reason=missing_file");
            return snapshot;
        }

        let rows = match open_state_db(&self.path).and_then(|conn| Self::read_rows(&conn)) {
            Ok(rows) => rows,
            Err(err) => {
                warn!("event=state_load module=store status=error error={err}");
                return snapshot;
            }
        };

        for (provider, payload) in rows {
            match serde_json::from_str::<Value>(&payload) {
                Ok(value) => {
                    snapshot.insert(provider, value);
                }
                Err(err) => warn!(
                    "event=state_load module=store status=skipped provider={} error={}",
                    provider, err
                ),
            }
        }
        info!(
            "event=state_load module=store status=ok providers={}",
            snapshot.len()
        );
        snapshot
    }

    fn save(&mut self, snapshot: &StateSnapshot) -> StoreResult<()> {
        let started_at = Instant::now();
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut conn = open_state_db(&self.path)?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM provider_state;", [])?;
        for (provider, value) in snapshot {
            let payload = serde_json::to_string(value)?;
            tx.execute(
                "INSERT INTO provider_state (provider, payload) VALUES (?1, ?2);",
                params![provider, payload],
            )?;
        }
        tx.commit()?;

        info!(
            "event=state_save module=store status=ok providers={} duration_ms={}",
            snapshot.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteStateGateway;
    use crate::store::{StateGateway, StateSnapshot};
    use serde_json::json;

    #[test]
    fn missing_file_loads_as_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = SqliteStateGateway::new(dir.path().join("absent.db"));
        assert!(gateway.load().is_empty());
        assert!(!gateway.path().exists());
    }

    #[test]
    fn save_replaces_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut gateway = SqliteStateGateway::new(dir.path().join("nested/state.db"));

        let mut first = StateSnapshot::new();
        first.insert("contacts".to_string(), json!([{"name": "bob"}]));
        first.insert("notes".to_string(), json!([]));
        gateway.save(&first).unwrap();

        let mut second = StateSnapshot::new();
        second.insert("contacts".to_string(), json!([]));
        gateway.save(&second).unwrap();

        assert_eq!(gateway.load(), second);
    }
}
