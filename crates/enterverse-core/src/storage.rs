use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::EnterverseError;

const SCHEMA_V1: &str = include_str!("../../../migrations/001_initial.sql");

/// Durable string documents addressed by a fixed key.
///
/// The favorites store only ever reads and replaces whole documents, so this
/// is all it needs from a storage backend.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, EnterverseError>;

    fn put(&mut self, key: &str, value: &str) -> Result<(), EnterverseError>;
}

/// SQLite-backed storage for enterverse state.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open (or create) the database at the given path and run migrations.
    pub fn open(path: &Path) -> Result<Self, EnterverseError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, EnterverseError> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for Storage {
    fn get(&self, key: &str) -> Result<Option<String>, EnterverseError> {
        self.conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), EnterverseError> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                            updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

/// Stand-in backend for when the database cannot be opened.
///
/// Reads and writes fail with the original open error, so the favorites
/// store starts empty and reports every mutation as not durable.
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<String>, EnterverseError> {
        Err(EnterverseError::Unavailable(self.reason.clone()))
    }

    fn put(&mut self, _key: &str, _value: &str) -> Result<(), EnterverseError> {
        Err(EnterverseError::Unavailable(self.reason.clone()))
    }
}

fn run_migrations(conn: &Connection) -> Result<(), EnterverseError> {
    let version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap_or(0);

    if version < 1 {
        conn.execute_batch(SCHEMA_V1)?;
        conn.pragma_update(None, "user_version", 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let mut db = Storage::open_memory().unwrap();
        assert_eq!(db.get("favorites").unwrap(), None);

        db.put("favorites", "[]").unwrap();
        assert_eq!(db.get("favorites").unwrap().as_deref(), Some("[]"));

        db.put("favorites", r#"[{"id":"1"}]"#).unwrap();
        assert_eq!(db.get("favorites").unwrap().as_deref(), Some(r#"[{"id":"1"}]"#));
        assert_eq!(db.get("other").unwrap(), None);
    }

    #[test]
    fn test_open_rejects_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enterverse.db");
        std::fs::write(&path, vec![0x5a; 4096]).unwrap();
        assert!(Storage::open(&path).is_err());
    }

    #[test]
    fn test_unavailable_store_fails_both_ways() {
        let mut store = UnavailableStore::new("file is not a database");
        let err = store.get("favorites").unwrap_err();
        assert!(err.to_string().contains("file is not a database"));
        assert!(store.put("favorites", "[]").is_err());
    }

    #[test]
    fn test_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enterverse.db");
        {
            let mut db = Storage::open(&path).unwrap();
            db.put("favorites", "[1]").unwrap();
        }
        let db = Storage::open(&path).unwrap();
        assert_eq!(db.get("favorites").unwrap().as_deref(), Some("[1]"));
    }
}
