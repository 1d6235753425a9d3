// SQLite-backed key-value store

use crate::kv::KvStore;
use eyre::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Key-value store in a single SQLite table
pub struct SqliteKv {
    db: Connection,
}

impl SqliteKv {
    /// Open or create `taskboard.db` inside the directory `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref();
        fs::create_dir_all(base_path).context("Failed to create store directory")?;

        let db_path = base_path.join("taskboard.db");
        let db = Connection::open(&db_path).context("Failed to open SQLite database")?;

        let store = Self { db };
        store.create_schema()?;
        Ok(store)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let store = Self { db };
        store.create_schema()?;
        Ok(store)
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating database schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }
}

impl KvStore for SqliteKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .db
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()
            .context("Failed to read value from database")?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.db
            .execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                rusqlite::params![key, value, chrono::Utc::now().timestamp_millis()],
            )
            .context("Failed to write value to database")?;
        debug!(key, bytes = value.len(), "SqliteKv::set: wrote value");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sqlite_open_creates_database() {
        let temp = TempDir::new().unwrap();
        let _kv = SqliteKv::open(temp.path()).unwrap();
        assert!(temp.path().join("taskboard.db").exists());
    }

    #[test]
    fn test_sqlite_set_get_overwrite() {
        let mut kv = SqliteKv::open_in_memory().unwrap();
        assert_eq!(kv.get("tasks").unwrap(), None);

        kv.set("tasks", "one").unwrap();
        kv.set("tasks", "two").unwrap();
        assert_eq!(kv.get("tasks").unwrap().as_deref(), Some("two"));

        let rows: i64 = kv.db.query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0)).unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_sqlite_persists_across_open() {
        let temp = TempDir::new().unwrap();
        {
            let mut kv = SqliteKv::open(temp.path()).unwrap();
            kv.set("tasks", r#"{"version":1,"tasks":[]}"#).unwrap();
        }

        let kv = SqliteKv::open(temp.path()).unwrap();
        assert_eq!(kv.get("tasks").unwrap().as_deref(), Some(r#"{"version":1,"tasks":[]}"#));
    }
}
