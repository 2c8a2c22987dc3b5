//! SQLite-backed record store: one row per path in a single `files` table.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use crate::core::RecordStore;
use crate::error::Result;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS files (
    path TEXT PRIMARY KEY,
    content BLOB NOT NULL
);
"#;

/// A [`RecordStore`] persisting records in a SQLite database.
///
/// The schema is bootstrapped once at open. The connection runs in autocommit
/// mode, so every upsert is durable when it returns and [`RecordStore::commit`]
/// has nothing left to flush.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) a database file at `path` and ensures the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database, mostly useful for tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Raw access to the underlying connection, for ad-hoc queries against
    /// the `files` table.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl RecordStore for SqliteStore {
    fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let content = self
            .conn
            .query_row(
                "SELECT content FROM files WHERE path = ?1",
                params![path],
                |row| row.get(0),
            )
            .optional()?;
        Ok(content)
    }

    fn upsert(&self, path: &str, content: &[u8]) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO files (path, content) VALUES (?1, ?2)",
            params![path, content],
        )?;
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        // Autocommit mode: every statement above already hit the journal.
        Ok(())
    }
}
