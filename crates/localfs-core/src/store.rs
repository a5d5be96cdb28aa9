//! Durable key-value state storage.
//!
//! The host registry persists its mapping set through a [`StateStore`],
//! keyed by an opaque state identifier. Hosts that provide their own
//! durable facility implement the trait; [`SqliteStore`] is the default
//! and [`MemoryStore`] serves tests and ephemeral setups.

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{FsError, FsResult};

/// Durable key-value storage for registry state.
///
/// Absence of a key is valid and distinct from an error.
pub trait StateStore: Send + Sync {
    /// Load the value stored under `key`, if any.
    fn load(&self, key: &str) -> FsResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// Must be durable by the time this returns.
    fn save(&self, key: &str, value: &str) -> FsResult<()>;
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// SQLite-backed state store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at the given database path.
    pub fn open(path: impl AsRef<Path>) -> FsResult<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| FsError::unknown(format!("open state db: {e}")))?;
        Self::init(conn)
    }

    /// Open an in-memory store. State does not survive the connection.
    pub fn in_memory() -> FsResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| FsError::unknown(format!("open state db: {e}")))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> FsResult<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| FsError::unknown(format!("init state db: {e}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl StateStore for SqliteStore {
    fn load(&self, key: &str) -> FsResult<Option<String>> {
        let conn = self.conn.lock();
        conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
            row.get(0)
        })
        .optional()
        .map_err(|e| FsError::unknown(format!("load state: {e}")))
    }

    fn save(&self, key: &str, value: &str) -> FsResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .map_err(|e| FsError::unknown(format!("save state: {e}")))?;
        Ok(())
    }
}

/// In-memory state store for tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn load(&self, key: &str) -> FsResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> FsResult<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
