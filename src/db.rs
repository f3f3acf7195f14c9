use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

use crate::error::{PosError, PosResult};

/// Narrow persistence interface: JSON documents by key, read-after-write
/// consistent, no cross-key transactions.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> PosResult<Option<Value>>;
    fn set(&self, key: &str, value: &Value) -> PosResult<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> PosResult<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &Value) -> PosResult<()> {
        (**self).set(key, value)
    }
}

/// Read a JSON array stored under `key`. A missing key is an empty list.
pub fn load_list<T, S>(store: &S, key: &str) -> PosResult<Vec<T>>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(Vec::new()),
    }
}

pub fn save_list<T, S>(store: &S, key: &str, items: &[T]) -> PosResult<()>
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    let value = serde_json::to_value(items)?;
    store.set(key, &value)
}

/// SQLite-backed store.
pub struct Database {
    pub conn: Mutex<Connection>,
}

impl Database {
    pub fn new(db_path: &Path) -> PosResult<Self> {
        if let Some(dir) = db_path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }

        info!("Opening database at {}", db_path.display());
        let conn = Connection::open(db_path)?;

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> PosResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    pub fn initialize(&self) -> PosResult<()> {
        let conn = self.conn.lock().map_err(|_| PosError::Lock)?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            ",
        )?;

        Ok(())
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> PosResult<Option<Value>> {
        let conn = self.conn.lock().map_err(|_| PosError::Lock)?;

        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &Value) -> PosResult<()> {
        let conn = self.conn.lock().map_err(|_| PosError::Lock)?;
        let raw = serde_json::to_string(value)?;

        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, raw],
        )?;
        debug!(key, bytes = raw.len(), "kv_store write");

        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> PosResult<Option<Value>> {
        let entries = self.entries.lock().map_err(|_| PosError::Lock)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> PosResult<()> {
        let mut entries = self.entries.lock().map_err(|_| PosError::Lock)?;
        entries.insert(key.to_string(), value.clone());
        Ok(())
    }
}
