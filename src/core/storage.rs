//! Persistent key-value capability
//!
//! History and settings are stored as JSON values under fixed keys. The host
//! may supply its own store by implementing [`KeyValueStore`]; two backends ship
//! with the crate:
//! - `RedbStore`: embedded database file under the platform data directory
//! - `MemoryStore`: process-local map, also the fallback when the database
//!   cannot be opened

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use directories::ProjectDirs;
use enum_dispatch::enum_dispatch;
use redb::{Database, ReadableTable, TableDefinition};
use serde_json::Value;

use crate::shared::error::{AppError, AppResult};

/// Key under which the AI settings are stored
pub const SETTINGS_KEY: &str = "settings";

/// Key under which the translation history is stored
pub const HISTORY_KEY: &str = "translation_history";

/// Redb table definition for client storage
/// Key: storage key, Value: serialized JSON
const CLIENT_STORAGE_TABLE: TableDefinition<&str, &str> = TableDefinition::new("client_storage");

#[enum_dispatch]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. `Ok(None)` when the key was never written.
    fn get(&self, key: &str) -> AppResult<Option<Value>>;

    fn set(&self, key: &str, value: &Value) -> AppResult<()>;
}

/// Store backends known to the crate, statically dispatched
#[enum_dispatch(KeyValueStore)]
pub enum StorageBackend {
    Redb(RedbStore),
    Memory(MemoryStore),
}

impl StorageBackend {
    /// Open the default on-disk store, falling back to memory when that fails
    pub fn open_default() -> Self {
        match RedbStore::open_default() {
            Ok(store) => StorageBackend::Redb(store),
            Err(e) => {
                tracing::error!("[Storage] Failed to open database: {}, using in-memory fallback", e);
                StorageBackend::Memory(MemoryStore::new())
            }
        }
    }
}

/// Redb-based storage implementation
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    pub fn default_path() -> AppResult<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "antigravity", "layer-translator")
            .ok_or_else(|| AppError::Storage("Failed to get project directories".to_string()))?;
        Ok(proj_dirs.data_dir().join("layer_translator.redb"))
    }

    pub fn open_default() -> AppResult<Self> {
        Self::open(Self::default_path()?)
    }

    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Storage(format!("Failed to create data directory: {}", e)))?;
        }

        let db = Database::create(&path)
            .map_err(|e| AppError::Storage(format!("Failed to create database: {}", e)))?;

        // Initialize table
        {
            let write_txn = db.begin_write()?;
            {
                let _table = write_txn.open_table(CLIENT_STORAGE_TABLE)?;
            }
            write_txn.commit()?;
        }

        tracing::debug!("[Storage] Opened database at {}", path.display());
        Ok(Self { db: Arc::new(db) })
    }
}

impl KeyValueStore for RedbStore {
    fn get(&self, key: &str) -> AppResult<Option<Value>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CLIENT_STORAGE_TABLE)?;

        match table.get(key)? {
            Some(raw) => {
                let value = serde_json::from_str(raw.value())
                    .map_err(|e| AppError::Storage(format!("Corrupt value under '{}': {}", key, e)))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &Value) -> AppResult<()> {
        let serialized = serde_json::to_string(value)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CLIENT_STORAGE_TABLE)?;
            table.insert(key, serialized.as_str())?;
        }
        write_txn.commit()?;

        Ok(())
    }
}

/// In-memory storage
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<Value>> {
        let values = self.values.lock()
            .map_err(|e| AppError::Storage(format!("Mutex poisoned: {}", e)))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> AppResult<()> {
        let mut values = self.values.lock()
            .map_err(|e| AppError::Storage(format!("Mutex poisoned: {}", e)))?;
        values.insert(key.to_string(), value.clone());
        Ok(())
    }
}
