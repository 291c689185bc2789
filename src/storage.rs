//! Persistent key-value storage for the vault.
//!
//! The engine only needs a string-keyed, string-valued durable store with
//! get/set/remove/clear — no transactions, no multi-key atomicity. Every
//! read-modify-write above this layer is a plain load-then-save; the engine
//! assumes a single writer at a time.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::VaultError;

/// Storage keys used by the engine.
pub const ACCOUNTS_KEY: &str = "accounts";
pub const PASSWORD_RECORDS_KEY: &str = "password_records";
pub const SESSION_TOKEN_KEY: &str = "session_token";
pub const LOGIN_ATTEMPTS_KEY: &str = "login_attempts";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, VaultError>;
    fn set(&self, key: &str, value: &str) -> Result<(), VaultError>;
    fn remove(&self, key: &str) -> Result<bool, VaultError>;
    fn clear(&self) -> Result<(), VaultError>;
}

/// In-memory store, used by tests and ephemeral sessions.
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, VaultError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| VaultError::StorageError(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), VaultError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| VaultError::StorageError(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, VaultError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| VaultError::StorageError(e.to_string()))?;
        Ok(entries.remove(key).is_some())
    }

    fn clear(&self) -> Result<(), VaultError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| VaultError::StorageError(e.to_string()))?;
        entries.clear();
        Ok(())
    }
}

/// File-backed store: the whole map serialized to one JSON file.
///
/// Load-then-save on every mutation. The mutex only guards against racing
/// writers inside this process; concurrent processes are out of scope.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> HashMap<String, String> {
        match fs::read_to_string(&self.path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
                tracing::warn!("Corrupt store file {:?}: {}. Treating as empty.", self.path, e);
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        }
    }

    fn save(&self, entries: &HashMap<String, String>) -> Result<(), VaultError> {
        let data = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, data).map_err(|e| VaultError::StorageError(e.to_string()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, VaultError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| VaultError::StorageError(e.to_string()))?;
        Ok(self.load().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), VaultError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| VaultError::StorageError(e.to_string()))?;
        let mut entries = self.load();
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<bool, VaultError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| VaultError::StorageError(e.to_string()))?;
        let mut entries = self.load();
        let existed = entries.remove(key).is_some();
        if existed {
            self.save(&entries)?;
        }
        Ok(existed)
    }

    fn clear(&self) -> Result<(), VaultError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| VaultError::StorageError(e.to_string()))?;
        self.save(&HashMap::new())
    }
}
