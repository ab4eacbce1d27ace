//! Persistent key/value storage for the session keys
//!
//! The token and the username are written together and removed together;
//! implementations must apply each multi-key call as a single step.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::error::ClientError;

pub const TOKEN_KEY: &str = "token";
pub const USERNAME_KEY: &str = "username";
pub const SESSION_KEYS: [&str; 2] = [TOKEN_KEY, USERNAME_KEY];

pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Writes every entry or none of them
    fn set_all(&self, entries: &[(&str, &str)]) -> Result<(), ClientError>;

    /// Removes every key or none of them
    fn remove_all(&self, keys: &[&str]) -> Result<(), ClientError>;
}

/// In-memory storage for tests and short-lived clients
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set_all(&self, entries: &[(&str, &str)]) -> Result<(), ClientError> {
        let mut map = self
            .entries
            .lock()
            .map_err(|_| ClientError::Storage("storage lock poisoned".to_string()))?;
        for (key, value) in entries {
            map.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), ClientError> {
        let mut map = self
            .entries
            .lock()
            .map_err(|_| ClientError::Storage("storage lock poisoned".to_string()))?;
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

/// JSON file storage
///
/// Each change rewrites the whole file through a temporary sibling and a
/// rename, so readers see either the old or the new set of keys.
#[derive(Clone, Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    fn load(&self) -> HashMap<String, String> {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable session file");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        }
    }

    fn store(&self, map: &HashMap<String, String>) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| ClientError::Storage(e.to_string()))?;
            }
        }

        let bytes = serde_json::to_vec_pretty(map).map_err(|e| ClientError::Storage(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes).map_err(|e| ClientError::Storage(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| ClientError::Storage(e.to_string()))
    }

    fn update(&self, apply: impl FnOnce(&mut HashMap<String, String>)) -> Result<(), ClientError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| ClientError::Storage("storage lock poisoned".to_string()))?;
        let mut map = self.load();
        apply(&mut map);
        self.store(&map)
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().ok()?;
        self.load().get(key).cloned()
    }

    fn set_all(&self, entries: &[(&str, &str)]) -> Result<(), ClientError> {
        self.update(|map| {
            for (key, value) in entries {
                map.insert(key.to_string(), value.to_string());
            }
        })
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), ClientError> {
        self.update(|map| {
            for key in keys {
                map.remove(*key);
            }
        })
    }
}
