//! Key-value persistence backends for the credential store.
//!
//! The store is written against a small string-keyed trait so callers can
//! inject a backend with an explicit lifetime instead of reaching for a
//! process-wide singleton. Two implementations ship here: a JSON file
//! (the default) and an in-memory map for tests and embedding.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{PromptforgeError, Result};

/// String-keyed storage used by the credential store.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Volatile in-memory backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// JSON-file backend; the whole map is rewritten on every mutation.
///
/// Concurrent writers from separate processes are last-write-wins on the
/// persisted blob; in-process callers are serialized by the credential
/// store's lock.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open a file store at the given path, loading existing entries.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| {
                PromptforgeError::Storage(format!("failed to read {path:?}: {e}"))
            })?;
            serde_json::from_str(&content)?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    /// Open the default store at `~/.promptforge/credentials.json`.
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path())
    }

    /// Default persistence path.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".promptforge")
            .join("credentials.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PromptforgeError::Storage(format!("failed to create {parent:?}: {e}"))
            })?;
        }
        let content = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, content)
            .map_err(|e| PromptforgeError::Storage(format!("failed to write {:?}: {e}", self.path)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }
}
