use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::topic::AppState;

/// Storage slot used when the config does not name one.
pub const DEFAULT_STORAGE_KEY: &str = "RESEARCH_NOTEBOOK";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode notebook state: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A string-valued key-value slot store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One file per key inside a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;

        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");
        let file = std::fs::File::create(&tmp)?;
        let mut writer = std::io::BufWriter::new(file);
        writer.write_all(value.as_bytes())?;
        writer.flush()?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-process store for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    pub slots: std::collections::HashMap<String, String>,
    pub fail_writes: bool,
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(std::io::Error::other("read-only store").into());
        }
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reads and writes the whole notebook snapshot under a single key.
pub struct Persistence {
    store: Box<dyn KeyValueStore>,
    key: String,
}

impl Persistence {
    pub fn new(store: Box<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let key = if key.trim().is_empty() {
            DEFAULT_STORAGE_KEY.to_string()
        } else {
            key
        };
        Self { store, key }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Saved state, or `None` when nothing usable is stored.
    ///
    /// Read failures and malformed blobs are logged and treated as
    /// "no saved data"; this never fails.
    pub fn load(&self) -> Option<AppState> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("could not read notebook state: {e}");
                return None;
            }
        };

        match serde_json::from_str::<AppState>(&raw) {
            Ok(mut state) => {
                if state.repair_active() {
                    tracing::warn!("stored active topic no longer exists; cleared");
                }
                Some(state)
            }
            Err(e) => {
                tracing::warn!("stored notebook state is malformed, starting empty: {e}");
                None
            }
        }
    }

    pub fn save(&mut self, state: &AppState) -> Result<(), StorageError> {
        let json = serde_json::to_string(state)?;
        self.store.set(&self.key, &json)
    }
}
