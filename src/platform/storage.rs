//! Score storage backends

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::persistence;

/// Named-integer storage for best scores
pub trait ScoreStore: Send {
    /// `Ok(None)` when nothing was stored under `key`
    fn load(&self, key: &str) -> Result<Option<u32>, StoreError>;
    fn save(&mut self, key: &str, value: u32) -> Result<(), StoreError>;
}

/// Volatile store (tests, `--no-save` runs)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, u32>,
}

impl MemoryStore {
    pub fn with(key: &str, value: u32) -> Self {
        let mut store = Self::default();
        store.values.insert(key.to_string(), value);
        store
    }

    pub fn get(&self, key: &str) -> Option<u32> {
        self.values.get(key).copied()
    }
}

impl ScoreStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<u32>, StoreError> {
        Ok(self.values.get(key).copied())
    }

    fn save(&mut self, key: &str, value: u32) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// One JSON envelope per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl ScoreStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<u32>, StoreError> {
        let path = self.path_for(key);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        persistence::decode(&text).map(Some)
    }

    fn save(&mut self, key: &str, value: u32) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        // Write then rename so a crash never leaves a half-written score
        fs::write(&tmp, persistence::encode(key, value)?)?;
        fs::rename(&tmp, &path)?;
        log::info!("Best score {} saved to {}", value, path.display());
        Ok(())
    }
}

/// Browser LocalStorage (WASM only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct LocalStore;

#[cfg(target_arch = "wasm32")]
impl LocalStore {
    fn storage() -> Result<web_sys::Storage, StoreError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| StoreError::unavailable("LocalStorage not available"))
    }
}

#[cfg(target_arch = "wasm32")]
impl ScoreStore for LocalStore {
    fn load(&self, key: &str) -> Result<Option<u32>, StoreError> {
        let storage = Self::storage()?;
        match storage.get_item(key) {
            Ok(Some(text)) => persistence::decode(&text).map(Some),
            Ok(None) => Ok(None),
            Err(_) => Err(StoreError::unavailable("LocalStorage read failed")),
        }
    }

    fn save(&mut self, key: &str, value: u32) -> Result<(), StoreError> {
        let storage = Self::storage()?;
        storage
            .set_item(key, &persistence::encode(key, value)?)
            .map_err(|_| StoreError::unavailable("LocalStorage write failed"))?;
        log::info!("Best score {} saved", value);
        Ok(())
    }
}
