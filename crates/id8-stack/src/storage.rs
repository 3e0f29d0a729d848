//! Persistence hooks for [`StackStore`].

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use id8_core::config::StackConfig;
use id8_core::{Error, Result};

use crate::store::StackStore;

/// Somewhere a stack store can be loaded from and saved to.
pub trait StackStorage {
    /// Load the stored state; `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<StackStore>>;

    /// Replace the stored state.
    fn save(&self, store: &StackStore) -> Result<()>;

    /// Human-readable location for log messages.
    fn describe(&self) -> String;
}

/// JSON file on local disk.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Storage at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at the configured path, or the platform default.
    pub fn from_config(config: &StackConfig) -> Result<Self> {
        config
            .resolved_storage_path()
            .map(Self::new)
            .ok_or_else(|| {
                Error::config("no stack.storage_path set and no platform data directory found")
            })
    }

    /// File path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StackStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<StackStore>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content =
            std::fs::read_to_string(&self.path).map_err(|e| Error::io_with_path(e, &self.path))?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, store: &StackStore) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
        }
        let json = serde_json::to_string_pretty(store)?;
        // Write beside the target, then rename over it.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| Error::io_with_path(e, &tmp))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| Error::io_with_path(e, &self.path))?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-process storage for tests and ephemeral sessions.
///
/// Keeps the serialized form so loads go through the same parsing as files.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: Mutex<Option<String>>,
}

impl MemoryStorage {
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored JSON, if any.
    pub fn raw(&self) -> Option<String> {
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StackStorage for MemoryStorage {
    fn load(&self) -> Result<Option<StackStore>> {
        match self.raw() {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn save(&self, store: &StackStore) -> Result<()> {
        let json = serde_json::to_string(store)?;
        *self.data.lock().unwrap_or_else(PoisonError::into_inner) = Some(json);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
