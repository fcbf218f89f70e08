//! Local key-value persistence for the studio.
//!
//! A flat JSON object on disk standing in for browser local storage. Values
//! are arbitrary serde types stored as JSON under string keys; changes stay
//! in memory until `flush`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

/// File extension recommended for store files.
pub const STORE_FILE_EXT: &str = "stencil.json";

/// Key the signed-in user record lives under.
pub const USER_KEY: &str = "user";

/// Key of the UI theme preference.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot serialize value for key {key:?}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("value under key {key:?} has an unexpected shape: {source}")]
    Deserialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct LocalStore {
    path: Option<PathBuf>,
    entries: BTreeMap<String, Value>,
    dirty: bool,
}

impl LocalStore {
    /// Store that never touches disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let entries = if path.exists() {
            let data = fs::read_to_string(path)
                .with_context(|| format!("read store file: {}", path.display()))?;
            serde_json::from_str(&data).context("parse store json")?
        } else {
            debug!(path = %path.display(), "no store file yet, starting empty");
            BTreeMap::new()
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            entries,
            dirty: false,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(value) = self.entries.get(key) else {
            return Ok(None);
        };
        T::deserialize(value)
            .map(Some)
            .map_err(|source| StoreError::Deserialize {
                key: key.to_string(),
                source,
            })
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.entries.insert(key.to_string(), value);
        self.dirty = true;
        Ok(())
    }

    /// Remove `key`. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        self.dirty |= removed;
        removed
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write pending changes as pretty JSON. No-op when clean or in-memory.
    pub fn flush(&mut self) -> anyhow::Result<()> {
        let Some(path) = self.path.as_deref() else {
            self.dirty = false;
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            // fs::write does NOT create directories; tests may run with missing `target/`
            fs::create_dir_all(parent)
                .with_context(|| format!("create parent dir: {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(&self.entries).context("serialize store to json")?;
        fs::write(path, json).with_context(|| format!("write store file: {}", path.display()))?;
        self.dirty = false;
        info!(path = %path.display(), keys = self.entries.len(), "store flushed");
        Ok(())
    }
}
