//! Client persistent storage.
//!
//! Four independent keys, each read at startup and written right after the
//! action that changes it:
//!
//! | key                 | value                                  |
//! |---------------------|----------------------------------------|
//! | `chatcsv-user-name` | display name, raw text                 |
//! | `chatcsv-theme`     | `light` / `dark`, raw text             |
//! | `chatcsv-history`   | JSON array of [`ChatHistoryEntry`]     |
//! | `chatcsv-interests` | JSON object of [`InterestCounters`]    |
//!
//! Storage problems are never fatal: [`ClientStorage`] logs them and behaves
//! as if the value were absent.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::error::{ChatResult, StorageError, StorageResult};
use crate::interest::InterestCounters;
use crate::paths::{ChatPaths, PathError};
use crate::session::ChatHistoryEntry;

/// Storage key names.
pub mod keys {
    pub const NAME: &str = "chatcsv-user-name";
    pub const THEME: &str = "chatcsv-theme";
    pub const HISTORY: &str = "chatcsv-history";
    pub const INTERESTS: &str = "chatcsv-interests";

    pub const ALL: [&str; 4] = [NAME, THEME, HISTORY, INTERESTS];
}

/// Raw string key/value persistence.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io {
                key: key.to_string(),
                source: e,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let io_err = |e| StorageError::Io {
            key: key.to_string(),
            source: e,
        };
        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        std::fs::write(self.path_for(key), value).map_err(io_err)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io {
                key: key.to_string(),
                source: e,
            }),
        }
    }
}

/// In-memory store; clones share contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all stored values.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.values
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    fn with_values<T>(
        &self,
        key: &str,
        f: impl FnOnce(&mut BTreeMap<String, String>) -> T,
    ) -> StorageResult<T> {
        let mut values = self.values.lock().map_err(|_| StorageError::Corrupt {
            key: key.to_string(),
            message: "memory store lock poisoned".into(),
        })?;
        Ok(f(&mut values))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.with_values(key, |v| v.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.with_values(key, |v| {
            v.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.with_values(key, |v| {
            v.remove(key);
        })
    }
}

// ---------------------------------------------------------------------------
// Typed access
// ---------------------------------------------------------------------------

/// Display theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Anything other than `dark` is treated as light.
    pub fn from_stored(value: &str) -> Self {
        if value.trim() == "dark" {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed, failure-tolerant view over a [`KeyValueStore`].
#[derive(Clone)]
pub struct ClientStorage {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for ClientStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientStorage").finish_non_exhaustive()
    }
}

impl ClientStorage {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// File-backed storage rooted at `dir`.
    pub fn open_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(FileStore::new(dir))
    }

    /// File-backed storage in the configured directory, or under the XDG
    /// state dir when none is configured. The XDG directories are created.
    pub fn open_configured(config: &ClientConfig, paths: Option<&ChatPaths>) -> ChatResult<Self> {
        let dir = match (&config.storage_dir, paths) {
            (Some(dir), _) => dir.clone(),
            (None, Some(paths)) => {
                paths.ensure_dirs()?;
                paths.storage_dir()
            }
            (None, None) => return Err(PathError::NoHome.into()),
        };
        Ok(Self::open_dir(dir))
    }

    pub fn load_name(&self) -> Option<String> {
        self.read(keys::NAME)
    }

    pub fn save_name(&self, name: &str) {
        self.write(keys::NAME, name);
    }

    pub fn load_theme(&self) -> Theme {
        self.read(keys::THEME)
            .map(|t| Theme::from_stored(&t))
            .unwrap_or_default()
    }

    pub fn save_theme(&self, theme: Theme) {
        self.write(keys::THEME, theme.as_str());
    }

    pub fn load_history(&self) -> Vec<ChatHistoryEntry> {
        self.read_json(keys::HISTORY).unwrap_or_default()
    }

    pub fn save_history(&self, history: &[ChatHistoryEntry]) {
        self.write_json(keys::HISTORY, history);
    }

    pub fn load_interests(&self) -> InterestCounters {
        self.read_json(keys::INTERESTS).unwrap_or_default()
    }

    pub fn save_interests(&self, counters: &InterestCounters) {
        self.write_json(keys::INTERESTS, counters);
    }

    /// Remove all four keys. Every removal is attempted even if one fails.
    pub fn clear(&self) {
        for key in keys::ALL {
            if let Err(e) = self.store.remove(key) {
                tracing::warn!(error = %e, key, "error clearing storage key");
            }
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, key, "error reading storage key");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            tracing::warn!(error = %e, key, "error saving storage key");
        }
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.read(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                let e = StorageError::Corrupt {
                    key: key.to_string(),
                    message: e.to_string(),
                };
                tracing::warn!(error = %e, key, "ignoring corrupt storage value");
                None
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.write(key, &json),
            Err(e) => {
                let e = StorageError::Encode {
                    key: key.to_string(),
                    message: e.to_string(),
                };
                tracing::warn!(error = %e, key, "error encoding storage value");
            }
        }
    }
}
