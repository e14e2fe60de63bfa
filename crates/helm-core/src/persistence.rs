use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::endpoint::EntityKind;
use crate::error::{Error, Result};
use crate::session::SessionSlot;
use crate::utils::paths::AppPaths;

/// Device-local string store used to remember last-used ids.
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// In-process store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let Ok(entries) = self.entries.read() else {
            warn!(key, "Selection store lock poisoned; treating entry as missing");
            return None;
        };
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| Error::Configuration("memory store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a flat JSON object on disk.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl FileStore {
    /// Default location under the user data directory.
    pub fn default_path() -> Result<PathBuf> {
        let data_dir = AppPaths::user_data_dir().ok_or_else(|| {
            Error::Configuration("Cannot determine project directories".to_string())
        })?;
        Ok(data_dir.join("selection.json"))
    }

    /// Open the store at `path`. A missing file starts empty; an unreadable
    /// one is ignored with a warning so stale state never blocks startup.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(
                        "Failed to parse selection store at {:?}: {}. Starting empty.",
                        path, e
                    );
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, contents)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let Ok(entries) = self.entries.read() else {
            warn!(key, "Selection store lock poisoned; treating entry as missing");
            return None;
        };
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| Error::Configuration("file store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }
}

/// Key under which the last-used id of `kind` is kept for `slot`.
pub fn storage_key(kind: EntityKind, slot: SessionSlot) -> String {
    format!("{}{}", kind.storage_prefix(), slot.0)
}

/// Read side of the last-used id cache, plus the write used when a user
/// explicitly picks an entity.
#[derive(Debug, Clone)]
pub struct PersistenceBridge {
    store: Arc<dyn KeyValueStore>,
}

impl PersistenceBridge {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Last-used id for `kind` in `slot`. The value may name an entity that no
    /// longer exists; validating it is the caller's job.
    pub fn read(&self, slot: SessionSlot, kind: EntityKind) -> Option<String> {
        self.store.get(&storage_key(kind, slot))
    }

    pub fn remember(&self, slot: SessionSlot, kind: EntityKind, id: &str) -> Result<()> {
        debug!(%slot, %kind, id, "Remembering last-used selection");
        self.store.set(&storage_key(kind, slot), id)
    }
}
