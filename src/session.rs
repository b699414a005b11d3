//! Durable session identity.
//!
//! The client persists exactly three strings (party id, player id, player
//! name) in a key-value store so a restarted client can resume its seat.

use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const PARTY_ID_KEY: &str = "actrix_party_id";
pub const PLAYER_ID_KEY: &str = "actrix_player_id";
pub const PLAYER_NAME_KEY: &str = "actrix_player_name";

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Session file I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Session file could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Minimal persistent string map
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&mut self, key: &str) -> StoreResult<()>;
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        self.values().remove(key);
        Ok(())
    }
}

/// On-disk layout of `JsonFileStore`
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    /// Last write (ISO8601)
    #[serde(default)]
    saved_at: Option<String>,
    #[serde(default)]
    values: BTreeMap<String, String>,
}

/// Store backed by one small JSON file, rewritten on every change
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    file: StoreFile,
}

impl JsonFileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file is an empty store; an unreadable one is discarded with
    /// a warning.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<StoreFile>(&contents) {
                Ok(file) => file,
                Err(e) => {
                    tracing::warn!("Ignoring corrupt session file {}: {}", path.display(), e);
                    StoreFile::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreFile::default(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&mut self) -> StoreResult<()> {
        self.file.saved_at = Some(chrono::Utc::now().to_rfc3339());
        let json = serde_json::to_string_pretty(&self.file)?;
        std::fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.file.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.file.values.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        if self.file.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Session triple as read back from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub party_id: PartyId,
    pub player_id: PlayerId,
    pub player_name: Option<String>,
}

pub struct SessionStore {
    store: Box<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    fn non_empty(&self, key: &str) -> Option<String> {
        self.store.get(key).filter(|v| !v.is_empty())
    }

    /// The persisted session, if both ids are present
    pub fn load(&self) -> Option<StoredSession> {
        let party_id = self.non_empty(PARTY_ID_KEY)?;
        let player_id = self.non_empty(PLAYER_ID_KEY)?;
        Some(StoredSession {
            party_id,
            player_id,
            player_name: self.non_empty(PLAYER_NAME_KEY),
        })
    }

    pub fn save(&mut self, session: &ClientSession) -> StoreResult<()> {
        if session.party_id.is_empty() || session.player_id.is_empty() {
            return Ok(());
        }
        self.store.set(PARTY_ID_KEY, &session.party_id)?;
        self.store.set(PLAYER_ID_KEY, &session.player_id)?;
        self.store.set(PLAYER_NAME_KEY, &session.player_name)
    }

    pub fn clear(&mut self) -> StoreResult<()> {
        self.store.remove(PARTY_ID_KEY)?;
        self.store.remove(PLAYER_ID_KEY)?;
        self.store.remove(PLAYER_NAME_KEY)
    }
}
