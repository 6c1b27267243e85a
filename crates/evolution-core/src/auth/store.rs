use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::warn;

/// Key under which the credential is mirrored.
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Storage file name in the data directory
const STORAGE_FILE: &str = "storage.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Durable key-value mirror of the session credential.
///
/// Implementations only move raw strings around; they never interpret the token.
pub trait TokenStore: Send + Sync {
    fn read(&self) -> Result<Option<String>, StoreError>;
    fn write(&self, token: &str) -> Result<(), StoreError>;
    fn remove(&self) -> Result<(), StoreError>;
}

impl<T: TokenStore + ?Sized> TokenStore for Box<T> {
    fn read(&self) -> Result<Option<String>, StoreError> {
        (**self).read()
    }

    fn write(&self, token: &str) -> Result<(), StoreError> {
        (**self).write(token)
    }

    fn remove(&self) -> Result<(), StoreError> {
        (**self).remove()
    }
}

/// JSON object file holding string entries, one of which is the credential.
pub struct FileTokenStore {
    path: PathBuf,
    key: String,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self::with_key(path, AUTH_TOKEN_KEY)
    }

    pub fn with_key(path: PathBuf, key: &str) -> Self {
        Self {
            path,
            key: key.to_string(),
        }
    }

    /// Store at `<dir>/storage.json`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(STORAGE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_entries(&self) -> Result<BTreeMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    /// Entries to rewrite. A corrupt file is copied aside to `<name>.corrupt` and
    /// replaced, so its other keys can still be recovered by hand.
    fn entries_for_update(&self) -> BTreeMap<String, String> {
        match self.load_entries() {
            Ok(entries) => entries,
            Err(e) => {
                let backup = self.corrupt_path();
                warn!(
                    path = %self.path.display(),
                    backup = %backup.display(),
                    error = %e,
                    "Storage file unreadable, replacing it"
                );
                if let Err(e) = std::fs::copy(&self.path, &backup) {
                    warn!(error = %e, "Failed to keep a copy of the unreadable storage file");
                }
                BTreeMap::new()
            }
        }
    }

    fn corrupt_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".corrupt");
        PathBuf::from(name)
    }

    fn save_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn read(&self) -> Result<Option<String>, StoreError> {
        Ok(self.load_entries()?.remove(&self.key))
    }

    fn write(&self, token: &str) -> Result<(), StoreError> {
        let mut entries = self.entries_for_update();
        entries.insert(self.key.clone(), token.to_string());
        self.save_entries(&entries)
    }

    fn remove(&self) -> Result<(), StoreError> {
        if !self.path.exists() {
            return Ok(());
        }
        let mut entries = self.entries_for_update();
        if entries.remove(&self.key).is_some() || entries.is_empty() {
            self.save_entries(&entries)?;
        }
        Ok(())
    }
}

/// In-memory mirror. Clones share the same map, so a second `SessionManager`
/// built over a clone sees what the first one persisted.
#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a credential
    pub fn with_token(token: &str) -> Self {
        let store = Self::new();
        store
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(AUTH_TOKEN_KEY.to_string(), token.to_string());
        store
    }

    /// Raw view of the mirrored value
    pub fn get(&self) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(AUTH_TOKEN_KEY)
            .cloned()
    }
}

impl TokenStore for MemoryTokenStore {
    fn read(&self) -> Result<Option<String>, StoreError> {
        Ok(self.get())
    }

    fn write(&self, token: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(AUTH_TOKEN_KEY.to_string(), token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(AUTH_TOKEN_KEY);
        Ok(())
    }
}
