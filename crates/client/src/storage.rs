//! Persisted credential storage.
//!
//! A single process-wide key-value area holding the session credentials.
//! [`crate::session::SessionStore`] is the only writer; every other
//! component reads identity through its accessors so the expiry-check
//! invariant stays centralized.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Storage keys for session credentials.
///
/// The four keys are always written and cleared together as a group.
pub mod keys {
    /// Bearer token for API requests.
    pub const ACCESS_TOKEN: &str = "accessToken";

    /// Identity token carrying the signed claims payload.
    pub const ID_TOKEN: &str = "idToken";

    /// Token for obtaining fresh credentials.
    pub const REFRESH_TOKEN: &str = "refreshToken";

    /// Serialized decoded identity.
    pub const USER_INFO: &str = "userInfo";

    /// Every credential key, for group clears.
    pub const ALL: [&str; 4] = [ACCESS_TOKEN, ID_TOKEN, REFRESH_TOKEN, USER_INFO];
}

/// Process-wide key-value storage for session credentials.
///
/// Group writes and removals are atomic with respect to readers of the same
/// storage instance. Persistence is best-effort: the in-memory view is
/// authoritative for the life of the process.
pub trait CredentialStorage: Send + Sync {
    /// Read a single value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a group of values in one step.
    fn put_group(&self, entries: &[(&str, &str)]);

    /// Remove a group of keys in one step.
    fn remove_group(&self, keys: &[&str]);
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory storage
// ─────────────────────────────────────────────────────────────────────────────

/// Volatile storage backend, used in tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    map: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.map
            .read()
            .ok()
            .and_then(|map| map.get(key).cloned())
    }

    fn put_group(&self, entries: &[(&str, &str)]) {
        if let Ok(mut map) = self.map.write() {
            for (key, value) in entries {
                map.insert((*key).to_owned(), (*value).to_owned());
            }
        }
    }

    fn remove_group(&self, keys: &[&str]) {
        if let Ok(mut map) = self.map.write() {
            for key in keys {
                map.remove(*key);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File-backed storage
// ─────────────────────────────────────────────────────────────────────────────

/// File-backed storage persisting the key-value map as a JSON document.
///
/// The file is re-read once at open time; afterwards the in-memory map is
/// the source of truth and every mutation writes the whole document back.
/// A missing or corrupt file opens as empty storage - stale state never
/// blocks a fresh session.
pub struct FileStorage {
    path: PathBuf,
    map: RwLock<HashMap<String, String>>,
}

impl FileStorage {
    /// Open (or create) storage at the given path.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let map = Self::read_map(&path);
        Self {
            path,
            map: RwLock::new(map),
        }
    }

    fn read_map(path: &Path) -> HashMap<String, String> {
        let Ok(contents) = std::fs::read_to_string(path) else {
            return HashMap::new();
        };

        match serde_json::from_str(&contents) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Discarding corrupt session file");
                HashMap::new()
            }
        }
    }

    fn persist(&self, map: &HashMap<String, String>) {
        let json = match serde_json::to_string_pretty(map) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize session storage");
                return;
            }
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            tracing::warn!(path = %parent.display(), error = %e, "Failed to create session directory");
            return;
        }

        if let Err(e) = std::fs::write(&self.path, json) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to persist session storage");
        }
    }
}

impl CredentialStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.map
            .read()
            .ok()
            .and_then(|map| map.get(key).cloned())
    }

    fn put_group(&self, entries: &[(&str, &str)]) {
        if let Ok(mut map) = self.map.write() {
            for (key, value) in entries {
                map.insert((*key).to_owned(), (*value).to_owned());
            }
            self.persist(&map);
        }
    }

    fn remove_group(&self, keys: &[&str]) {
        if let Ok(mut map) = self.map.write() {
            for key in keys {
                map.remove(*key);
            }
            self.persist(&map);
        }
    }
}
