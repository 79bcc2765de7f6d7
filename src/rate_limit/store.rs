use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Name of the persisted entry holding every subject's window.
pub const NAMESPACE: &str = "chat-limits";

/// Persisted state of one subject's current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowEntry {
    pub count: u32,
    /// Milliseconds since the Unix epoch.
    pub window_start: u64,
}

/// Layout version written with every snapshot.
pub const LAYOUT_VERSION: u32 = 1;

fn layout_version() -> u32 {
    LAYOUT_VERSION
}

/// Everything the rate limit store persists, as a single namespaced entry.
///
/// Keys are composite (`"{subject}@{window_ms}ms"`), see
/// [`LimitPolicy::storage_key`](super::LimitPolicy::storage_key). A document without a
/// `version` field is read as the current layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitSnapshot {
    #[serde(default = "layout_version")]
    pub version: u32,
    #[serde(default)]
    pub limits: BTreeMap<String, WindowEntry>,
}

impl Default for LimitSnapshot {
    fn default() -> Self {
        Self { version: LAYOUT_VERSION, limits: BTreeMap::new() }
    }
}

impl LimitSnapshot {
    pub fn to_json(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a persisted snapshot, rejecting layouts this build does not understand.
    pub fn from_json(raw: &str) -> Result<Self, StorageError> {
        let snapshot: Self = serde_json::from_str(raw)?;
        if snapshot.version != LAYOUT_VERSION {
            return Err(StorageError::UnsupportedVersion(snapshot.version));
        }
        Ok(snapshot)
    }
}

/// Durable storage for the rate limit store.
///
/// Backends are synchronous: a decision completes before any network call is made.
/// Errors are reported here and swallowed by the store.
pub trait LimitStorage: Send + Sync {
    /// Read the persisted snapshot. A backend with nothing stored returns an empty one.
    fn load(&self) -> Result<LimitSnapshot, StorageError>;

    /// Overwrite the persisted snapshot.
    fn save(&self, snapshot: &LimitSnapshot) -> Result<(), StorageError>;

    /// Operator-set window limit, if one is configured.
    fn limit_override(&self) -> Result<Option<u32>, StorageError> {
        Ok(None)
    }
}

impl<T: LimitStorage + ?Sized> LimitStorage for Arc<T> {
    fn load(&self) -> Result<LimitSnapshot, StorageError> {
        (**self).load()
    }

    fn save(&self, snapshot: &LimitSnapshot) -> Result<(), StorageError> {
        (**self).save(snapshot)
    }

    fn limit_override(&self) -> Result<Option<u32>, StorageError> {
        (**self).limit_override()
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    // Serialized form, so a reload goes through the same path a durable backend would.
    raw: Option<String>,
    limit_override: Option<u32>,
    failing: bool,
}

/// Simple in-memory storage. Clones share state, so a second store built from a clone
/// observes what the first one persisted (a "page reload").
#[derive(Default, Clone, Debug)]
pub struct MemoryStorage {
    data: Arc<Mutex<MemoryState>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that errors on every operation.
    pub fn failing() -> Self {
        let storage = Self::default();
        storage.set_failing(true);
        storage
    }

    pub fn set_failing(&self, failing: bool) {
        self.state().failing = failing;
    }

    pub fn set_limit_override(&self, limit: Option<u32>) {
        self.state().limit_override = limit;
    }

    /// The raw persisted JSON, if anything has been saved.
    pub fn raw(&self) -> Option<String> {
        self.state().raw.clone()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LimitStorage for MemoryStorage {
    fn load(&self) -> Result<LimitSnapshot, StorageError> {
        let guard = self.state();
        if guard.failing {
            return Err(StorageError::Unavailable("memory storage disabled".into()));
        }
        match guard.raw.as_deref() {
            Some(raw) => LimitSnapshot::from_json(raw),
            None => Ok(LimitSnapshot::default()),
        }
    }

    fn save(&self, snapshot: &LimitSnapshot) -> Result<(), StorageError> {
        let raw = snapshot.to_json()?;
        let mut guard = self.state();
        if guard.failing {
            return Err(StorageError::Unavailable("memory storage disabled".into()));
        }
        guard.raw = Some(raw);
        Ok(())
    }

    fn limit_override(&self) -> Result<Option<u32>, StorageError> {
        let guard = self.state();
        if guard.failing {
            return Err(StorageError::Unavailable("memory storage disabled".into()));
        }
        Ok(guard.limit_override)
    }
}
