//! Key-value persistence
//!
//! Everything the game stores goes through [`KeyValueStore`] as JSON text:
//! - `MemoryStore` for native runs and tests
//! - `platform::LocalStorage` in the browser
//! - `ProfileStore` layers player records and leaderboards on top

pub mod profile;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use profile::{GameRecord, PlayerProfile, ProfileStore};

/// Errors from a storage backend
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage backend is unavailable")]
    Unavailable,
    #[error("write to {key:?} failed: {reason}")]
    Write { key: String, reason: String },
    #[error("stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// String key-value capability (LocalStorage semantics)
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and decode a JSON value; `Ok(None)` when the key is absent
pub fn load_json<T, S>(store: &S, key: &str) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key) {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

/// Encode and write a JSON value
pub fn save_json<T, S>(store: &S, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let text = serde_json::to_string(value)?;
    store.set(key, &text)
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Where a finished session's results go. Fire-and-forget: implementations
/// log their own failures.
pub trait ProgressSink {
    /// Record a finished (won or lost) level session
    fn save_session(&mut self, player: &str, level_scores: &BTreeMap<u8, u64>, total: u64);
    /// Make `level` playable for `player`
    fn unlock_level(&mut self, player: &str, level: u8);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Blob {
        a: u32,
        b: String,
    }

    #[test]
    fn test_memory_store_shares_clones() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.set("k", "v").unwrap();
        assert_eq!(other.get("k").as_deref(), Some("v"));
        other.remove("k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_json_helpers() {
        let store = MemoryStore::new();
        assert!(load_json::<Blob, _>(&store, "blob").unwrap().is_none());

        let blob = Blob { a: 3, b: "x".into() };
        save_json(&store, "blob", &blob).unwrap();
        assert_eq!(load_json::<Blob, _>(&store, "blob").unwrap(), Some(blob));

        store.set("blob", "{broken").unwrap();
        assert!(matches!(
            load_json::<Blob, _>(&store, "blob"),
            Err(StorageError::Json(_))
        ));
    }
}
