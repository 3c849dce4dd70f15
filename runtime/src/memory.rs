//! In-memory durable storage.
//!
//! Behaves like browser local storage within one process: string keys,
//! string values, optional byte quota. Useful for ephemeral sessions and tests.

use commerce_state_core::environment::{DurableStorage, StorageError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

/// Key/value storage held in process memory
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
    quota: Option<usize>,
    writes: AtomicUsize,
}

impl MemoryStorage {
    /// Create empty storage without a quota
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty storage that rejects writes once the total size of all
    /// keys and values would exceed `bytes`
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::default()
        }
    }

    /// Seed a value directly, bypassing quota and write counting
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    /// Current value under `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Number of successful `set_item` calls so far
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of stored keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DurableStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(quota) = self.quota {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();

            if others + key.len() + value.len() > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    bytes: value.len(),
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_basic_contract() -> Result<(), StorageError> {
        let storage = MemoryStorage::new();

        // starts empty
        assert!(storage.is_empty());
        assert!(storage.get_item("missing")?.is_none());

        // set + get
        storage.set_item("a", "1")?;
        storage.set_item("b", "2")?;
        assert_eq!(storage.len(), 2);
        assert_eq!(storage.get_item("a")?.as_deref(), Some("1"));

        // overwrite keeps len()
        storage.set_item("a", "ONE")?;
        assert_eq!(storage.len(), 2);
        assert_eq!(storage.get_item("a")?.as_deref(), Some("ONE"));
        assert_eq!(storage.writes(), 3);

        // remove, including a missing key
        storage.remove_item("b")?;
        storage.remove_item("b")?;
        assert_eq!(storage.len(), 1);
        Ok(())
    }

    #[test]
    fn quota_rejects_oversized_writes() {
        let storage = MemoryStorage::with_quota(10);

        assert!(storage.set_item("k", "12345").is_ok());
        // replacing the same key only counts the new value
        assert!(storage.set_item("k", "123456789").is_ok());

        let err = storage.set_item("other", "xyz");
        assert!(matches!(err, Err(StorageError::QuotaExceeded { bytes: 3, .. })));
        assert_eq!(storage.get("other"), None);
    }
}
