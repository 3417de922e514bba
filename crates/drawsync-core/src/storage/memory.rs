//! In-memory storage implementation.

use super::{Storage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral sessions.
///
/// An optional quota caps the total number of bytes held across all keys,
/// which is how a browser's local storage fails once it fills up.
#[derive(Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    /// Create a new empty memory storage with no quota.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage that rejects writes once `quota` bytes are in use.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            values: RwLock::default(),
            quota: Some(quota),
        }
    }

    /// Total bytes currently stored (keys plus values).
    pub fn used_bytes(&self) -> usize {
        self.values
            .read()
            .map(|values| values.iter().map(|(k, v)| k.len() + v.len()).sum())
            .unwrap_or(0)
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl Storage for MemoryStorage {
    fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut values = self.values.write().map_err(lock_error)?;
        if let Some(quota) = self.quota {
            let others: usize = values
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = key.len() + value.len();
            let available = quota.saturating_sub(others);
            if needed > available {
                return Err(StorageError::QuotaExceeded { needed, available });
            }
        }
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn load(&self, key: &str) -> StorageResult<String> {
        let values = self.values.read().map_err(lock_error)?;
        values
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let mut values = self.values.write().map_err(lock_error)?;
        values.remove(key);
        Ok(())
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        let values = self.values.read().map_err(lock_error)?;
        Ok(values.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new();
        storage.save("test", "[1,2]").unwrap();
        assert_eq!(storage.load("test").unwrap(), "[1,2]");
    }

    #[test]
    fn test_not_found() {
        let storage = MemoryStorage::new();
        let result = storage.load("nonexistent");
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_exists_and_delete() {
        let storage = MemoryStorage::new();
        assert!(!storage.exists("test").unwrap());
        storage.save("test", "x").unwrap();
        assert!(storage.exists("test").unwrap());
        storage.delete("test").unwrap();
        assert!(!storage.exists("test").unwrap());
        // Deleting again is fine
        storage.delete("test").unwrap();
    }

    #[test]
    fn test_quota_exceeded_keeps_previous_value() {
        let storage = MemoryStorage::with_quota(10);
        storage.save("k", "12345").unwrap();
        let result = storage.save("k", "0123456789");
        assert!(matches!(result, Err(StorageError::QuotaExceeded { needed: 11, available: 10 })));
        assert_eq!(storage.load("k").unwrap(), "12345");
    }

    #[test]
    fn test_overwrite_does_not_count_old_value() {
        let storage = MemoryStorage::with_quota(8);
        storage.save("k", "1234567").unwrap();
        storage.save("k", "7654321").unwrap();
        assert_eq!(storage.used_bytes(), 8);
    }
}
