//! Storage abstraction for persistence.
//!
//! Backends store string values under string keys, the way browser local
//! storage does. The history store writes one serialized snapshot array under
//! a single fixed key.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Key not found: {0}")]
    NotFound(String),
    #[error("Storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: usize, available: usize },
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for key-value storage backends.
pub trait Storage {
    /// Store a value, overwriting any previous value under `key`.
    fn save(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Load the value stored under `key`.
    fn load(&self, key: &str) -> StorageResult<String>;

    /// Remove `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check if `key` exists.
    fn exists(&self, key: &str) -> StorageResult<bool>;
}

impl<S: Storage + ?Sized> Storage for std::sync::Arc<S> {
    fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).save(key, value)
    }

    fn load(&self, key: &str) -> StorageResult<String> {
        (**self).load(key)
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        (**self).delete(key)
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        (**self).exists(key)
    }
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).save(key, value)
    }

    fn load(&self, key: &str) -> StorageResult<String> {
        (**self).load(key)
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        (**self).delete(key)
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        (**self).exists(key)
    }
}
