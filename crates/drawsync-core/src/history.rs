//! Snapshot history with undo/redo and persistence.

use crate::snapshot::Snapshot;
use crate::storage::{Storage, StorageError};
use std::collections::VecDeque;

/// Fixed key the snapshot sequence is persisted under.
pub const DEFAULT_HISTORY_KEY: &str = "drawingHistory";

/// Sequence of full-surface snapshots, one per completed local action, plus a
/// buffer of undone snapshots.
///
/// The sequence is written to storage as a whole after every mutation. A
/// failed write is logged and otherwise ignored: the in-memory state stays
/// authoritative and the next mutation writes the full sequence again.
pub struct HistoryStore<S: Storage> {
    storage: S,
    key: String,
    /// Committed snapshots, oldest first.
    entries: Vec<Snapshot>,
    /// Undone snapshots, front = next to redo. Never persisted.
    redo: VecDeque<Snapshot>,
    /// Whether the last write to storage failed.
    persist_pending: bool,
}

impl<S: Storage> HistoryStore<S> {
    /// Create an empty store persisting under [`DEFAULT_HISTORY_KEY`].
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, DEFAULT_HISTORY_KEY)
    }

    /// Create an empty store persisting under `key`.
    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            entries: Vec::new(),
            redo: VecDeque::new(),
            persist_pending: false,
        }
    }

    /// Load the persisted sequence, replacing the in-memory one.
    ///
    /// The redo buffer always starts empty. A missing key yields an empty
    /// sequence; unreadable or corrupt data is logged and also yields an
    /// empty sequence.
    pub fn restore(&mut self) -> &[Snapshot] {
        self.redo.clear();
        self.persist_pending = false;
        self.entries = match self.storage.load(&self.key) {
            Ok(json) => match serde_json::from_str::<Vec<Snapshot>>(&json) {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!("Discarding unreadable history under '{}': {}", self.key, e);
                    Vec::new()
                }
            },
            Err(StorageError::NotFound(_)) => Vec::new(),
            Err(e) => {
                log::warn!("Failed to load history '{}': {}", self.key, e);
                Vec::new()
            }
        };
        log::debug!("Restored {} history entries", self.entries.len());
        &self.entries
    }

    /// Append a snapshot for a completed action. Clears the redo buffer.
    pub fn commit(&mut self, snapshot: Snapshot) {
        self.entries.push(snapshot);
        self.redo.clear();
        self.persist();
    }

    /// Step back one action.
    ///
    /// Returns the snapshot to display afterwards: the new last entry, or the
    /// empty sentinel when nothing is left. Returns `None` (and does nothing)
    /// when there is nothing to undo.
    pub fn undo(&mut self) -> Option<Snapshot> {
        let undone = self.entries.pop()?;
        self.redo.push_front(undone);
        self.persist();
        Some(self.entries.last().cloned().unwrap_or_else(Snapshot::empty))
    }

    /// Re-apply the most recently undone action and return its snapshot.
    /// Returns `None` (and does nothing) when the redo buffer is empty.
    pub fn redo(&mut self) -> Option<Snapshot> {
        let snapshot = self.redo.pop_front()?;
        self.entries.push(snapshot.clone());
        self.persist();
        Some(snapshot)
    }

    /// Drop all history and erase the persisted copy.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.redo.clear();
        match self.storage.delete(&self.key) {
            Ok(()) => self.persist_pending = false,
            Err(e) => {
                log::warn!("Failed to erase history '{}': {}", self.key, e);
                self.persist_pending = true;
            }
        }
    }

    fn persist(&mut self) {
        let result = serde_json::to_string(&self.entries)
            .map_err(|e| StorageError::Serialization(e.to_string()))
            .and_then(|json| self.storage.save(&self.key, &json));
        match result {
            Ok(()) => self.persist_pending = false,
            Err(e) => {
                log::warn!(
                    "Failed to persist {} history entries: {}",
                    self.entries.len(),
                    e
                );
                self.persist_pending = true;
            }
        }
    }

    /// Committed snapshots, oldest first.
    pub fn entries(&self) -> &[Snapshot] {
        &self.entries
    }

    /// Undone snapshots, next to redo first.
    pub fn redo_entries(&self) -> impl Iterator<Item = &Snapshot> {
        self.redo.iter()
    }

    /// Most recent committed snapshot.
    pub fn last(&self) -> Option<&Snapshot> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Whether the persisted copy is known to be behind the in-memory state.
    pub fn persist_pending(&self) -> bool {
        self.persist_pending
    }

    /// Key the sequence is persisted under.
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn snap(tag: u8) -> Snapshot {
        Snapshot::from_bytes(vec![tag; 4])
    }

    fn persisted(storage: &MemoryStorage) -> Vec<Snapshot> {
        let json = storage.load(DEFAULT_HISTORY_KEY).unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_commit_appends_and_persists() {
        let storage = Arc::new(MemoryStorage::new());
        let mut history = HistoryStore::new(storage.clone());

        history.commit(snap(1));
        history.commit(snap(2));

        assert_eq!(history.len(), 2);
        assert_eq!(history.last(), Some(&snap(2)));
        assert_eq!(persisted(&storage), vec![snap(1), snap(2)]);
    }

    #[test]
    fn test_undo_redo_scenario() {
        let mut history = HistoryStore::new(MemoryStorage::new());
        history.commit(snap(1));
        history.commit(snap(2));
        history.commit(snap(3));

        assert_eq!(history.undo(), Some(snap(2)));
        assert_eq!(history.redo_entries().cloned().collect::<Vec<_>>(), vec![snap(3)]);

        assert_eq!(history.undo(), Some(snap(1)));
        assert_eq!(
            history.redo_entries().cloned().collect::<Vec<_>>(),
            vec![snap(2), snap(3)]
        );

        assert_eq!(history.redo(), Some(snap(2)));
        assert_eq!(history.redo_entries().cloned().collect::<Vec<_>>(), vec![snap(3)]);
        assert_eq!(history.entries(), &[snap(1), snap(2)]);
    }

    #[test]
    fn test_undo_last_entry_returns_empty_sentinel() {
        let mut history = HistoryStore::new(MemoryStorage::new());
        history.commit(snap(1));

        let shown = history.undo().unwrap();
        assert!(shown.is_empty());
        assert!(history.is_empty());
        assert_eq!(history.redo_len(), 1);
    }

    #[test]
    fn test_undo_redo_on_empty_are_noops() {
        let storage = Arc::new(MemoryStorage::new());
        let mut history = HistoryStore::new(storage.clone());

        assert!(!history.can_undo());
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), None);
        assert!(!storage.exists(DEFAULT_HISTORY_KEY).unwrap());
    }

    #[test]
    fn test_commit_clears_redo() {
        let mut history = HistoryStore::new(MemoryStorage::new());
        history.commit(snap(1));
        history.commit(snap(2));
        history.undo();
        assert!(history.can_redo());

        history.commit(snap(9));
        assert!(!history.can_redo());
        assert_eq!(history.redo(), None);
        assert_eq!(history.entries(), &[snap(1), snap(9)]);
    }

    #[test]
    fn test_undo_persists_shortened_sequence() {
        let storage = Arc::new(MemoryStorage::new());
        let mut history = HistoryStore::new(storage.clone());
        history.commit(snap(1));
        history.commit(snap(2));
        history.undo();

        assert_eq!(persisted(&storage), vec![snap(1)]);
    }

    #[test]
    fn test_restore_drops_redo_buffer() {
        let storage = Arc::new(MemoryStorage::new());
        let mut history = HistoryStore::new(storage.clone());
        history.commit(snap(1));
        history.commit(snap(2));
        history.undo();

        let mut reloaded = HistoryStore::new(storage.clone());
        assert_eq!(reloaded.restore(), &[snap(1)]);
        assert_eq!(reloaded.redo_len(), 0);
    }

    #[test]
    fn test_clear_then_restore_is_empty() {
        let storage = Arc::new(MemoryStorage::new());
        let mut history = HistoryStore::new(storage.clone());
        history.commit(snap(1));
        history.clear();

        assert!(!storage.exists(DEFAULT_HISTORY_KEY).unwrap());
        let mut reloaded = HistoryStore::new(storage);
        assert!(reloaded.restore().is_empty());
    }

    #[test]
    fn test_restore_corrupt_data_is_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.save(DEFAULT_HISTORY_KEY, "{not json").unwrap();

        let mut history = HistoryStore::new(storage);
        assert!(history.restore().is_empty());
    }

    #[test]
    fn test_persistence_failure_is_not_fatal_and_retried_on_next_mutation() {
        let storage = Arc::new(MemoryStorage::with_quota(96));
        let mut history = HistoryStore::new(storage.clone());

        history.commit(snap(1));
        assert!(!history.persist_pending());

        // Large snapshot overflows the quota
        history.commit(Snapshot::from_bytes(vec![7; 200]));
        assert!(history.persist_pending());
        assert_eq!(history.len(), 2);
        assert_eq!(persisted(&storage), vec![snap(1)]);

        // Undo shrinks the sequence so the next write fits again
        assert_eq!(history.undo(), Some(snap(1)));
        assert!(!history.persist_pending());
        assert_eq!(persisted(&storage), vec![snap(1)]);
    }

    #[test]
    fn test_custom_key() {
        let storage = Arc::new(MemoryStorage::new());
        let mut history = HistoryStore::with_key(storage.clone(), "room-42");
        history.commit(snap(1));

        assert_eq!(history.key(), "room-42");
        assert!(storage.exists("room-42").unwrap());
        assert!(!storage.exists(DEFAULT_HISTORY_KEY).unwrap());
    }
}
