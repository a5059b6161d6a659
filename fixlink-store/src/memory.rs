/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! In-memory store and message log.
//!
//! Nothing here survives the process. Suitable for tests and for sessions
//! that reset sequence numbers on every connection anyway.

use crate::record::SessionRecord;
use crate::traits::{LogEntries, MessageLog, SessionStore};
use bytes::Bytes;
use fixlink_core::error::StoreError;
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory [`SessionStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, SessionRecord>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if no record has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.records.read().get(key).copied())
    }

    fn set(&self, key: &str, record: &SessionRecord) -> Result<(), StoreError> {
        self.records.write().insert(key.to_string(), *record);
        Ok(())
    }
}

/// In-memory [`MessageLog`].
#[derive(Debug, Default)]
pub struct MemoryMessageLog {
    logs: RwLock<HashMap<String, Vec<Bytes>>>,
}

impl MemoryMessageLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries logged under `key`.
    #[must_use]
    pub fn entry_count(&self, key: &str) -> usize {
        self.logs.read().get(key).map_or(0, Vec::len)
    }
}

impl MessageLog for MemoryMessageLog {
    fn append(&self, key: &str, raw: &[u8]) -> Result<(), StoreError> {
        self.logs
            .write()
            .entry(key.to_string())
            .or_default()
            .push(Bytes::copy_from_slice(raw));
        Ok(())
    }

    fn entries(&self, key: &str) -> Result<LogEntries<'_>, StoreError> {
        // Bytes clones are refcount bumps; the snapshot keeps the lock short.
        let snapshot = self.logs.read().get(key).cloned().unwrap_or_default();
        Ok(Box::new(snapshot.into_iter().map(Ok)))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.logs.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_get_set() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("A-B").unwrap(), None);

        let record = SessionRecord::new(3, 7);
        store.set("A-B", &record).unwrap();
        assert_eq!(store.get("A-B").unwrap(), Some(record));
        assert_eq!(store.get("B-A").unwrap(), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_memory_log_keeps_order_per_key() {
        let log = MemoryMessageLog::new();
        log.append("A-B", b"first").unwrap();
        log.append("A-C", b"other").unwrap();
        log.append("A-B", b"second").unwrap();

        let entries: Vec<Bytes> = log
            .entries("A-B")
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(entries, vec![Bytes::from("first"), Bytes::from("second")]);
        assert_eq!(log.entry_count("A-C"), 1);
    }

    #[test]
    fn test_memory_log_remove() {
        let log = MemoryMessageLog::new();
        log.append("A-B", b"x").unwrap();
        log.remove("A-B").unwrap();
        log.remove("missing").unwrap();
        assert_eq!(log.entries("A-B").unwrap().count(), 0);
    }
}
