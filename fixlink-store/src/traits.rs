/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Storage traits consumed by the session layer.
//!
//! Both traits are synchronous: a session calls them from its own task and
//! implementations are expected to be quick (in-memory maps, small files).

use crate::record::SessionRecord;
use bytes::Bytes;
use fixlink_core::error::StoreError;

/// Lazily produced log entries, oldest first.
pub type LogEntries<'a> = Box<dyn Iterator<Item = Result<Bytes, StoreError>> + Send + 'a>;

/// Key/value store for [`SessionRecord`]s.
///
/// Keys are `"<SenderCompID>-<TargetCompID>"` from the local point of view.
pub trait SessionStore: Send + Sync {
    /// Loads the record stored under `key`.
    ///
    /// # Errors
    /// Returns `StoreError` if the backing storage cannot be read or holds a
    /// corrupted record.
    fn get(&self, key: &str) -> Result<Option<SessionRecord>, StoreError>;

    /// Stores `record` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns `StoreError` if the record cannot be written.
    fn set(&self, key: &str, record: &SessionRecord) -> Result<(), StoreError>;
}

/// Append-only log of raw outbound messages, one entry per live send.
pub trait MessageLog: Send + Sync {
    /// Appends one raw message to the log under `key`.
    ///
    /// # Errors
    /// Returns `StoreError` if the entry cannot be written.
    fn append(&self, key: &str, raw: &[u8]) -> Result<(), StoreError>;

    /// Streams every entry logged under `key` in append order.
    ///
    /// A key with no log yields an empty iterator.
    ///
    /// # Errors
    /// Returns `StoreError` if the log exists but cannot be opened.
    fn entries(&self, key: &str) -> Result<LogEntries<'_>, StoreError>;

    /// Discards the log under `key`. Missing logs are ignored.
    ///
    /// # Errors
    /// Returns `StoreError` if an existing log cannot be removed.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Releases any handle held for `key`. Entries stay readable.
    fn close(&self, _key: &str) {}
}
