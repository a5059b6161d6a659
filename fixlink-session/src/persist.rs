/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Coalesced session record writes.
//!
//! The first save in a quiet period is written immediately. Saves that follow
//! within the window only replace the pending record; the latest one is
//! written once the window has elapsed.

use fixlink_store::{SessionRecord, SessionStore};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// Throttled writer in front of a [`SessionStore`].
pub struct Persister {
    store: Arc<dyn SessionStore>,
    window: Duration,
    last_write: Option<Instant>,
    pending: Option<(String, SessionRecord)>,
}

impl Persister {
    /// Creates a persister writing to `store` at most once per `window`.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, window: Duration) -> Self {
        Self {
            store,
            window,
            last_write: None,
            pending: None,
        }
    }

    /// Records the latest state for `key`, writing it now if the window allows.
    pub fn save(&mut self, key: &str, record: SessionRecord, now: Instant) {
        if self.window_open(now) {
            self.pending = None;
            self.write(key, &record, now);
        } else {
            self.pending = Some((key.to_string(), record));
        }
    }

    /// Writes the pending record if the window has elapsed.
    pub fn flush_due(&mut self, now: Instant) {
        if self.pending.is_some() && self.window_open(now) {
            self.flush_at(now);
        }
    }

    /// Writes the pending record unconditionally.
    pub fn flush(&mut self) {
        self.flush_at(Instant::now());
    }

    /// Returns true if a record is waiting for the window to elapse.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn flush_at(&mut self, now: Instant) {
        if let Some((key, record)) = self.pending.take() {
            self.write(&key, &record, now);
        }
    }

    fn window_open(&self, now: Instant) -> bool {
        self.last_write
            .is_none_or(|last| now.saturating_duration_since(last) >= self.window)
    }

    fn write(&mut self, key: &str, record: &SessionRecord, now: Instant) {
        self.last_write = Some(now);
        if let Err(err) = self.store.set(key, record) {
            warn!(key, error = %err, "failed to persist session record");
        }
    }
}

impl std::fmt::Debug for Persister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persister")
            .field("window", &self.window)
            .field("last_write", &self.last_write)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixlink_store::MemoryStore;

    fn setup() -> (Arc<MemoryStore>, Persister) {
        let store = Arc::new(MemoryStore::new());
        let persister = Persister::new(store.clone(), Duration::from_millis(100));
        (store, persister)
    }

    #[test]
    fn test_first_save_writes_immediately() {
        let (store, mut persister) = setup();
        persister.save("A-B", SessionRecord::new(2, 3), Instant::now());
        assert_eq!(store.get("A-B").unwrap(), Some(SessionRecord::new(2, 3)));
        assert!(!persister.has_pending());
    }

    #[test]
    fn test_saves_within_window_coalesce() {
        let (store, mut persister) = setup();
        let start = Instant::now();
        persister.save("A-B", SessionRecord::new(1, 1), start);
        persister.save("A-B", SessionRecord::new(2, 1), start + Duration::from_millis(10));
        persister.save("A-B", SessionRecord::new(3, 1), start + Duration::from_millis(20));

        assert_eq!(store.get("A-B").unwrap(), Some(SessionRecord::new(1, 1)));
        assert!(persister.has_pending());

        persister.flush_due(start + Duration::from_millis(50));
        assert_eq!(store.get("A-B").unwrap(), Some(SessionRecord::new(1, 1)));

        persister.flush_due(start + Duration::from_millis(100));
        assert_eq!(store.get("A-B").unwrap(), Some(SessionRecord::new(3, 1)));
        assert!(!persister.has_pending());
    }

    #[test]
    fn test_flush_writes_pending() {
        let (store, mut persister) = setup();
        let start = Instant::now();
        persister.save("A-B", SessionRecord::new(1, 1), start);
        persister.save("A-B", SessionRecord::new(9, 9), start);
        persister.flush();
        assert_eq!(store.get("A-B").unwrap(), Some(SessionRecord::new(9, 9)));
    }
}
