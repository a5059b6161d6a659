/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Process-wide registry of active sessions.
//!
//! Sessions publish their record here at logon, logoff and disconnect. The
//! only reader is duplicate-logon detection.

use crate::handshake::DuplicateDetector;
use fixlink_store::SessionRecord;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

static GLOBAL: LazyLock<SessionRegistry> = LazyLock::new(SessionRegistry::new);

/// Shared map from `sender-target` key to the latest published record.
///
/// Cloning is cheap and every clone sees the same entries.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<String, SessionRecord>>>,
}

impl SessionRegistry {
    /// Creates an empty, private registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the registry shared by every session in the process.
    #[must_use]
    pub fn global() -> Self {
        GLOBAL.clone()
    }

    /// Publishes the current record for `key`.
    pub fn update(&self, key: &str, record: SessionRecord) {
        self.sessions.lock().insert(key.to_string(), record);
    }

    /// Returns the last published record for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<SessionRecord> {
        self.sessions.lock().get(key).copied()
    }

    /// Returns true if `key` is currently published as logged in.
    #[must_use]
    pub fn is_logged_in(&self, key: &str) -> bool {
        self.sessions
            .lock()
            .get(key)
            .is_some_and(|record| record.is_logged_in)
    }
}

impl DuplicateDetector for SessionRegistry {
    fn is_duplicate(&self, sender_comp_id: &str, target_comp_id: &str) -> bool {
        self.is_logged_in(&format!("{sender_comp_id}-{target_comp_id}"))
    }
}
