/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Persisted session state.

use serde::{Deserialize, Serialize};

/// Sequence and login state of one counterparty pair.
///
/// This is the unit a [`SessionStore`](crate::SessionStore) persists, stored
/// with camelCase keys: `{"incomingSeqNum":1,"outgoingSeqNum":1,"isLoggedIn":false}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Next expected inbound sequence number.
    pub incoming_seq_num: u64,
    /// Next outbound sequence number.
    pub outgoing_seq_num: u64,
    /// True between an accepted Logon and a Logout or disconnect.
    #[serde(default)]
    pub is_logged_in: bool,
}

impl SessionRecord {
    /// Creates a record with explicit counters, logged out.
    #[must_use]
    pub const fn new(incoming_seq_num: u64, outgoing_seq_num: u64) -> Self {
        Self {
            incoming_seq_num,
            outgoing_seq_num,
            is_logged_in: false,
        }
    }
}

impl Default for SessionRecord {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// Operator overrides applied by a session reset.
///
/// Unset fields keep the persisted value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionReset {
    /// New next expected inbound sequence number.
    pub incoming_seq_num: Option<u64>,
    /// New next outbound sequence number. Setting it discards the message log.
    pub outgoing_seq_num: Option<u64>,
}
