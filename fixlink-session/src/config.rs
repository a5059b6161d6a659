/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Which side of the connection this session plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionRole {
    /// Waits for the counterparty's Logon and learns its identity from it.
    #[default]
    Acceptor,
    /// Sends the first Logon with a preconfigured identity.
    Initiator,
}

/// Configuration for a FIX session.
///
/// For acceptors the CompIDs, sub-IDs and BeginString are placeholders until
/// the inbound Logon supplies them.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Acceptor or initiator.
    pub role: SessionRole,
    /// FIX version BeginString (e.g., "FIX.4.4").
    pub begin_string: String,
    /// Sender CompID (tag 49).
    pub sender_comp_id: String,
    /// Target CompID (tag 56).
    pub target_comp_id: String,
    /// Optional sender sub ID (tag 50).
    pub sender_sub_id: Option<String>,
    /// Optional target sub ID (tag 57).
    pub target_sub_id: Option<String>,
    /// Optional sender location ID (tag 142).
    pub sender_location_id: Option<String>,
    /// Optional application version (tag 1128).
    pub app_ver_id: Option<String>,
    /// Start every connection from sequence numbers 1/1 and a fresh log.
    pub reset_seq_num_on_reconnect: bool,
    /// Heartbeat interval used when the Logon carries none.
    pub default_heartbeat: Duration,
    /// Send Heartbeats when the outbound side is idle.
    pub send_heartbeats: bool,
    /// Send TestRequests and report timeouts when the inbound side is idle.
    pub expect_heartbeats: bool,
    /// Echo an accepted Logon back to the counterparty.
    pub respond_to_logon: bool,
    /// Coalescing window for session record writes.
    pub persist_interval: Duration,
    /// Directory for file-backed records and message logs.
    pub storage_dir: PathBuf,
}

impl SessionConfig {
    /// Creates a configuration with the given identity and defaults for the rest.
    #[must_use]
    pub fn new(
        sender_comp_id: impl Into<String>,
        target_comp_id: impl Into<String>,
        begin_string: impl Into<String>,
    ) -> Self {
        Self {
            role: SessionRole::Acceptor,
            begin_string: begin_string.into(),
            sender_comp_id: sender_comp_id.into(),
            target_comp_id: target_comp_id.into(),
            sender_sub_id: None,
            target_sub_id: None,
            sender_location_id: None,
            app_ver_id: None,
            reset_seq_num_on_reconnect: true,
            default_heartbeat: Duration::from_secs(10),
            send_heartbeats: true,
            expect_heartbeats: true,
            respond_to_logon: true,
            persist_interval: Duration::from_millis(100),
            storage_dir: PathBuf::from("./storage"),
        }
    }

    /// Creates an acceptor configuration. Identity comes from the inbound Logon.
    #[must_use]
    pub fn acceptor() -> Self {
        Self::new("", "", "FIX.4.4")
    }

    /// Creates an initiator configuration.
    #[must_use]
    pub fn initiator(
        sender_comp_id: impl Into<String>,
        target_comp_id: impl Into<String>,
        begin_string: impl Into<String>,
    ) -> Self {
        Self::new(sender_comp_id, target_comp_id, begin_string).with_role(SessionRole::Initiator)
    }

    /// Sets the role.
    #[must_use]
    pub const fn with_role(mut self, role: SessionRole) -> Self {
        self.role = role;
        self
    }

    /// Sets the sender sub ID.
    #[must_use]
    pub fn with_sender_sub_id(mut self, sub_id: impl Into<String>) -> Self {
        self.sender_sub_id = Some(sub_id.into());
        self
    }

    /// Sets the target sub ID.
    #[must_use]
    pub fn with_target_sub_id(mut self, sub_id: impl Into<String>) -> Self {
        self.target_sub_id = Some(sub_id.into());
        self
    }

    /// Sets the sender location ID.
    #[must_use]
    pub fn with_sender_location_id(mut self, location: impl Into<String>) -> Self {
        self.sender_location_id = Some(location.into());
        self
    }

    /// Sets the application version ID.
    #[must_use]
    pub fn with_app_ver_id(mut self, version: impl Into<String>) -> Self {
        self.app_ver_id = Some(version.into());
        self
    }

    /// Sets whether sequence numbers reset on every (re)connect.
    #[must_use]
    pub const fn with_reset_seq_num_on_reconnect(mut self, reset: bool) -> Self {
        self.reset_seq_num_on_reconnect = reset;
        self
    }

    /// Sets the fallback heartbeat interval.
    #[must_use]
    pub const fn with_default_heartbeat(mut self, interval: Duration) -> Self {
        self.default_heartbeat = interval;
        self
    }

    /// Sets whether idle-outbound Heartbeats are sent.
    #[must_use]
    pub const fn with_send_heartbeats(mut self, send: bool) -> Self {
        self.send_heartbeats = send;
        self
    }

    /// Sets whether inbound silence is supervised.
    #[must_use]
    pub const fn with_expect_heartbeats(mut self, expect: bool) -> Self {
        self.expect_heartbeats = expect;
        self
    }

    /// Sets whether an accepted Logon is echoed.
    #[must_use]
    pub const fn with_respond_to_logon(mut self, respond: bool) -> Self {
        self.respond_to_logon = respond;
        self
    }

    /// Sets the persistence coalescing window.
    #[must_use]
    pub const fn with_persist_interval(mut self, interval: Duration) -> Self {
        self.persist_interval = interval;
        self
    }

    /// Sets the storage directory.
    #[must_use]
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    /// Returns the fallback heartbeat interval in whole seconds.
    #[must_use]
    pub fn default_heartbeat_secs(&self) -> u64 {
        self.default_heartbeat.as_secs()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::acceptor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_defaults() {
        let config = SessionConfig::new("SENDER", "TARGET", "FIX.4.4");

        assert_eq!(config.role, SessionRole::Acceptor);
        assert_eq!(config.sender_comp_id, "SENDER");
        assert_eq!(config.target_comp_id, "TARGET");
        assert!(config.reset_seq_num_on_reconnect);
        assert_eq!(config.default_heartbeat_secs(), 10);
        assert!(config.send_heartbeats && config.expect_heartbeats && config.respond_to_logon);
        assert_eq!(config.persist_interval, Duration::from_millis(100));
        assert_eq!(config.storage_dir, PathBuf::from("./storage"));
    }

    #[test]
    fn test_session_config_with_methods() {
        let config = SessionConfig::initiator("CLIENT", "SERVER", "FIX.4.2")
            .with_sender_sub_id("DESK")
            .with_app_ver_id("9")
            .with_reset_seq_num_on_reconnect(false)
            .with_default_heartbeat(Duration::from_secs(30))
            .with_expect_heartbeats(false);

        assert_eq!(config.role, SessionRole::Initiator);
        assert_eq!(config.begin_string, "FIX.4.2");
        assert_eq!(config.sender_sub_id.as_deref(), Some("DESK"));
        assert_eq!(config.app_ver_id.as_deref(), Some("9"));
        assert!(!config.reset_seq_num_on_reconnect);
        assert_eq!(config.default_heartbeat_secs(), 30);
        assert!(!config.expect_heartbeats);
    }
}
