/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Logon and logout handshake.

use crate::config::SessionRole;
use crate::events::LogoffEvent;
use crate::session::{Delivery, FixSession};
use bytes::Bytes;
use fixlink_core::error::{DecodeError, Result, SessionError, printable};
use fixlink_core::field::tags;
use fixlink_core::message::{Message, MsgType};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Reason sent with a locally initiated Logout when none is given.
pub const DEFAULT_LOGOUT_REASON: &str = "Graceful close";

/// Decides whether an inbound Logon may open a session.
pub trait Authenticator: Send + Sync {
    /// Returns true to accept `logon` arriving from `remote`.
    fn is_authentic(&self, logon: &Message, remote: Option<SocketAddr>) -> bool;
}

impl<F> Authenticator for F
where
    F: Fn(&Message, Option<SocketAddr>) -> bool + Send + Sync,
{
    fn is_authentic(&self, logon: &Message, remote: Option<SocketAddr>) -> bool {
        self(logon, remote)
    }
}

/// Authenticator that accepts every Logon.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl Authenticator for AcceptAll {
    fn is_authentic(&self, _logon: &Message, _remote: Option<SocketAddr>) -> bool {
        true
    }
}

/// Reports whether a counterparty pair already has an active session.
///
/// Called with the local CompID first, as `is_duplicate(sender, target)`.
pub trait DuplicateDetector: Send + Sync {
    /// Returns true if `sender-target` is already logged in.
    fn is_duplicate(&self, sender_comp_id: &str, target_comp_id: &str) -> bool;
}

impl<F> DuplicateDetector for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn is_duplicate(&self, sender_comp_id: &str, target_comp_id: &str) -> bool {
        self(sender_comp_id, target_comp_id)
    }
}

impl FixSession {
    /// Starts the session from the initiator side.
    ///
    /// Loads (or resets) the session record and sends `message`, or a default
    /// Logon with EncryptMethod 0 and the configured heartbeat interval.
    ///
    /// # Errors
    /// Returns `FixError::Store` if the record cannot be loaded and any error
    /// from [`FixSession::send`].
    pub fn logon(&mut self, message: Option<Message>) -> Result<Bytes> {
        self.record = self.load_record()?;
        self.logout_requested = false;
        let logon = message.unwrap_or_else(|| {
            Message::of_type(MsgType::Logon)
                .with(tags::ENCRYPT_METHOD, 0)
                .with(tags::HEART_BT_INT, self.config.default_heartbeat_secs())
        });
        info!(
            key = %self.key,
            incoming = self.record.incoming_seq_num,
            outgoing = self.record.outgoing_seq_num,
            "sending logon"
        );
        self.send(&logon, Delivery::Live)
    }

    /// Sends a Logout and marks the session as logging out.
    ///
    /// The Logout carries `reason` (or [`DEFAULT_LOGOUT_REASON`]) and the next
    /// expected inbound sequence number.
    ///
    /// # Errors
    /// Returns any error from [`FixSession::send`]. The session is marked as
    /// logging out either way.
    pub fn logoff(&mut self, reason: Option<&str>) -> Result<Bytes> {
        let reason = reason.unwrap_or(DEFAULT_LOGOUT_REASON);
        let logout = Message::of_type(MsgType::Logout)
            .with(tags::TEXT, reason)
            .with(tags::NEXT_EXPECTED_MSG_SEQ_NUM, self.record.incoming_seq_num);
        info!(key = %self.key, reason, "sending logout");

        let sent = self.send(&logout, Delivery::Live);
        self.record.is_logged_in = false;
        self.logout_requested = true;
        self.registry.update(&self.key, self.record);
        self.persist(Instant::now());
        sent
    }

    /// Admits an inbound Logon while the session is not yet logged in.
    pub(crate) fn accept_logon(&mut self, logon: &Message, raw: &[u8], now: Instant) -> Result<()> {
        if self.config.role == SessionRole::Acceptor {
            self.adopt_identity(logon)?;

            if self
                .duplicates
                .is_duplicate(&self.sender_comp_id, &self.target_comp_id)
            {
                warn!(key = %self.key, "rejecting duplicate logon");
                return Err(SessionError::AlreadyLoggedIn {
                    key: self.key.clone(),
                    raw: printable(raw),
                }
                .into());
            }
            if !self
                .authenticator
                .is_authentic(logon, self.transport.remote_addr())
            {
                warn!(key = %self.key, "rejecting unauthenticated logon");
                return Err(SessionError::NotAuthentic {
                    raw: printable(raw),
                }
                .into());
            }

            self.record = self.load_record()?;
        }

        let interval = self.negotiated_heartbeat(logon);
        self.heartbeat.start(interval, now);
        self.record.is_logged_in = true;
        self.registry.update(&self.key, self.record);
        info!(
            key = %self.key,
            heartbeat_secs = interval.as_secs(),
            incoming = self.record.incoming_seq_num,
            outgoing = self.record.outgoing_seq_num,
            "logon accepted"
        );
        self.listener.on_logon(&self.target_comp_id);

        if self.config.role == SessionRole::Acceptor && self.config.respond_to_logon {
            self.send(logon, Delivery::Live)?;
        }
        Ok(())
    }

    /// Handles an inbound Logout: echoes it unless we asked for it, then
    /// schedules the disconnect.
    pub(crate) fn on_logout(&mut self, logout: &Message) {
        if !self.logout_requested {
            if let Err(err) = self.send(logout, Delivery::Live) {
                warn!(key = %self.key, error = %err, "failed to echo logout");
            }
            match logout.get_opt_as::<u64>(tags::NEXT_EXPECTED_MSG_SEQ_NUM) {
                Ok(Some(next)) => self.record.outgoing_seq_num = next,
                Ok(None) => {}
                Err(err) => warn!(key = %self.key, error = %err, "ignoring NextExpectedMsgSeqNum"),
            }
        }

        self.disconnect_pending = true;
        self.record.is_logged_in = false;
        self.registry.update(&self.key, self.record);

        let event = LogoffEvent {
            sender_comp_id: self.sender_comp_id.clone(),
            target_comp_id: self.target_comp_id.clone(),
            reason: logout.get(tags::TEXT).map(str::to_string),
        };
        info!(key = %self.key, reason = ?event.reason, "logout received");
        self.listener.on_logoff(&event);
    }

    /// Takes the acceptor's identity from the inbound Logon, seen from our side.
    fn adopt_identity(&mut self, logon: &Message) -> Result<()> {
        let sender = logon
            .get(tags::TARGET_COMP_ID)
            .ok_or(DecodeError::MissingRequiredField {
                tag: tags::TARGET_COMP_ID,
            })?;
        let target = logon
            .get(tags::SENDER_COMP_ID)
            .ok_or(DecodeError::MissingRequiredField {
                tag: tags::SENDER_COMP_ID,
            })?;

        if let Some(begin_string) = logon.get(tags::BEGIN_STRING) {
            self.begin_string = begin_string.to_string();
        }
        self.sender_comp_id = sender.to_string();
        self.target_comp_id = target.to_string();
        self.sender_sub_id = logon.get(tags::TARGET_SUB_ID).map(str::to_string);
        self.target_sub_id = logon.get(tags::SENDER_SUB_ID).map(str::to_string);
        self.key = format!("{}-{}", self.sender_comp_id, self.target_comp_id);
        Ok(())
    }

    fn negotiated_heartbeat(&self, logon: &Message) -> Duration {
        match logon.get_opt_as::<u64>(tags::HEART_BT_INT) {
            Ok(Some(secs)) if secs > 0 => Duration::from_secs(secs),
            Ok(_) => self.config.default_heartbeat,
            Err(err) => {
                warn!(key = %self.key, error = %err, "using default heartbeat interval");
                self.config.default_heartbeat
            }
        }
    }
}
