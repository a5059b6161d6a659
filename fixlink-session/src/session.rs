/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! The session state machine and its message dispatcher.
//!
//! A [`FixSession`] is owned by exactly one task. Every entry point takes
//! `&mut self`, so inbound frames, timer ticks and caller commands for one
//! session are serialized by construction.

use crate::config::{SessionConfig, SessionRole};
use crate::events::{NoopListener, SessionListener};
use crate::handshake::{AcceptAll, Authenticator, DuplicateDetector};
use crate::heartbeat::HeartbeatSupervisor;
use crate::persist::Persister;
use crate::registry::SessionRegistry;
use crate::resend::ResendTracker;
use crate::transport::Transport;
use bytes::Bytes;
use fixlink_core::error::{DecodeError, Result, SessionError, StoreError, printable};
use fixlink_core::field::tags;
use fixlink_core::message::{Message, MsgType};
use fixlink_core::types::Timestamp;
use fixlink_store::{
    FileMessageLog, FileStore, MemoryMessageLog, MemoryStore, MessageLog, SessionRecord,
    SessionReset, SessionStore,
};
use fixlink_tagvalue::{Header, MessageCodec, TagValueCodec};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How [`FixSession::send`] treats a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// New traffic: takes the next outgoing sequence number, is logged and
    /// persisted.
    Live,
    /// Retransmission of logged history: keeps its own MsgSeqNum and leaves
    /// counters and log untouched.
    Replay,
}

/// One FIX session between a local and a remote CompID.
pub struct FixSession {
    pub(crate) config: SessionConfig,
    pub(crate) begin_string: String,
    pub(crate) sender_comp_id: String,
    pub(crate) target_comp_id: String,
    pub(crate) sender_sub_id: Option<String>,
    pub(crate) target_sub_id: Option<String>,
    pub(crate) key: String,
    pub(crate) record: SessionRecord,
    pub(crate) logout_requested: bool,
    pub(crate) disconnect_pending: bool,
    pub(crate) resend: ResendTracker,
    pub(crate) heartbeat: HeartbeatSupervisor,
    pub(crate) persister: Persister,
    pub(crate) store: Arc<dyn SessionStore>,
    pub(crate) log: Arc<dyn MessageLog>,
    pub(crate) codec: Arc<dyn MessageCodec>,
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) listener: Box<dyn SessionListener>,
    pub(crate) registry: SessionRegistry,
    pub(crate) authenticator: Arc<dyn Authenticator>,
    pub(crate) duplicates: Arc<dyn DuplicateDetector>,
}

impl FixSession {
    /// Returns a builder for a session with the given configuration.
    #[must_use]
    pub fn builder(config: SessionConfig) -> SessionBuilder {
        SessionBuilder::new(config)
    }

    /// Processes one complete inbound frame.
    ///
    /// Runs the logon gate, the sequence checks and the administrative
    /// handlers, persists the session record and returns the parsed message.
    ///
    /// # Errors
    /// Returns `FixError::Decode` for malformed frames and `FixError::Session`
    /// for protocol violations. Both end the exchange.
    pub fn decode(&mut self, raw: &[u8]) -> Result<Message> {
        let now = Instant::now();
        self.heartbeat.on_inbound(now);

        let message = self.codec.decode(raw)?;
        let msg_type = message.msg_type()?;
        debug!(key = %self.key, %msg_type, "inbound {}", message);

        let seq_num = message.seq_num()?;
        if seq_num == u64::MAX {
            return Err(DecodeError::InvalidFieldValue {
                tag: tags::MSG_SEQ_NUM,
                reason: format!("sequence number {seq_num} out of range"),
            }
            .into());
        }

        if !self.record.is_logged_in && !self.logout_requested {
            match msg_type {
                MsgType::Logon => self.accept_logon(&message, raw, now)?,
                MsgType::Logout if self.key.is_empty() => {
                    debug!("logout before logon, closing");
                    self.disconnect_pending = true;
                    return Ok(message);
                }
                MsgType::Logout => {}
                _ => {
                    return Err(SessionError::FirstMessageNotLogon {
                        raw: printable(raw),
                    }
                    .into());
                }
            }
        }

        self.check_sequence(&msg_type, seq_num, &message, raw)?;

        match msg_type {
            MsgType::TestRequest => {
                let mut heartbeat = Message::of_type(MsgType::Heartbeat);
                if let Some(id) = message.get(tags::TEST_REQ_ID) {
                    heartbeat.set(tags::TEST_REQ_ID, id);
                }
                self.send(&heartbeat, Delivery::Live)?;
            }
            MsgType::ResendRequest => {
                let begin = message.get_opt_as::<u64>(tags::BEGIN_SEQ_NO)?;
                let end = message
                    .get_opt_as::<u64>(tags::END_SEQ_NO)?
                    .filter(|&end| end != 0);
                self.resend_messages(begin, end)?;
            }
            MsgType::SequenceReset => self.on_sequence_reset(&message, raw)?,
            MsgType::Logout => self.on_logout(&message),
            _ => {}
        }

        self.persist(now);
        Ok(message)
    }

    /// Stamps, encodes and writes one outbound message.
    ///
    /// Returns the encoded frame.
    ///
    /// # Errors
    /// Returns `FixError::Encode` if the message has no MsgType (or, for a
    /// replay, no MsgSeqNum) and `FixError::Io` if the transport is gone.
    pub fn send(&mut self, message: &Message, delivery: Delivery) -> Result<Bytes> {
        let mut message = message.clone();
        let msg_seq_num = match delivery {
            Delivery::Live => {
                message.set(
                    tags::LAST_MSG_SEQ_NUM_PROCESSED,
                    self.record.incoming_seq_num.saturating_sub(1),
                );
                self.record.outgoing_seq_num
            }
            Delivery::Replay => message.seq_num()?,
        };

        let header = Header {
            begin_string: &self.begin_string,
            sender_comp_id: &self.sender_comp_id,
            target_comp_id: &self.target_comp_id,
            msg_seq_num,
            sending_time: Timestamp::now(),
            sender_sub_id: self.sender_sub_id.as_deref(),
            target_sub_id: self.target_sub_id.as_deref(),
            sender_location_id: self.config.sender_location_id.as_deref(),
            appl_ver_id: self.config.app_ver_id.as_deref(),
        };
        self.listener.on_data_out(&message);
        let raw = self.codec.encode(&message, &header)?;
        self.listener.on_fix_out(&raw);
        debug!(key = %self.key, ?delivery, "outbound {}", printable(&raw));
        self.transport.write(&raw)?;

        if delivery == Delivery::Live {
            let now = Instant::now();
            self.heartbeat.on_outbound(now);
            self.record.outgoing_seq_num += 1;
            if let Err(err) = self.log.append(&self.key, &raw) {
                warn!(key = %self.key, error = %err, "failed to log outbound message");
                self.transport.report_error(err.into());
            }
            self.persist(now);
        }

        Ok(raw)
    }

    /// Replaces the session record with the stored one plus `reset` overrides.
    ///
    /// The record comes back logged out. Overriding the outgoing sequence
    /// number also discards the message log.
    ///
    /// # Errors
    /// Returns `FixError::Store` if the stored record cannot be read.
    pub fn reset_session(&mut self, reset: SessionReset) -> Result<SessionRecord> {
        self.persister.flush();
        let mut record = self.store.get(&self.key)?.unwrap_or_default();
        if let Some(incoming) = reset.incoming_seq_num {
            record.incoming_seq_num = incoming;
        }
        record.is_logged_in = false;
        if let Some(outgoing) = reset.outgoing_seq_num {
            record.outgoing_seq_num = outgoing;
            self.discard_log();
        }

        info!(
            key = %self.key,
            incoming = record.incoming_seq_num,
            outgoing = record.outgoing_seq_num,
            "session reset"
        );
        self.record = record;
        self.registry.update(&self.key, record);
        self.persister.save(&self.key, record, Instant::now());
        self.persister.flush();
        Ok(record)
    }

    /// Destroys the transport if a Logout asked for a disconnect.
    ///
    /// Callers invoke this after the event that may have requested it, so
    /// frames written during that event are queued before the close.
    pub fn take_disconnect(&mut self) -> bool {
        if !self.disconnect_pending {
            return false;
        }
        self.disconnect_pending = false;
        self.transport.destroy();
        true
    }

    /// Tears down timers and publishes the logged-out state after the
    /// connection closed.
    pub fn on_transport_closed(&mut self) {
        self.heartbeat.stop();
        if self.record.is_logged_in {
            self.record.is_logged_in = false;
            self.registry.update(&self.key, self.record);
            self.persister.save(&self.key, self.record, Instant::now());
        }
        self.log.close(&self.key);
        self.persister.flush();
        info!(key = %self.key, "session closed");
    }

    /// Writes a coalesced record whose window has elapsed.
    pub fn flush_persistence(&mut self, now: Instant) {
        self.persister.flush_due(now);
    }

    /// Returns the heartbeat timer period, once a Logon has negotiated one.
    #[must_use]
    pub fn heartbeat_tick_period(&self) -> Option<Duration> {
        self.heartbeat.tick_period()
    }

    /// Returns the current session record.
    #[must_use]
    pub fn record(&self) -> SessionRecord {
        self.record
    }

    /// Returns the `sender-target` key of this session.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the local CompID.
    #[must_use]
    pub fn sender_comp_id(&self) -> &str {
        &self.sender_comp_id
    }

    /// Returns the counterparty CompID.
    #[must_use]
    pub fn target_comp_id(&self) -> &str {
        &self.target_comp_id
    }

    /// Returns true while logged in.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.record.is_logged_in
    }

    /// Returns true once a local Logout has been sent.
    #[must_use]
    pub fn is_logout_requested(&self) -> bool {
        self.logout_requested
    }

    /// Returns the inbound resend state.
    #[must_use]
    pub fn resend_state(&self) -> ResendTracker {
        self.resend
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub(crate) fn persist(&mut self, now: Instant) {
        self.persister.save(&self.key, self.record, now);
    }

    pub(crate) fn discard_log(&mut self) {
        if let Err(err) = self.log.remove(&self.key) {
            warn!(key = %self.key, error = %err, "failed to remove message log");
        }
    }

    /// Loads the record for the current key, or starts fresh when configured
    /// to reset on every connection.
    pub(crate) fn load_record(&mut self) -> std::result::Result<SessionRecord, StoreError> {
        if self.config.reset_seq_num_on_reconnect {
            self.discard_log();
            return Ok(SessionRecord::default());
        }
        self.persister.flush();
        let record = self.store.get(&self.key)?.unwrap_or_default();
        Ok(SessionRecord {
            is_logged_in: false,
            ..record
        })
    }
}

impl std::fmt::Debug for FixSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixSession")
            .field("key", &self.key)
            .field("role", &self.config.role)
            .field("record", &self.record)
            .field("logout_requested", &self.logout_requested)
            .field("resend", &self.resend)
            .field("heartbeat", &self.heartbeat)
            .finish_non_exhaustive()
    }
}

/// Assembles a [`FixSession`] from a configuration and its collaborators.
///
/// Unset collaborators default to in-memory storage, the tag=value codec, a
/// listener that ignores events, the process-wide registry and an
/// authenticator that accepts every Logon.
pub struct SessionBuilder {
    config: SessionConfig,
    store: Option<Arc<dyn SessionStore>>,
    log: Option<Arc<dyn MessageLog>>,
    codec: Option<Arc<dyn MessageCodec>>,
    listener: Option<Box<dyn SessionListener>>,
    registry: Option<SessionRegistry>,
    authenticator: Option<Arc<dyn Authenticator>>,
    duplicates: Option<Arc<dyn DuplicateDetector>>,
}

impl SessionBuilder {
    /// Creates a builder for the given configuration.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            store: None,
            log: None,
            codec: None,
            listener: None,
            registry: None,
            authenticator: None,
            duplicates: None,
        }
    }

    /// Uses `store` for session records.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Uses `log` for outbound history.
    #[must_use]
    pub fn message_log(mut self, log: Arc<dyn MessageLog>) -> Self {
        self.log = Some(log);
        self
    }

    /// Uses file-backed storage under the configured storage directory.
    ///
    /// # Errors
    /// Returns `StoreError::Io` if the directory cannot be created.
    pub fn file_storage(self) -> std::result::Result<Self, StoreError> {
        let store = FileStore::open(&self.config.storage_dir)?;
        let log = FileMessageLog::open(&self.config.storage_dir)?;
        Ok(self.store(Arc::new(store)).message_log(Arc::new(log)))
    }

    /// Uses `codec` for encoding and decoding.
    #[must_use]
    pub fn codec(mut self, codec: Arc<dyn MessageCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Notifies `listener` of session events.
    #[must_use]
    pub fn listener(mut self, listener: impl SessionListener + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Publishes logon state to `registry` instead of the global one.
    #[must_use]
    pub fn registry(mut self, registry: SessionRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Checks inbound Logons with `authenticator`.
    #[must_use]
    pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Rejects Logons for which `duplicates` reports an active session.
    #[must_use]
    pub fn duplicate_detector(mut self, duplicates: Arc<dyn DuplicateDetector>) -> Self {
        self.duplicates = Some(duplicates);
        self
    }

    /// Builds the session on top of `transport`.
    #[must_use]
    pub fn build(self, transport: Box<dyn Transport>) -> FixSession {
        let config = self.config;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn SessionStore>);
        let log = self
            .log
            .unwrap_or_else(|| Arc::new(MemoryMessageLog::new()) as Arc<dyn MessageLog>);
        let registry = self.registry.unwrap_or_else(SessionRegistry::global);
        let duplicates = self
            .duplicates
            .unwrap_or_else(|| Arc::new(registry.clone()) as Arc<dyn DuplicateDetector>);
        let key = match config.role {
            SessionRole::Initiator => {
                format!("{}-{}", config.sender_comp_id, config.target_comp_id)
            }
            SessionRole::Acceptor => String::new(),
        };

        FixSession {
            begin_string: config.begin_string.clone(),
            sender_comp_id: config.sender_comp_id.clone(),
            target_comp_id: config.target_comp_id.clone(),
            sender_sub_id: config.sender_sub_id.clone(),
            target_sub_id: config.target_sub_id.clone(),
            key,
            record: SessionRecord::default(),
            logout_requested: false,
            disconnect_pending: false,
            resend: ResendTracker::default(),
            heartbeat: HeartbeatSupervisor::new(config.send_heartbeats, config.expect_heartbeats),
            persister: Persister::new(store.clone(), config.persist_interval),
            store,
            log,
            codec: self
                .codec
                .unwrap_or_else(|| Arc::new(TagValueCodec::new()) as Arc<dyn MessageCodec>),
            transport,
            listener: self
                .listener
                .unwrap_or_else(|| Box::new(NoopListener) as Box<dyn SessionListener>),
            registry,
            authenticator: self
                .authenticator
                .unwrap_or_else(|| Arc::new(AcceptAll) as Arc<dyn Authenticator>),
            duplicates,
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SessionEvent;
    use crate::testkit::{Harness, app, inbound, logon};
    use fixlink_core::error::FixError;

    #[test]
    fn test_in_order_messages_advance_incoming() {
        let mut h = Harness::logged_on_acceptor();
        for seq in 2..=20 {
            h.session.decode(&app(seq)).unwrap();
            assert_eq!(h.session.record().incoming_seq_num, seq + 1);
        }
    }

    #[test]
    fn test_first_message_must_be_logon() {
        let mut h = Harness::new(SessionConfig::acceptor());
        let result = h.session.decode(&app(1));
        assert!(matches!(
            result,
            Err(FixError::Session(SessionError::FirstMessageNotLogon { raw })) if raw.contains("35=D|")
        ));
        assert!(h.transport.take_sent().is_empty());
    }

    #[test]
    fn test_logout_accepted_before_logon() {
        let mut h = Harness::new(SessionConfig::acceptor());
        let msg = h
            .session
            .decode(&inbound(Message::of_type(MsgType::Logout), 1))
            .unwrap();
        assert_eq!(msg.msg_type().unwrap(), MsgType::Logout);
        assert!(h.transport.take_sent().is_empty());
        assert_eq!(h.log.entry_count(""), 0);
        assert_eq!(h.store.get("").unwrap(), None);
        assert_eq!(h.registry.get(""), None);
        assert!(h.session.take_disconnect());
        assert!(h.transport.destroyed());
    }

    #[test]
    fn test_decode_rejects_exhausted_sequence_number() {
        let mut h = Harness::logged_on_acceptor();
        let incoming = h.session.record().incoming_seq_num;

        let result = h.session.decode(&app(u64::MAX));
        assert!(matches!(
            result,
            Err(FixError::Decode(DecodeError::InvalidFieldValue { tag: 34, .. }))
        ));
        assert_eq!(h.session.record().incoming_seq_num, incoming);
        assert!(h.transport.take_sent().is_empty());
    }

    #[test]
    fn test_decode_rejects_malformed_frame() {
        let mut h = Harness::logged_on_acceptor();
        let result = h.session.decode(b"8=FIX.4.4\x019=5\x0135=0");
        assert!(matches!(result, Err(FixError::Decode(_))));
    }

    #[test]
    fn test_send_increments_outgoing_and_logs() {
        let mut h = Harness::logged_on_acceptor();
        let before = h.session.record().outgoing_seq_num;
        let order = Message::of_type(MsgType::Application("8".to_string())).with(17, "EX-1");

        h.session.send(&order, Delivery::Live).unwrap();
        h.session.send(&order, Delivery::Live).unwrap();

        assert_eq!(h.session.record().outgoing_seq_num, before + 2);
        let sent = h.transport.take_sent();
        assert_eq!(sent[0].seq_num().unwrap(), before);
        assert_eq!(sent[1].seq_num().unwrap(), before + 1);
        assert_eq!(sent[0].get(tags::SENDER_COMP_ID), Some("SERVER"));
        assert_eq!(sent[0].get(tags::TARGET_COMP_ID), Some("CLIENT"));
        assert_eq!(
            h.log.entry_count(h.session.key()),
            usize::try_from(before + 1).unwrap()
        );
    }

    #[test]
    fn test_send_stamps_last_processed() {
        let mut h = Harness::logged_on_acceptor();
        h.session.decode(&app(2)).unwrap();
        h.session
            .send(&Message::of_type(MsgType::Heartbeat), Delivery::Live)
            .unwrap();
        let sent = h.transport.take_sent();
        assert_eq!(sent[0].get(tags::LAST_MSG_SEQ_NUM_PROCESSED), Some("2"));
    }

    #[test]
    fn test_replay_leaves_counters_untouched() {
        let mut h = Harness::logged_on_acceptor();
        let before = h.session.record();
        let logged = h.log.entry_count(h.session.key());
        let resent = Message::of_type(MsgType::Application("8".to_string()))
            .with(tags::MSG_SEQ_NUM, 1)
            .with(tags::POSS_DUP_FLAG, "Y");

        h.session.send(&resent, Delivery::Replay).unwrap();

        assert_eq!(h.session.record(), before);
        assert_eq!(h.log.entry_count(h.session.key()), logged);
        let sent = h.transport.take_sent();
        assert_eq!(sent[0].seq_num().unwrap(), 1);
        assert!(!sent[0].contains(tags::LAST_MSG_SEQ_NUM_PROCESSED));
    }

    #[test]
    fn test_send_notifies_listener_in_order() {
        let mut h = Harness::logged_on_acceptor();
        h.listener.clear();
        h.session
            .send(&Message::of_type(MsgType::Heartbeat), Delivery::Live)
            .unwrap();
        let events = h.listener.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], SessionEvent::DataOut(msg) if msg.msg_type().unwrap() == MsgType::Heartbeat));
        assert!(matches!(&events[1], SessionEvent::FixOut(raw) if raw.starts_with(b"8=FIX.4.4")));
    }

    #[test]
    fn test_test_request_answered_with_heartbeat() {
        let mut h = Harness::logged_on_acceptor();
        let test_request = Message::of_type(MsgType::TestRequest).with(tags::TEST_REQ_ID, "PING-7");
        h.session.decode(&inbound(test_request, 2)).unwrap();

        let sent = h.transport.take_sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].msg_type().unwrap(), MsgType::Heartbeat);
        assert_eq!(sent[0].get(tags::TEST_REQ_ID), Some("PING-7"));
    }

    #[test]
    fn test_decode_persists_record() {
        let mut h = Harness::logged_on_acceptor();
        h.session.decode(&app(2)).unwrap();
        h.session.persister.flush();
        let stored = h.store.get("SERVER-CLIENT").unwrap().unwrap();
        assert_eq!(stored.incoming_seq_num, 3);
        assert!(stored.is_logged_in);
    }

    #[test]
    fn test_reset_session_with_outgoing_discards_log() {
        let mut h = Harness::logged_on_acceptor();
        h.session
            .send(&Message::of_type(MsgType::Heartbeat), Delivery::Live)
            .unwrap();
        assert!(h.log.entry_count("SERVER-CLIENT") > 0);

        let record = h
            .session
            .reset_session(SessionReset {
                incoming_seq_num: Some(50),
                outgoing_seq_num: Some(100),
            })
            .unwrap();

        assert_eq!(record, SessionRecord::new(50, 100));
        assert_eq!(h.log.entry_count("SERVER-CLIENT"), 0);
        assert_eq!(h.store.get("SERVER-CLIENT").unwrap(), Some(record));
        assert!(!h.registry.is_logged_in("SERVER-CLIENT"));

        h.transport.take_sent();
        let resend = Message::of_type(MsgType::ResendRequest)
            .with(tags::BEGIN_SEQ_NO, 1)
            .with(tags::END_SEQ_NO, 0);
        h.session.record.is_logged_in = true;
        h.session.decode(&inbound(resend, 50)).unwrap();
        assert!(h.transport.take_sent().is_empty());
    }

    #[test]
    fn test_reset_session_without_outgoing_keeps_log() {
        let mut h = Harness::logged_on_acceptor();
        let logged = h.log.entry_count("SERVER-CLIENT");
        let record = h
            .session
            .reset_session(SessionReset {
                incoming_seq_num: Some(9),
                outgoing_seq_num: None,
            })
            .unwrap();
        assert_eq!(record.incoming_seq_num, 9);
        assert_eq!(record.outgoing_seq_num, 2);
        assert_eq!(h.log.entry_count("SERVER-CLIENT"), logged);
    }

    #[test]
    fn test_transport_close_logs_out() {
        let mut h = Harness::logged_on_acceptor();
        assert!(h.registry.is_logged_in("SERVER-CLIENT"));
        assert!(h.session.heartbeat_tick_period().is_some());

        h.session.on_transport_closed();

        assert!(!h.session.is_logged_in());
        assert!(!h.registry.is_logged_in("SERVER-CLIENT"));
        assert!(h.session.heartbeat_tick_period().is_none());
        assert_eq!(
            h.store.get("SERVER-CLIENT").unwrap().map(|r| r.is_logged_in),
            Some(false)
        );
    }

    #[test]
    fn test_file_storage_resumes_after_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig::acceptor()
            .with_storage_dir(dir.path())
            .with_reset_seq_num_on_reconnect(false);

        let mut first = Harness::new_with(config.clone(), |b| b.file_storage().unwrap());
        first.session.decode(&logon(1, 30)).unwrap();
        first.session.decode(&app(2)).unwrap();
        first.session.on_transport_closed();

        let mut second = Harness::new_with(config, |b| b.file_storage().unwrap());
        second.session.decode(&logon(3, 30)).unwrap();
        assert_eq!(second.session.record().incoming_seq_num, 4);
        let echo = second.transport.take_sent();
        assert_eq!(echo[0].seq_num().unwrap(), 2);

        second.session.resend_messages(Some(1), Some(1)).unwrap();
        let replay = second.transport.take_sent();
        assert_eq!(replay.len(), 1);
        assert_eq!(replay[0].msg_type().unwrap(), MsgType::SequenceReset);
        assert_eq!(replay[0].get(tags::NEW_SEQ_NO), Some("2"));
    }

    #[test]
    fn test_logon_frame_helper_decodes() {
        let mut h = Harness::new(SessionConfig::acceptor());
        let msg = h.session.decode(&logon(1, 30)).unwrap();
        assert_eq!(msg.get(tags::HEART_BT_INT), Some("30"));
    }
}
