/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Shared fixtures for session tests.

use crate::config::SessionConfig;
use crate::events::{LogoffEvent, SessionEvent, SessionListener};
use crate::registry::SessionRegistry;
use crate::session::{FixSession, SessionBuilder};
use crate::transport::Transport;
use bytes::Bytes;
use fixlink_core::error::FixError;
use fixlink_core::field::tags;
use fixlink_core::message::{Message, MsgType};
use fixlink_core::types::Timestamp;
use fixlink_store::{MemoryMessageLog, MemoryStore};
use fixlink_tagvalue::{Header, MessageCodec, TagValueCodec};
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Wire {
    frames: Vec<Bytes>,
    errors: Vec<String>,
    destroyed: bool,
}

/// Transport that records everything written to it.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingTransport {
    wire: Arc<Mutex<Wire>>,
}

impl RecordingTransport {
    /// Drains and decodes the frames written so far.
    pub(crate) fn take_sent(&self) -> Vec<Message> {
        let codec = TagValueCodec::new();
        std::mem::take(&mut self.wire.lock().frames)
            .iter()
            .map(|frame| codec.decode(frame).unwrap())
            .collect()
    }

    pub(crate) fn errors(&self) -> Vec<String> {
        self.wire.lock().errors.clone()
    }

    pub(crate) fn destroyed(&self) -> bool {
        self.wire.lock().destroyed
    }
}

impl Transport for RecordingTransport {
    fn write(&mut self, frame: &Bytes) -> io::Result<()> {
        let mut wire = self.wire.lock();
        if wire.destroyed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "destroyed"));
        }
        wire.frames.push(frame.clone());
        Ok(())
    }

    fn destroy(&mut self) {
        self.wire.lock().destroyed = true;
    }

    fn report_error(&mut self, error: FixError) {
        self.wire.lock().errors.push(error.to_string());
    }
}

/// Listener that records session notifications.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingListener {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl RecordingListener {
    pub(crate) fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().clone()
    }

    pub(crate) fn clear(&self) {
        self.events.lock().clear();
    }
}

impl SessionListener for RecordingListener {
    fn on_logon(&mut self, target: &str) {
        self.events.lock().push(SessionEvent::Logon {
            target: target.to_string(),
        });
    }

    fn on_logoff(&mut self, event: &LogoffEvent) {
        self.events.lock().push(SessionEvent::Logoff(event.clone()));
    }

    fn on_data_out(&mut self, message: &Message) {
        self.events.lock().push(SessionEvent::DataOut(message.clone()));
    }

    fn on_fix_out(&mut self, raw: &[u8]) {
        self.events
            .lock()
            .push(SessionEvent::FixOut(Bytes::copy_from_slice(raw)));
    }
}

/// A session wired to recording collaborators and a private registry.
pub(crate) struct Harness {
    pub(crate) session: FixSession,
    pub(crate) transport: RecordingTransport,
    pub(crate) listener: RecordingListener,
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) log: Arc<MemoryMessageLog>,
    pub(crate) registry: SessionRegistry,
}

impl Harness {
    pub(crate) fn new(config: SessionConfig) -> Self {
        Self::new_with(config, |builder| builder)
    }

    /// Builds a harness, letting `customize` adjust the builder last.
    pub(crate) fn new_with(
        config: SessionConfig,
        customize: impl FnOnce(SessionBuilder) -> SessionBuilder,
    ) -> Self {
        let transport = RecordingTransport::default();
        let listener = RecordingListener::default();
        let store = Arc::new(MemoryStore::new());
        let log = Arc::new(MemoryMessageLog::new());
        let registry = SessionRegistry::new();

        let builder = FixSession::builder(config)
            .store(store.clone())
            .message_log(log.clone())
            .listener(listener.clone())
            .registry(registry.clone());
        let session = customize(builder).build(Box::new(transport.clone()));

        Self {
            session,
            transport,
            listener,
            store,
            log,
            registry,
        }
    }

    /// An acceptor that has processed `logon(1, 30)` from CLIENT.
    pub(crate) fn logged_on_acceptor() -> Self {
        let mut harness = Self::new(SessionConfig::acceptor());
        harness.session.decode(&logon(1, 30)).unwrap();
        harness.transport.take_sent();
        harness
    }
}

/// Encodes `message` as CLIENT would send it to SERVER.
pub(crate) fn inbound(message: Message, seq_num: u64) -> Vec<u8> {
    let header = Header {
        begin_string: "FIX.4.4",
        sender_comp_id: "CLIENT",
        target_comp_id: "SERVER",
        msg_seq_num: seq_num,
        sending_time: Timestamp::now(),
        sender_sub_id: None,
        target_sub_id: None,
        sender_location_id: None,
        appl_ver_id: None,
    };
    TagValueCodec::new()
        .encode(&message, &header)
        .unwrap()
        .to_vec()
}

pub(crate) fn logon(seq_num: u64, heartbeat_secs: u64) -> Vec<u8> {
    let message = Message::of_type(MsgType::Logon)
        .with(tags::ENCRYPT_METHOD, 0)
        .with(tags::HEART_BT_INT, heartbeat_secs);
    inbound(message, seq_num)
}

pub(crate) fn app(seq_num: u64) -> Vec<u8> {
    let message = Message::of_type(MsgType::Application("D".to_string()))
        .with(11, format!("ORD-{seq_num}"))
        .with(55, "EURUSD");
    inbound(message, seq_num)
}
