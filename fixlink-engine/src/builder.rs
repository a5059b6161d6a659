/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Engine builder for fluent configuration.
//!
//! An [`EngineBuilder`] holds one session configuration and the collaborators
//! shared by every connection made from it. Storage defaults to an in-memory
//! store and log shared across connections, so a reconnecting counterparty
//! finds its record within the same process.

use crate::acceptor::Acceptor;
use crate::initiator::Initiator;
use fixlink_core::error::{Result, SessionError, StoreError};
use fixlink_session::{
    Authenticator, DuplicateDetector, FixSession, SessionBuilder, SessionConfig, SessionRegistry,
    SessionRole,
};
use fixlink_store::{
    FileMessageLog, FileStore, MemoryMessageLog, MemoryStore, MessageLog, SessionStore,
};
use fixlink_tagvalue::MessageCodec;
use fixlink_transport::FixCodec;
use std::sync::Arc;
use std::time::Duration;

/// Builder for acceptors and initiators.
#[derive(Clone)]
pub struct EngineBuilder {
    config: SessionConfig,
    store: Arc<dyn SessionStore>,
    log: Arc<dyn MessageLog>,
    codec: Option<Arc<dyn MessageCodec>>,
    registry: Option<SessionRegistry>,
    authenticator: Option<Arc<dyn Authenticator>>,
    duplicates: Option<Arc<dyn DuplicateDetector>>,
    framing: FixCodec,
    connect_timeout: Duration,
    outbound_events: bool,
}

impl EngineBuilder {
    /// Creates a builder for `config` with in-memory storage.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            store: Arc::new(MemoryStore::new()),
            log: Arc::new(MemoryMessageLog::new()),
            codec: None,
            registry: None,
            authenticator: None,
            duplicates: None,
            framing: FixCodec::new(),
            connect_timeout: Duration::from_secs(30),
            outbound_events: false,
        }
    }

    /// Persists records and outbound history under the configured storage
    /// directory.
    ///
    /// # Errors
    /// Returns `StoreError::Io` if the directory cannot be created.
    pub fn with_file_storage(self) -> std::result::Result<Self, StoreError> {
        let store = FileStore::open(&self.config.storage_dir)?;
        let log = FileMessageLog::open(&self.config.storage_dir)?;
        Ok(self
            .with_store(Arc::new(store))
            .with_message_log(Arc::new(log)))
    }

    /// Sets the session record store.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = store;
        self
    }

    /// Sets the outbound message log.
    #[must_use]
    pub fn with_message_log(mut self, log: Arc<dyn MessageLog>) -> Self {
        self.log = log;
        self
    }

    /// Sets the message codec.
    #[must_use]
    pub fn with_codec(mut self, codec: Arc<dyn MessageCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Publishes logon state to `registry` instead of the global one.
    #[must_use]
    pub fn with_registry(mut self, registry: SessionRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Checks inbound Logons with `authenticator`.
    #[must_use]
    pub fn with_authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.authenticator = Some(Arc::new(authenticator));
        self
    }

    /// Rejects Logons for which `duplicates` reports an active session.
    #[must_use]
    pub fn with_duplicate_detector(mut self, duplicates: impl DuplicateDetector + 'static) -> Self {
        self.duplicates = Some(Arc::new(duplicates));
        self
    }

    /// Sets the largest inbound frame accepted.
    #[must_use]
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.framing = self.framing.with_max_message_size(size);
        self
    }

    /// Enables or disables CheckSum validation of inbound frames.
    #[must_use]
    pub fn with_checksum_validation(mut self, validate: bool) -> Self {
        self.framing = self.framing.with_checksum_validation(validate);
        self
    }

    /// Sets how long an initiator waits for the TCP connection.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Forwards every outbound message as `DataOut` and `FixOut` session
    /// events. Off by default.
    #[must_use]
    pub const fn with_outbound_events(mut self, enabled: bool) -> Self {
        self.outbound_events = enabled;
        self
    }

    /// Returns the session configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the connection timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Builds an acceptor.
    ///
    /// # Errors
    /// Returns `SessionError::Configuration` unless the role is acceptor.
    pub fn acceptor(self) -> Result<Acceptor> {
        self.expect_role(SessionRole::Acceptor)?;
        Ok(Acceptor::new(self))
    }

    /// Builds an initiator.
    ///
    /// # Errors
    /// Returns `SessionError::Configuration` unless the role is initiator and
    /// both CompIDs are set.
    pub fn initiator(self) -> Result<Initiator> {
        self.expect_role(SessionRole::Initiator)?;
        if self.config.sender_comp_id.is_empty() || self.config.target_comp_id.is_empty() {
            return Err(SessionError::Configuration(
                "initiator needs sender and target CompIDs".to_string(),
            )
            .into());
        }
        Ok(Initiator::new(self))
    }

    fn expect_role(&self, role: SessionRole) -> Result<()> {
        if self.config.role == role {
            return Ok(());
        }
        Err(SessionError::Configuration(format!(
            "expected {role:?} configuration, got {:?}",
            self.config.role
        ))
        .into())
    }

    /// Assembles the session builder for one connection.
    pub(crate) fn session_builder(&self) -> SessionBuilder {
        let mut builder = FixSession::builder(self.config.clone())
            .store(Arc::clone(&self.store))
            .message_log(Arc::clone(&self.log));
        if let Some(codec) = &self.codec {
            builder = builder.codec(Arc::clone(codec));
        }
        if let Some(registry) = &self.registry {
            builder = builder.registry(registry.clone());
        }
        if let Some(authenticator) = &self.authenticator {
            builder = builder.authenticator(Arc::clone(authenticator));
        }
        if let Some(duplicates) = &self.duplicates {
            builder = builder.duplicate_detector(Arc::clone(duplicates));
        }
        builder
    }

    pub(crate) fn framing(&self) -> FixCodec {
        self.framing.clone()
    }

    pub(crate) const fn outbound_events(&self) -> bool {
        self.outbound_events
    }
}

impl std::fmt::Debug for EngineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineBuilder")
            .field("config", &self.config)
            .field("framing", &self.framing)
            .field("connect_timeout", &self.connect_timeout)
            .field("outbound_events", &self.outbound_events)
            .finish_non_exhaustive()
    }
}
