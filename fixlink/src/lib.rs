/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixlink
//!
//! The session layer of a FIX engine.
//!
//! fixlink keeps two counterparties in step: it validates inbound sequence
//! numbers, requests and replays missing messages (collapsing administrative
//! traffic into gap fills), supervises heartbeats and runs the Logon/Logout
//! handshake, persisting the session record so a reconnect resumes where the
//! last connection stopped.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fixlink::prelude::*;
//!
//! let initiator = EngineBuilder::new(SessionConfig::initiator("CLIENT", "SERVER", "FIX.4.4"))
//!     .with_file_storage()?
//!     .initiator()?;
//! let mut session = initiator.connect("127.0.0.1:9876", None).await?;
//! while let Some(event) = session.next_event().await {
//!     println!("{event:?}");
//! }
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: Errors, tags, the message model
//! - [`tagvalue`]: tag=value encoding and decoding
//! - [`session`]: The session state machine
//! - [`store`]: Session records and outbound message logs
//! - [`transport`]: Stream framing
//! - [`engine`]: Tokio acceptor and initiator

pub mod core {
    //! Errors, tags and the message model.
    pub use fixlink_core::*;
}

pub mod tagvalue {
    //! tag=value encoding and decoding.
    pub use fixlink_tagvalue::*;
}

pub mod session {
    //! The session state machine.
    pub use fixlink_session::*;
}

pub mod store {
    //! Session records and outbound message logs.
    pub use fixlink_store::*;
}

pub mod transport {
    //! Stream framing.
    pub use fixlink_transport::*;
}

pub mod engine {
    //! Tokio acceptor and initiator.
    pub use fixlink_engine::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use fixlink_core::{
        DecodeError, EncodeError, FixError, Message, MsgType, Result, SessionError, SessionKey,
        StoreError, Timestamp, tags,
    };

    // Tag-value encoding
    pub use fixlink_tagvalue::{MessageCodec, TagValueCodec, calculate_checksum};

    // Session
    pub use fixlink_session::{
        Authenticator, Delivery, DuplicateDetector, FixSession, LogoffEvent, SessionBuilder,
        SessionConfig, SessionEvent, SessionListener, SessionRegistry, SessionRole, Transport,
    };

    // Store
    pub use fixlink_store::{
        FileMessageLog, FileStore, MemoryMessageLog, MemoryStore, MessageLog, SessionRecord,
        SessionReset, SessionStore,
    };

    // Transport
    pub use fixlink_transport::{CodecError, FixCodec};

    // Engine
    pub use fixlink_engine::{Acceptor, EngineBuilder, EngineEvent, Initiator, SessionHandle};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_imports() {
        let _ts = Timestamp::now();
        let config = SessionConfig::initiator("CLIENT", "SERVER", "FIX.4.4");
        assert_eq!(config.role, SessionRole::Initiator);
        assert_eq!(SessionRecord::default(), SessionRecord::new(1, 1));
    }

    #[test]
    fn test_session_over_detached_transport() {
        let mut session = FixSession::builder(SessionConfig::initiator("CLIENT", "SERVER", "FIX.4.4"))
            .registry(SessionRegistry::new())
            .build(Box::new(crate::session::DetachedTransport));

        let raw = session.logon(None).unwrap();
        let logon = TagValueCodec::new().decode(&raw).unwrap();
        assert_eq!(logon.msg_type().unwrap(), MsgType::Logon);
        assert_eq!(logon.get(tags::HEART_BT_INT), Some("10"));
        assert_eq!(session.record().outgoing_seq_num, 2);
    }
}
