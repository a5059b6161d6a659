/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixlink Session
//!
//! FIX session layer for the fixlink engine.
//!
//! This crate provides:
//! - **Session**: [`FixSession`] decodes inbound frames, stamps and logs outbound ones
//! - **Handshake**: Logon and Logout exchange, authentication and duplicate checks
//! - **Sequence management**: Gap detection and duplicate rejection
//! - **Recovery**: Chunked ResendRequests, replay with gap-fill collapsing
//! - **Heartbeats**: Heartbeat and TestRequest supervision
//! - **Persistence**: Throttled writes of the session record

pub mod config;
pub mod events;
pub mod handshake;
pub mod heartbeat;
pub mod persist;
pub mod registry;
pub mod resend;
pub mod sequence;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testkit;

pub use config::{SessionConfig, SessionRole};
pub use events::{LogoffEvent, NoopListener, SessionEvent, SessionListener};
pub use fixlink_store::{SessionRecord, SessionReset};
pub use handshake::{AcceptAll, Authenticator, DEFAULT_LOGOUT_REASON, DuplicateDetector};
pub use heartbeat::{HeartbeatActions, HeartbeatSupervisor};
pub use persist::Persister;
pub use registry::SessionRegistry;
pub use resend::{RESEND_BATCH_SIZE, ResendTracker};
pub use sequence::SequenceResult;
pub use session::{Delivery, FixSession, SessionBuilder};
pub use transport::{DetachedTransport, Transport};
