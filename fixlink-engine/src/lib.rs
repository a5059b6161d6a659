/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixlink Engine
//!
//! Tokio runtime for fixlink sessions.
//!
//! This crate provides:
//! - **Acceptor**: Server side, one session per accepted connection
//! - **Initiator**: Client side, dials a counterparty and logs on
//! - **Connection driver**: One task per session multiplexing frames, timers and commands
//! - **Builder API**: Fluent configuration shared by every connection

pub mod acceptor;
pub mod builder;
pub mod connection;
pub mod initiator;

pub use acceptor::Acceptor;
pub use builder::EngineBuilder;
pub use connection::{ChannelTransport, EngineEvent, SessionHandle};
pub use initiator::Initiator;
