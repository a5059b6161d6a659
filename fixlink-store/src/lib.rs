/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixlink Store
//!
//! Persistence for the fixlink session engine.
//!
//! This crate provides:
//! - **SessionRecord**: the per-counterparty state that survives reconnects
//! - **SessionStore / MessageLog traits**: record storage and the outbound
//!   message log used to answer ResendRequests
//! - **MemoryStore / MemoryMessageLog**: in-memory implementations
//! - **FileStore / FileMessageLog**: JSON records and line-delimited logs on disk

pub mod file;
pub mod memory;
pub mod record;
pub mod traits;

pub use file::{FileMessageLog, FileStore};
pub use memory::{MemoryMessageLog, MemoryStore};
pub use record::{SessionRecord, SessionReset};
pub use traits::{LogEntries, MessageLog, SessionStore};
