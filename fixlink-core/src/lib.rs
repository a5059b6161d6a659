/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixlink Core
//!
//! Core types and error definitions shared by every fixlink crate:
//! - **Error types**: One `thiserror` enum per layer, unified under [`FixError`]
//! - **Message model**: [`Message`], an ordered tag/value map, and [`MsgType`]
//! - **Core types**: [`Timestamp`], [`SessionKey`]

pub mod error;
pub mod field;
pub mod message;
pub mod types;

pub use error::{DecodeError, EncodeError, FixError, Result, SessionError, StoreError};
pub use field::{Field, tags};
pub use message::{Message, MsgType};
pub use types::{SessionKey, Timestamp};
