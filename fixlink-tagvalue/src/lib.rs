/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixlink Tag-Value
//!
//! The FIX tag=value message codec used by the fixlink session layer.
//!
//! - **Decoding**: One frame into an ordered [`Message`], with BodyLength and
//!   CheckSum validation
//! - **Encoding**: Standard header stamping plus checksum framing
//! - **Codec seam**: [`MessageCodec`] so a session can be driven by another codec

pub mod checksum;
pub mod codec;
pub mod decoder;
pub mod encoder;

pub use checksum::calculate_checksum;
pub use codec::{Header, MessageCodec, TagValueCodec};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use fixlink_core::message::Message;
