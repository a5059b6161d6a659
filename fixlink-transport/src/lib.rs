/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # fixlink Transport
//!
//! Stream framing for the fixlink session engine.
//!
//! [`FixCodec`] plugs into `tokio_util::codec` to cut a TCP byte stream into
//! complete, checksum-validated FIX frames.

pub mod codec;

pub use codec::{CodecError, FixCodec};
