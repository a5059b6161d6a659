/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FIX message encoder.
//!
//! Builds a body field by field, then wraps it with BeginString, BodyLength
//! and CheckSum in [`Encoder::finish`].

use crate::checksum::{calculate_checksum, format_checksum};
use bytes::{BufMut, Bytes, BytesMut};

/// SOH (Start of Header) delimiter used in FIX messages.
pub const SOH: u8 = 0x01;

/// FIX message encoder.
#[derive(Debug)]
pub struct Encoder<'a> {
    /// Buffer for the message body (between BodyLength and CheckSum).
    body: BytesMut,
    /// The BeginString value (e.g., "FIX.4.4").
    begin_string: &'a str,
}

impl<'a> Encoder<'a> {
    /// Creates a new encoder with the specified BeginString.
    #[must_use]
    pub fn new(begin_string: &'a str) -> Self {
        Self::with_capacity(begin_string, 256)
    }

    /// Creates a new encoder with pre-allocated body capacity.
    #[must_use]
    pub fn with_capacity(begin_string: &'a str, capacity: usize) -> Self {
        Self {
            body: BytesMut::with_capacity(capacity),
            begin_string,
        }
    }

    /// Appends a field with a string value.
    #[inline]
    pub fn put_str(&mut self, tag: u32, value: &str) {
        self.put_raw(tag, value.as_bytes());
    }

    /// Appends a field with an unsigned integer value.
    #[inline]
    pub fn put_uint(&mut self, tag: u32, value: u64) {
        let mut buf = itoa::Buffer::new();
        self.put_raw(tag, buf.format(value).as_bytes());
    }

    /// Appends a field with raw bytes.
    #[inline]
    pub fn put_raw(&mut self, tag: u32, value: &[u8]) {
        let mut tag_buf = itoa::Buffer::new();
        self.body.put_slice(tag_buf.format(tag).as_bytes());
        self.body.put_u8(b'=');
        self.body.put_slice(value);
        self.body.put_u8(SOH);
    }

    /// Finalizes the message: prepends `8=` and `9=`, appends `10=`.
    #[must_use]
    pub fn finish(self) -> Bytes {
        let body_len = self.body.len();
        let mut len_buf = itoa::Buffer::new();
        let len_str = len_buf.format(body_len);

        let mut message =
            BytesMut::with_capacity(self.begin_string.len() + len_str.len() + body_len + 16);
        message.put_slice(b"8=");
        message.put_slice(self.begin_string.as_bytes());
        message.put_u8(SOH);
        message.put_slice(b"9=");
        message.put_slice(len_str.as_bytes());
        message.put_u8(SOH);
        message.put_slice(&self.body);

        let checksum = format_checksum(calculate_checksum(&message));
        message.put_slice(b"10=");
        message.put_slice(&checksum);
        message.put_u8(SOH);

        message.freeze()
    }

    /// Returns the current body length.
    #[inline]
    #[must_use]
    pub fn body_len(&self) -> usize {
        self.body.len()
    }
}
