/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Tokio codec for FIX message framing.
//!
//! Splits a TCP byte stream into complete FIX frames using BeginString and
//! BodyLength, validating the CheckSum trailer. Frames are handed to the
//! session still encoded; field parsing happens there.

use bytes::{BufMut, Bytes, BytesMut};
use fixlink_tagvalue::checksum::{calculate_checksum, parse_checksum};
use memchr::memchr;
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

/// Errors that can occur while framing a byte stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Invalid BeginString field.
    #[error("invalid begin string: frame must start with 8=")]
    InvalidBeginString,

    /// Missing BodyLength field.
    #[error("missing body length field (tag 9)")]
    MissingBodyLength,

    /// Invalid BodyLength value.
    #[error("invalid body length value")]
    InvalidBodyLength,

    /// The bytes after the body are not a `10=NNN` trailer.
    #[error("malformed checksum trailer")]
    InvalidTrailer,

    /// Checksum mismatch.
    #[error("checksum mismatch: calculated {calculated}, declared {declared}")]
    ChecksumMismatch {
        /// Calculated checksum.
        calculated: u8,
        /// Declared checksum in message.
        declared: u8,
    },

    /// Frame exceeds maximum size.
    #[error("message too large: {size} bytes exceeds maximum {max_size}")]
    MessageTooLarge {
        /// Actual frame size.
        size: usize,
        /// Maximum allowed size.
        max_size: usize,
    },

    /// I/O error.
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

const SOH: u8 = 0x01;

/// Length of the `10=NNN<SOH>` trailer.
const TRAILER_LEN: usize = 7;

/// Longest BodyLength digit run accepted before giving up on a frame.
const MAX_BODY_LENGTH_DIGITS: usize = 10;

/// Tokio codec for FIX message framing.
#[derive(Debug, Clone)]
pub struct FixCodec {
    max_message_size: usize,
    validate_checksum: bool,
}

impl FixCodec {
    /// Creates a codec accepting frames up to 1 MiB with checksum validation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_message_size: 1024 * 1024,
            validate_checksum: true,
        }
    }

    /// Sets the maximum frame size.
    #[must_use]
    pub const fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Sets whether to validate checksums.
    #[must_use]
    pub const fn with_checksum_validation(mut self, validate: bool) -> Self {
        self.validate_checksum = validate;
        self
    }

    /// Returns the total frame length once the header is buffered.
    fn frame_length(&self, src: &[u8]) -> Result<Option<usize>, CodecError> {
        if src.len() < 2 {
            return Ok(None);
        }
        if &src[..2] != b"8=" {
            return Err(CodecError::InvalidBeginString);
        }
        let Some(first_soh) = memchr(SOH, src) else {
            return Ok(None);
        };

        let body_len_start = first_soh + 1;
        if src.len() < body_len_start + 2 {
            return Ok(None);
        }
        if &src[body_len_start..body_len_start + 2] != b"9=" {
            return Err(CodecError::MissingBodyLength);
        }

        let digits = &src[body_len_start + 2..];
        let Some(len_end) = memchr(SOH, digits) else {
            if digits.len() > MAX_BODY_LENGTH_DIGITS {
                return Err(CodecError::InvalidBodyLength);
            }
            return Ok(None);
        };
        if len_end > MAX_BODY_LENGTH_DIGITS {
            return Err(CodecError::InvalidBodyLength);
        }
        let body_length: usize = std::str::from_utf8(&digits[..len_end])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(CodecError::InvalidBodyLength)?;

        let body_start = body_len_start + 2 + len_end + 1;
        let total = body_start
            .checked_add(body_length)
            .and_then(|len| len.checked_add(TRAILER_LEN))
            .ok_or(CodecError::InvalidBodyLength)?;
        if total > self.max_message_size {
            return Err(CodecError::MessageTooLarge {
                size: total,
                max_size: self.max_message_size,
            });
        }
        Ok(Some(total))
    }
}

impl Default for FixCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FixCodec {
    type Item = Bytes;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(total) = self.frame_length(src)? else {
            return Ok(None);
        };
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        let trailer = &src[total - TRAILER_LEN..total];
        if &trailer[..3] != b"10=" || trailer[TRAILER_LEN - 1] != SOH {
            return Err(CodecError::InvalidTrailer);
        }
        if self.validate_checksum {
            let declared = parse_checksum(&trailer[3..6]).ok_or(CodecError::InvalidTrailer)?;
            let calculated = calculate_checksum(&src[..total - TRAILER_LEN]);
            if calculated != declared {
                return Err(CodecError::ChecksumMismatch {
                    calculated,
                    declared,
                });
            }
        }

        Ok(Some(src.split_to(total).freeze()))
    }
}

impl Encoder<Bytes> for FixCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        dst.put_slice(&item);
        Ok(())
    }
}

impl Encoder<&[u8]> for FixCodec {
    type Error = CodecError;

    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        dst.put_slice(item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_fix_message(body: &str) -> Vec<u8> {
        let header = format!("8=FIX.4.4\x019={}\x01", body.len());
        let without_checksum = format!("{header}{body}");
        let checksum = calculate_checksum(without_checksum.as_bytes());
        format!("{without_checksum}10={checksum:03}\x01").into_bytes()
    }

    #[test]
    fn test_decode_complete_frame() {
        let mut codec = FixCodec::new();
        let msg = make_fix_message("35=0\x0134=2\x01");
        let mut buf = BytesMut::from(&msg[..]);

        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(&frame[..], &msg[..]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_waits_for_more_bytes() {
        let mut codec = FixCodec::new();
        let msg = make_fix_message("35=0\x01");

        for cut in [1, 5, 12, msg.len() - 1] {
            let mut buf = BytesMut::from(&msg[..cut]);
            assert_eq!(codec.decode(&mut buf).unwrap(), None, "cut at {cut}");
        }
    }

    #[test]
    fn test_decode_splits_back_to_back_frames() {
        let mut codec = FixCodec::new();
        let first = make_fix_message("35=0\x0134=1\x01");
        let second = make_fix_message("35=1\x0134=2\x01112=X\x01");
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&first);
        buf.extend_from_slice(&second[..10]);

        assert_eq!(&codec.decode(&mut buf).unwrap().unwrap()[..], &first[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(&second[10..]);
        assert_eq!(&codec.decode(&mut buf).unwrap().unwrap()[..], &second[..]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_invalid_begin_string() {
        let mut codec = FixCodec::new();
        let mut buf = BytesMut::from(&b"9=FIX.4.4\x019=5\x0135=0\x0110=000\x01"[..]);
        assert_eq!(codec.decode(&mut buf), Err(CodecError::InvalidBeginString));
    }

    #[test]
    fn test_decode_missing_body_length() {
        let mut codec = FixCodec::new();
        let mut buf = BytesMut::from(&b"8=FIX.4.4\x0135=0\x0110=000\x01"[..]);
        assert_eq!(codec.decode(&mut buf), Err(CodecError::MissingBodyLength));
    }

    #[test]
    fn test_decode_checksum_mismatch() {
        let mut codec = FixCodec::new();
        let mut buf = BytesMut::from(&b"8=FIX.4.4\x019=5\x0135=0\x0110=000\x01"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_without_checksum_validation() {
        let mut codec = FixCodec::new().with_checksum_validation(false);
        let mut buf = BytesMut::from(&b"8=FIX.4.4\x019=5\x0135=0\x0110=000\x01"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_some());
    }

    #[test]
    fn test_decode_body_length_overrun() {
        let mut codec = FixCodec::new().with_checksum_validation(false);
        let mut buf = BytesMut::from(&b"8=FIX.4.4\x019=3\x0135=0\x0110=000\x01"[..]);
        assert_eq!(codec.decode(&mut buf), Err(CodecError::InvalidTrailer));
    }

    #[test]
    fn test_decode_rejects_oversized_body_length() {
        let mut codec = FixCodec::new();
        let mut buf = BytesMut::from(&b"8=FIX.4.4\x019=18446744073709551615\x0135=0\x01"[..]);
        assert_eq!(codec.decode(&mut buf), Err(CodecError::InvalidBodyLength));

        let mut buf = BytesMut::from(&b"8=FIX.4.4\x019=9999999999\x0135=0\x01"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::MessageTooLarge { .. })
        ));
    }

    #[test]
    fn test_decode_too_large() {
        let mut codec = FixCodec::new().with_max_message_size(16);
        let msg = make_fix_message("35=0\x01");
        let mut buf = BytesMut::from(&msg[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::MessageTooLarge { max_size: 16, .. })
        ));
    }

    #[test]
    fn test_encode_passes_frame_through() {
        let mut codec = FixCodec::new();
        let msg = Bytes::from_static(b"8=FIX.4.4\x019=5\x0135=0\x0110=123\x01");
        let mut dst = BytesMut::new();

        codec.encode(msg.clone(), &mut dst).unwrap();
        assert_eq!(&dst[..], &msg[..]);
    }
}
