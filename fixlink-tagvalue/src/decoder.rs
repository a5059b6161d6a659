/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FIX tag=value decoder.
//!
//! Parses one complete frame into an ordered [`Message`]. Framing itself
//! (finding where a frame ends in a byte stream) belongs to the transport
//! codec; this decoder expects exactly one message.

use crate::checksum::{calculate_checksum, parse_checksum};
use fixlink_core::error::DecodeError;
use fixlink_core::field::{Field, tags};
use fixlink_core::message::Message;
use memchr::memchr;

/// SOH (Start of Header) delimiter used in FIX messages.
pub const SOH: u8 = 0x01;

/// Equals sign delimiter between tag and value.
pub const EQUALS: u8 = b'=';

/// A field located in the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawField<'a> {
    /// The field tag number.
    pub tag: u32,
    /// The value bytes, borrowed from the input.
    pub value: &'a [u8],
    /// Offset of the first tag digit in the input.
    pub start: usize,
}

/// FIX message decoder over a single frame.
#[derive(Debug)]
pub struct Decoder<'a> {
    /// Input buffer.
    input: &'a [u8],
    /// Current position in the buffer.
    offset: usize,
    /// Whether to validate the checksum.
    validate_checksum: bool,
    /// Whether to validate BodyLength.
    validate_length: bool,
}

impl<'a> Decoder<'a> {
    /// Creates a new decoder for the given frame.
    #[inline]
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            offset: 0,
            validate_checksum: true,
            validate_length: true,
        }
    }

    /// Sets whether to validate checksums during decoding.
    #[inline]
    #[must_use]
    pub const fn with_checksum_validation(mut self, validate: bool) -> Self {
        self.validate_checksum = validate;
        self
    }

    /// Sets whether to validate BodyLength during decoding.
    #[inline]
    #[must_use]
    pub const fn with_length_validation(mut self, validate: bool) -> Self {
        self.validate_length = validate;
        self
    }

    /// Decodes the frame into a [`Message`].
    ///
    /// The returned message keeps every field in wire order, including
    /// BeginString, BodyLength and CheckSum.
    ///
    /// # Errors
    /// Returns `DecodeError` if the frame is malformed, truncated, or fails
    /// BodyLength/CheckSum validation.
    pub fn decode(&mut self) -> Result<Message, DecodeError> {
        let frame_start = self.offset;

        let begin_string = self.next_field()?.ok_or(DecodeError::Incomplete)?;
        if begin_string.tag != tags::BEGIN_STRING {
            return Err(DecodeError::InvalidBeginString);
        }

        let body_length = self.next_field()?.ok_or(DecodeError::MissingBodyLength)?;
        if body_length.tag != tags::BODY_LENGTH {
            return Err(DecodeError::MissingBodyLength);
        }
        let declared_length: usize = std::str::from_utf8(body_length.value)?
            .parse()
            .map_err(|_| DecodeError::InvalidBodyLength)?;
        let body_start = self.offset;

        let mut message = Message::new();
        message.push(to_field(begin_string)?);
        message.push(to_field(body_length)?);

        let mut checksum = None;
        while let Some(field) = self.next_field()? {
            if field.tag == tags::CHECK_SUM {
                checksum = Some(field);
                break;
            }
            if message.len() == 2 && field.tag != tags::MSG_TYPE {
                return Err(DecodeError::MissingMsgType);
            }
            message.push(to_field(field)?);
        }
        let checksum = checksum.ok_or(DecodeError::Incomplete)?;

        if self.validate_length && checksum.start - body_start != declared_length {
            return Err(DecodeError::InvalidBodyLength);
        }

        if self.validate_checksum {
            let declared =
                parse_checksum(checksum.value).ok_or_else(|| DecodeError::InvalidFieldValue {
                    tag: tags::CHECK_SUM,
                    reason: "invalid checksum format".to_string(),
                })?;
            let calculated = calculate_checksum(&self.input[frame_start..checksum.start]);
            if calculated != declared {
                return Err(DecodeError::ChecksumMismatch {
                    calculated,
                    declared,
                });
            }
        }

        message.push(to_field(checksum)?);
        Ok(message)
    }

    /// Parses the next field from the buffer.
    ///
    /// # Returns
    /// The next field, or `None` once the buffer is exhausted.
    ///
    /// # Errors
    /// Returns `DecodeError::Incomplete` when a field is cut short and
    /// `DecodeError::MalformedField` when the tag is not a number.
    pub fn next_field(&mut self) -> Result<Option<RawField<'a>>, DecodeError> {
        if self.offset >= self.input.len() {
            return Ok(None);
        }

        let start = self.offset;
        let remaining = &self.input[start..];

        let eq_pos = memchr(EQUALS, remaining).ok_or(DecodeError::Incomplete)?;
        let tag = parse_tag(&remaining[..eq_pos])
            .ok_or(DecodeError::MalformedField { offset: start })?;

        let value_start = eq_pos + 1;
        let soh_pos = memchr(SOH, &remaining[value_start..]).ok_or(DecodeError::Incomplete)?;
        let value = &remaining[value_start..value_start + soh_pos];

        self.offset = start + value_start + soh_pos + 1;

        Ok(Some(RawField { tag, value, start }))
    }

    /// Returns true if the buffer has been fully consumed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offset >= self.input.len()
    }
}

fn to_field(raw: RawField<'_>) -> Result<Field, DecodeError> {
    Ok(Field::new(raw.tag, std::str::from_utf8(raw.value)?))
}

/// Parses a tag number from ASCII digits.
#[inline]
fn parse_tag(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || bytes.len() > 10 {
        return None;
    }

    let mut result: u32 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        result = result.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
    }

    Some(result)
}
