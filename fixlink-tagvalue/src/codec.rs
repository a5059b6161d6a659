/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Message codec seam used by the session layer.
//!
//! The session never touches wire bytes directly: it hands a [`Message`] plus
//! a [`Header`] to a [`MessageCodec`] and gets a complete frame back.

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use bytes::Bytes;
use fixlink_core::error::{DecodeError, EncodeError};
use fixlink_core::field::tags;
use fixlink_core::message::Message;
use fixlink_core::types::Timestamp;

/// Standard header values stamped on every outbound message.
#[derive(Debug, Clone, Copy)]
pub struct Header<'a> {
    /// BeginString (tag 8).
    pub begin_string: &'a str,
    /// SenderCompID (tag 49).
    pub sender_comp_id: &'a str,
    /// TargetCompID (tag 56).
    pub target_comp_id: &'a str,
    /// MsgSeqNum (tag 34).
    pub msg_seq_num: u64,
    /// SendingTime (tag 52).
    pub sending_time: Timestamp,
    /// SenderSubID (tag 50).
    pub sender_sub_id: Option<&'a str>,
    /// TargetSubID (tag 57).
    pub target_sub_id: Option<&'a str>,
    /// SenderLocationID (tag 142).
    pub sender_location_id: Option<&'a str>,
    /// ApplVerID (tag 1128).
    pub appl_ver_id: Option<&'a str>,
}

impl Header<'_> {
    /// Returns true if the header, rather than the message body, owns `tag`.
    fn owns(&self, tag: u32) -> bool {
        match tag {
            tags::BEGIN_STRING
            | tags::BODY_LENGTH
            | tags::CHECK_SUM
            | tags::MSG_TYPE
            | tags::SENDER_COMP_ID
            | tags::TARGET_COMP_ID
            | tags::MSG_SEQ_NUM
            | tags::SENDING_TIME => true,
            tags::SENDER_SUB_ID => self.sender_sub_id.is_some(),
            tags::TARGET_SUB_ID => self.target_sub_id.is_some(),
            tags::SENDER_LOCATION_ID => self.sender_location_id.is_some(),
            tags::APPL_VER_ID => self.appl_ver_id.is_some(),
            _ => false,
        }
    }
}

/// Bidirectional transform between wire bytes and [`Message`].
pub trait MessageCodec: Send + Sync {
    /// Decodes one complete frame.
    ///
    /// # Errors
    /// Returns `DecodeError` if the frame is malformed.
    fn decode(&self, raw: &[u8]) -> Result<Message, DecodeError>;

    /// Encodes a message with the given header into a complete frame.
    ///
    /// # Errors
    /// Returns `EncodeError` if the message has no MsgType.
    fn encode(&self, message: &Message, header: &Header<'_>) -> Result<Bytes, EncodeError>;
}

/// Classic tag=value (SOH-delimited) codec.
#[derive(Debug, Clone)]
pub struct TagValueCodec {
    validate_checksum: bool,
}

impl TagValueCodec {
    /// Creates a codec that validates checksums.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            validate_checksum: true,
        }
    }

    /// Sets whether inbound checksums are validated.
    #[must_use]
    pub const fn with_checksum_validation(mut self, validate: bool) -> Self {
        self.validate_checksum = validate;
        self
    }
}

impl Default for TagValueCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageCodec for TagValueCodec {
    fn decode(&self, raw: &[u8]) -> Result<Message, DecodeError> {
        Decoder::new(raw)
            .with_checksum_validation(self.validate_checksum)
            .decode()
    }

    fn encode(&self, message: &Message, header: &Header<'_>) -> Result<Bytes, EncodeError> {
        let msg_type = message
            .get(tags::MSG_TYPE)
            .ok_or(EncodeError::MissingRequiredField {
                tag: tags::MSG_TYPE,
            })?;

        let mut encoder = Encoder::new(header.begin_string);
        encoder.put_str(tags::MSG_TYPE, msg_type);
        encoder.put_str(tags::SENDER_COMP_ID, header.sender_comp_id);
        encoder.put_str(tags::TARGET_COMP_ID, header.target_comp_id);
        encoder.put_uint(tags::MSG_SEQ_NUM, header.msg_seq_num);
        if let Some(sub_id) = header.sender_sub_id {
            encoder.put_str(tags::SENDER_SUB_ID, sub_id);
        }
        if let Some(location) = header.sender_location_id {
            encoder.put_str(tags::SENDER_LOCATION_ID, location);
        }
        if let Some(sub_id) = header.target_sub_id {
            encoder.put_str(tags::TARGET_SUB_ID, sub_id);
        }
        encoder.put_str(tags::SENDING_TIME, &header.sending_time.format_millis());
        if let Some(version) = header.appl_ver_id {
            encoder.put_str(tags::APPL_VER_ID, version);
        }

        for field in message.fields().filter(|f| !header.owns(f.tag)) {
            encoder.put_str(field.tag, &field.value);
        }

        Ok(encoder.finish())
    }
}
