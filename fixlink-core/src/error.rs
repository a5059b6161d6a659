/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Error types for the fixlink session engine.
//!
//! Every layer owns one `thiserror` enum; [`FixError`] unifies them so the
//! session dispatcher can propagate any failure with `?`.

use thiserror::Error;

/// Result type alias using [`FixError`] as the error type.
pub type Result<T> = std::result::Result<T, FixError>;

/// Top-level error type for all fixlink operations.
#[derive(Debug, Error)]
pub enum FixError {
    /// Error during message decoding.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Error during message encoding.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Error in session layer operations.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Error in the session store or message log.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error from the underlying transport.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl FixError {
    /// Returns true if this error aborts the session exchange.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Session(err) => err.is_fatal(),
            Self::Decode(_) | Self::Io(_) => true,
            Self::Encode(_) | Self::Store(_) => false,
        }
    }
}

/// Errors that occur during FIX message decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Message buffer is incomplete.
    #[error("incomplete message")]
    Incomplete,

    /// Invalid BeginString field (tag 8).
    #[error("invalid begin string: expected 8=FIX.x.y")]
    InvalidBeginString,

    /// Missing BodyLength field (tag 9).
    #[error("missing body length field (tag 9)")]
    MissingBodyLength,

    /// Invalid BodyLength value.
    #[error("invalid body length value")]
    InvalidBodyLength,

    /// Missing MsgType field (tag 35).
    #[error("missing msg type field (tag 35)")]
    MissingMsgType,

    /// Checksum mismatch between calculated and declared values.
    #[error("checksum mismatch: calculated {calculated}, declared {declared}")]
    ChecksumMismatch {
        /// Calculated checksum value.
        calculated: u8,
        /// Declared checksum value in message.
        declared: u8,
    },

    /// A `tag=value` pair could not be split or the tag is not numeric.
    #[error("malformed field near byte {offset}")]
    MalformedField {
        /// Byte offset where parsing stopped.
        offset: usize,
    },

    /// Missing required field.
    #[error("missing required field: tag {tag}")]
    MissingRequiredField {
        /// The tag number of the missing field.
        tag: u32,
    },

    /// Invalid field value for the expected type.
    #[error("invalid field value for tag {tag}: {reason}")]
    InvalidFieldValue {
        /// The tag number of the field.
        tag: u32,
        /// Description of why the value is invalid.
        reason: String,
    },

    /// Invalid UTF-8 in a field value.
    #[error("invalid utf-8 in field: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Errors that occur during FIX message encoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Missing required field during encoding.
    #[error("missing required field: tag {tag}")]
    MissingRequiredField {
        /// The tag number of the missing field.
        tag: u32,
    },

    /// Invalid field value for encoding.
    #[error("invalid field value for tag {tag}: {reason}")]
    InvalidFieldValue {
        /// The tag number of the field.
        tag: u32,
        /// Description of why the value is invalid.
        reason: String,
    },

    /// Session identity needed for the standard header is not known yet.
    #[error("session header incomplete: {0} not set")]
    HeaderIncomplete(&'static str),
}

/// Errors in FIX session layer operations.
///
/// Raw messages are rendered with `|` in place of SOH.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The first inbound message of a session was neither Logon nor Logout.
    #[error("first message must be logon: {raw}")]
    FirstMessageNotLogon {
        /// Offending raw message.
        raw: String,
    },

    /// The counterparty pair already has a logged-in session.
    #[error("session {key} already logged in: {raw}")]
    AlreadyLoggedIn {
        /// Counterparty pair key (`sender-target`).
        key: String,
        /// Offending raw message.
        raw: String,
    },

    /// The authenticity predicate rejected the Logon.
    #[error("session not authentic: {raw}")]
    NotAuthentic {
        /// Offending raw message.
        raw: String,
    },

    /// Inbound sequence number below expected while no resend is outstanding.
    #[error("incoming sequence number {received} lower than expected {expected}: {raw}")]
    SequenceTooLow {
        /// Expected sequence number.
        expected: u64,
        /// Received sequence number.
        received: u64,
        /// Offending raw message.
        raw: String,
    },

    /// SequenceReset carried a missing or non-numeric NewSeqNo.
    #[error("sequence reset has invalid sequence number {value:?}: {raw}")]
    InvalidSequenceReset {
        /// The NewSeqNo value as received, if any.
        value: Option<String>,
        /// Offending raw message.
        raw: String,
    },

    /// Nothing received from the counterparty for too long.
    #[error("no heartbeat from {target} in {elapsed_ms} milliseconds")]
    HeartbeatTimeout {
        /// Counterparty CompID.
        target: String,
        /// Elapsed time in milliseconds since last inbound message.
        elapsed_ms: u64,
    },

    /// Session configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Connection error.
    #[error("connection error: {0}")]
    Connection(String),
}

impl SessionError {
    /// Returns true if this error aborts the session exchange.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::HeartbeatTimeout { .. })
    }
}

/// Errors in session store and message log operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Persisted record could not be read back.
    #[error("store corrupted for key {key}: {reason}")]
    Corrupted {
        /// Counterparty pair key.
        key: String,
        /// Description of the corruption.
        reason: String,
    },

    /// Record could not be serialized.
    #[error("failed to serialize record for key {key}: {reason}")]
    Serialize {
        /// Counterparty pair key.
        key: String,
        /// Reason for failure.
        reason: String,
    },

    /// I/O error in a persistent store.
    #[error("store i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Renders raw FIX bytes for error messages, replacing SOH with `|`.
#[must_use]
pub fn printable(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).replace('\x01', "|")
}
