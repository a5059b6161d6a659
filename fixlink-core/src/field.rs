/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Field definitions for FIX messages.
//!
//! This module provides:
//! - [`Field`]: A single owned `tag=value` pair
//! - [`tags`]: Constants for the header and session-level tags the engine inspects

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known FIX tag numbers used by the session layer.
pub mod tags {
    /// BeginSeqNo (7).
    pub const BEGIN_SEQ_NO: u32 = 7;
    /// BeginString (8).
    pub const BEGIN_STRING: u32 = 8;
    /// BodyLength (9).
    pub const BODY_LENGTH: u32 = 9;
    /// CheckSum (10).
    pub const CHECK_SUM: u32 = 10;
    /// EndSeqNo (16).
    pub const END_SEQ_NO: u32 = 16;
    /// MsgSeqNum (34).
    pub const MSG_SEQ_NUM: u32 = 34;
    /// MsgType (35).
    pub const MSG_TYPE: u32 = 35;
    /// NewSeqNo (36).
    pub const NEW_SEQ_NO: u32 = 36;
    /// PossDupFlag (43).
    pub const POSS_DUP_FLAG: u32 = 43;
    /// SenderCompID (49).
    pub const SENDER_COMP_ID: u32 = 49;
    /// SenderSubID (50).
    pub const SENDER_SUB_ID: u32 = 50;
    /// SendingTime (52).
    pub const SENDING_TIME: u32 = 52;
    /// TargetCompID (56).
    pub const TARGET_COMP_ID: u32 = 56;
    /// TargetSubID (57).
    pub const TARGET_SUB_ID: u32 = 57;
    /// Text (58).
    pub const TEXT: u32 = 58;
    /// EncryptMethod (98).
    pub const ENCRYPT_METHOD: u32 = 98;
    /// HeartBtInt (108).
    pub const HEART_BT_INT: u32 = 108;
    /// TestReqID (112).
    pub const TEST_REQ_ID: u32 = 112;
    /// OrigSendingTime (122).
    pub const ORIG_SENDING_TIME: u32 = 122;
    /// GapFillFlag (123).
    pub const GAP_FILL_FLAG: u32 = 123;
    /// SenderLocationID (142).
    pub const SENDER_LOCATION_ID: u32 = 142;
    /// LastMsgSeqNumProcessed (369).
    pub const LAST_MSG_SEQ_NUM_PROCESSED: u32 = 369;
    /// NextExpectedMsgSeqNum (789).
    pub const NEXT_EXPECTED_MSG_SEQ_NUM: u32 = 789;
    /// ApplVerID (1128).
    pub const APPL_VER_ID: u32 = 1128;
}

/// A single `tag=value` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// The field tag number.
    pub tag: u32,
    /// The field value as sent on the wire.
    pub value: String,
}

impl Field {
    /// Creates a new field.
    #[must_use]
    pub fn new(tag: u32, value: impl Into<String>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    /// Returns the value as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Returns true if the value is the FIX boolean `Y`.
    #[inline]
    #[must_use]
    pub fn is_yes(&self) -> bool {
        self.value == "Y"
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.tag, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_display() {
        let field = Field::new(tags::MSG_TYPE, "A");
        assert_eq!(field.to_string(), "35=A");
    }

    #[test]
    fn test_field_is_yes() {
        assert!(Field::new(tags::POSS_DUP_FLAG, "Y").is_yes());
        assert!(!Field::new(tags::POSS_DUP_FLAG, "N").is_yes());
    }
}
