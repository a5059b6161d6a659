/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Message types for the FIX session layer.
//!
//! This module provides:
//! - [`MsgType`]: Session-level message types, with everything else carried as
//!   an application type
//! - [`Message`]: An ordered `tag -> value` map, the unit the codec produces and
//!   consumes

use crate::error::DecodeError;
use crate::field::{Field, tags};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// FIX message types the session layer distinguishes.
///
/// Business messages are opaque to the session and are carried as
/// [`MsgType::Application`] with their wire value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MsgType {
    /// Heartbeat (0).
    Heartbeat,
    /// Test Request (1).
    TestRequest,
    /// Resend Request (2).
    ResendRequest,
    /// Reject (3).
    Reject,
    /// Sequence Reset (4).
    SequenceReset,
    /// Logout (5).
    Logout,
    /// Logon (A).
    Logon,
    /// Any other message type, by wire value.
    Application(String),
}

impl FromStr for MsgType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "0" => Self::Heartbeat,
            "1" => Self::TestRequest,
            "2" => Self::ResendRequest,
            "3" => Self::Reject,
            "4" => Self::SequenceReset,
            "5" => Self::Logout,
            "A" => Self::Logon,
            other => Self::Application(other.to_string()),
        })
    }
}

impl MsgType {
    /// Returns the wire value of this message type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Heartbeat => "0",
            Self::TestRequest => "1",
            Self::ResendRequest => "2",
            Self::Reject => "3",
            Self::SequenceReset => "4",
            Self::Logout => "5",
            Self::Logon => "A",
            Self::Application(s) => s.as_str(),
        }
    }

    /// Returns true if a replay collapses this type into a gap-fill instead of
    /// resending it.
    ///
    /// Reject is deliberately absent: it is resent like application traffic.
    #[must_use]
    pub fn is_gap_filled(&self) -> bool {
        matches!(
            self,
            Self::Logon
                | Self::Logout
                | Self::ResendRequest
                | Self::Heartbeat
                | Self::TestRequest
                | Self::SequenceReset
        )
    }

    /// Returns true if this is a session-level message.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        !matches!(self, Self::Application(_))
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered `tag -> value` FIX message.
///
/// Fields keep insertion order. [`Message::set`] replaces the first field with
/// the same tag in place, so header stamping never reorders a body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    fields: SmallVec<[Field; 16]>,
}

impl Message {
    /// Creates an empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a message with only its MsgType set.
    #[must_use]
    pub fn of_type(msg_type: MsgType) -> Self {
        let mut msg = Self::new();
        msg.set(tags::MSG_TYPE, msg_type.as_str());
        msg
    }

    /// Sets a field and returns the message, for chained construction.
    #[must_use]
    pub fn with(mut self, tag: u32, value: impl ToString) -> Self {
        self.set(tag, value);
        self
    }

    /// Sets a field, replacing an existing value for the same tag.
    pub fn set(&mut self, tag: u32, value: impl ToString) {
        let value = value.to_string();
        match self.fields.iter_mut().find(|f| f.tag == tag) {
            Some(field) => field.value = value,
            None => self.fields.push(Field { tag, value }),
        }
    }

    /// Appends a field without checking for an existing tag.
    ///
    /// Used by decoders so repeating groups survive a round trip.
    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Removes the first field with the given tag and returns its value.
    pub fn remove(&mut self, tag: u32) -> Option<String> {
        let idx = self.fields.iter().position(|f| f.tag == tag)?;
        Some(self.fields.remove(idx).value)
    }

    /// Gets a field value by tag.
    #[must_use]
    pub fn get(&self, tag: u32) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.tag == tag)
            .map(|f| f.value.as_str())
    }

    /// Returns true if the message carries the tag.
    #[must_use]
    pub fn contains(&self, tag: u32) -> bool {
        self.fields.iter().any(|f| f.tag == tag)
    }

    /// Gets a required field parsed as `T`.
    ///
    /// # Errors
    /// Returns `DecodeError` if the field is missing or does not parse.
    pub fn get_as<T: FromStr>(&self, tag: u32) -> Result<T, DecodeError> {
        self.get_opt_as(tag)?
            .ok_or(DecodeError::MissingRequiredField { tag })
    }

    /// Gets an optional field parsed as `T`.
    ///
    /// # Errors
    /// Returns `DecodeError` if the field is present but does not parse.
    pub fn get_opt_as<T: FromStr>(&self, tag: u32) -> Result<Option<T>, DecodeError> {
        match self.get(tag) {
            None => Ok(None),
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| DecodeError::InvalidFieldValue {
                    tag,
                    reason: format!("cannot parse {value:?}"),
                }),
        }
    }

    /// Returns the message type.
    ///
    /// # Errors
    /// Returns `DecodeError::MissingMsgType` if tag 35 is absent.
    pub fn msg_type(&self) -> Result<MsgType, DecodeError> {
        let value = self.get(tags::MSG_TYPE).ok_or(DecodeError::MissingMsgType)?;
        Ok(value.parse().unwrap_or_else(|never| match never {}))
    }

    /// Returns the MsgSeqNum (tag 34).
    ///
    /// # Errors
    /// Returns `DecodeError` if the field is missing or not numeric.
    pub fn seq_num(&self) -> Result<u64, DecodeError> {
        self.get_as(tags::MSG_SEQ_NUM)
    }

    /// Returns true if PossDupFlag (tag 43) is `Y`.
    #[must_use]
    pub fn is_poss_dup(&self) -> bool {
        self.get(tags::POSS_DUP_FLAG) == Some("Y")
    }

    /// Returns an iterator over all fields in order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Returns the number of fields.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the message has no fields.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<Field> for Message {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            write!(f, "{field}|")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msg_type_from_str() {
        assert_eq!("0".parse::<MsgType>().unwrap(), MsgType::Heartbeat);
        assert_eq!("A".parse::<MsgType>().unwrap(), MsgType::Logon);
        assert_eq!(
            "D".parse::<MsgType>().unwrap(),
            MsgType::Application("D".to_string())
        );
    }

    #[test]
    fn test_msg_type_gap_filled() {
        assert!(MsgType::Logon.is_gap_filled());
        assert!(MsgType::Heartbeat.is_gap_filled());
        assert!(MsgType::SequenceReset.is_gap_filled());
        assert!(!MsgType::Reject.is_gap_filled());
        assert!(!MsgType::Application("8".to_string()).is_gap_filled());
        assert!(MsgType::Reject.is_admin());
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut msg = Message::of_type(MsgType::Heartbeat)
            .with(tags::MSG_SEQ_NUM, 4)
            .with(tags::TEST_REQ_ID, "abc");
        msg.set(tags::MSG_SEQ_NUM, 9);

        let order: Vec<u32> = msg.fields().map(|f| f.tag).collect();
        assert_eq!(order, vec![35, 34, 112]);
        assert_eq!(msg.get(tags::MSG_SEQ_NUM), Some("9"));
    }

    #[test]
    fn test_typed_access() {
        let msg = Message::of_type(MsgType::SequenceReset)
            .with(tags::MSG_SEQ_NUM, 12)
            .with(tags::NEW_SEQ_NO, "abc");

        assert_eq!(msg.seq_num().unwrap(), 12);
        assert!(matches!(
            msg.get_as::<u64>(tags::NEW_SEQ_NO),
            Err(DecodeError::InvalidFieldValue { tag: 36, .. })
        ));
        assert_eq!(msg.get_opt_as::<u64>(tags::END_SEQ_NO).unwrap(), None);
        assert!(matches!(
            msg.get_as::<u64>(tags::BEGIN_SEQ_NO),
            Err(DecodeError::MissingRequiredField { tag: 7 })
        ));
    }

    #[test]
    fn test_missing_msg_type() {
        let msg = Message::new().with(tags::MSG_SEQ_NUM, 1);
        assert_eq!(msg.msg_type(), Err(DecodeError::MissingMsgType));
    }

    #[test]
    fn test_poss_dup_and_remove() {
        let mut msg = Message::of_type(MsgType::Application("D".to_string()))
            .with(tags::POSS_DUP_FLAG, "Y");
        assert!(msg.is_poss_dup());
        assert_eq!(msg.remove(tags::POSS_DUP_FLAG).as_deref(), Some("Y"));
        assert!(!msg.is_poss_dup());
        assert_eq!(msg.to_string(), "35=D|");
    }
}
