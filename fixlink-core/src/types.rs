/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Core types for FIX session operations.
//!
//! - [`Timestamp`]: UTC timestamp rendered in FIX `SendingTime` format
//! - [`SessionKey`]: Counterparty pair identity used to key persisted state

use arrayvec::ArrayString;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// FIX protocol timestamp with nanosecond precision.
///
/// Rendered as `YYYYMMDD-HH:MM:SS.sss` in SendingTime (tag 52).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Nanoseconds since Unix epoch (1970-01-01 00:00:00 UTC).
    nanos_since_epoch: u64,
}

impl Timestamp {
    /// Creates a timestamp from milliseconds since Unix epoch.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self {
            nanos_since_epoch: millis * 1_000_000,
        }
    }

    /// Returns the current UTC timestamp.
    #[inline]
    #[must_use]
    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    /// Returns milliseconds since Unix epoch.
    #[inline]
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.nanos_since_epoch / 1_000_000
    }

    /// Converts to a chrono `DateTime<Utc>`.
    #[must_use]
    pub fn to_datetime(self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.nanos_since_epoch as i64)
    }

    /// Formats the timestamp in FIX format with millisecond precision.
    #[must_use]
    pub fn format_millis(self) -> ArrayString<21> {
        let mut buf = ArrayString::new();
        let _ = fmt::write(
            &mut buf,
            format_args!("{}", self.to_datetime().format("%Y%m%d-%H:%M:%S%.3f")),
        );
        buf
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self {
            nanos_since_epoch: dt.timestamp_nanos_opt().unwrap_or(0) as u64,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_millis())
    }
}

/// Identity of one logical session across reconnects.
///
/// Seen from the local side: `sender` is our CompID, `target` the
/// counterparty's. Rendered as `sender-target`, which is also the storage key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    /// Local CompID (SenderCompID on outbound messages).
    pub sender: String,
    /// Remote CompID (TargetCompID on outbound messages).
    pub target: String,
}

impl SessionKey {
    /// Creates a new session key.
    #[must_use]
    pub fn new(sender: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.sender, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_format() {
        let ts = Timestamp::from_millis(1_234);
        assert_eq!(ts.format_millis().as_str(), "19700101-00:00:01.234");
        assert_eq!(ts.as_millis(), 1_234);
    }

    #[test]
    fn test_session_key_display() {
        let key = SessionKey::new("SERVER", "CLIENT");
        assert_eq!(key.to_string(), "SERVER-CLIENT");
    }
}
