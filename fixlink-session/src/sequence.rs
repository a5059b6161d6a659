/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Inbound sequence number checks.

use crate::session::FixSession;
use fixlink_core::error::{Result, SessionError, printable};
use fixlink_core::message::{Message, MsgType};
use tracing::{error, warn};

/// Result of comparing a received sequence number to the expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceResult {
    /// Sequence number is as expected.
    Ok,
    /// Sequence number is lower than expected (possible duplicate).
    TooLow {
        /// Expected sequence number.
        expected: u64,
        /// Received sequence number.
        received: u64,
    },
    /// Sequence number is higher than expected (gap detected).
    Gap {
        /// Expected sequence number.
        expected: u64,
        /// Received sequence number.
        received: u64,
    },
}

impl SequenceResult {
    /// Classifies `received` against `expected`.
    #[must_use]
    pub const fn classify(expected: u64, received: u64) -> Self {
        if received == expected {
            Self::Ok
        } else if received < expected {
            Self::TooLow { expected, received }
        } else {
            Self::Gap { expected, received }
        }
    }

    /// Returns true if the sequence is valid.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Returns true if there's a gap.
    #[must_use]
    pub const fn is_gap(&self) -> bool {
        matches!(self, Self::Gap { .. })
    }

    /// Returns true if the sequence is too low.
    #[must_use]
    pub const fn is_too_low(&self) -> bool {
        matches!(self, Self::TooLow { .. })
    }
}

impl FixSession {
    /// Validates and advances the inbound sequence number.
    ///
    /// SequenceReset and Logout are left to their own handlers. PossDup
    /// messages skip the gap and duplicate checks but still advance while a
    /// resend is being satisfied.
    pub(crate) fn check_sequence(
        &mut self,
        msg_type: &MsgType,
        seq_num: u64,
        message: &Message,
        raw: &[u8],
    ) -> Result<()> {
        let own_handling = matches!(msg_type, MsgType::SequenceReset | MsgType::Logout);
        if own_handling {
            return Ok(());
        }

        if !message.is_poss_dup() {
            self.resend.observe(seq_num);
            match SequenceResult::classify(self.record.incoming_seq_num, seq_num) {
                SequenceResult::TooLow { expected, received } if !self.resend.in_flight() => {
                    let reason =
                        format!("incoming sequence number {received} lower than expected {expected}");
                    error!(key = %self.key, expected, received, "{reason}");
                    if let Err(err) = self.logoff(Some(&reason)) {
                        warn!(key = %self.key, error = %err, "failed to send logout");
                    }
                    return Err(SessionError::SequenceTooLow {
                        expected,
                        received,
                        raw: printable(raw),
                    }
                    .into());
                }
                SequenceResult::Gap { expected, received } if self.resend.accepts_new_gap() => {
                    self.request_resend(expected, received)?;
                }
                _ => {}
            }
        }

        let incoming = self.record.incoming_seq_num;
        if seq_num == incoming || self.resend.in_flight() {
            self.record.incoming_seq_num = incoming.max(seq_num.saturating_add(1));
        }
        Ok(())
    }
}
