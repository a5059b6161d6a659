/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Resend and gap-fill handling.
//!
//! Inbound gaps are requested in chunks of at most [`RESEND_BATCH_SIZE`]
//! messages. Outbound replays read the message log in send order, resend
//! application messages with PossDupFlag set and collapse runs of
//! administrative messages into a single gap-fill SequenceReset.

use crate::session::{Delivery, FixSession};
use fixlink_core::error::{Result, SessionError, printable};
use fixlink_core::field::tags;
use fixlink_core::message::{Message, MsgType};
use std::sync::Arc;
use tracing::{info, warn};

/// Largest range requested by one ResendRequest.
pub const RESEND_BATCH_SIZE: u64 = 2000;

/// Inbound resend cursor.
///
/// `requested` and `target` are both 0 unless a chunked request is underway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResendTracker {
    requested: u64,
    target: u64,
    in_flight: bool,
}

impl ResendTracker {
    /// Plans a resend of `[start, target)`.
    ///
    /// Returns the BeginSeqNo/EndSeqNo pair to send, where an EndSeqNo of 0
    /// means "through the latest", or `None` when a resend is already in
    /// flight or the range is empty.
    pub fn request(&mut self, start: u64, target: u64) -> Option<(u64, u64)> {
        if self.in_flight || start >= target {
            return None;
        }
        self.in_flight = true;
        if target - start <= RESEND_BATCH_SIZE {
            self.requested = 0;
            self.target = 0;
            Some((start, 0))
        } else {
            self.target = target;
            self.requested = start + RESEND_BATCH_SIZE;
            Some((start, self.requested))
        }
    }

    /// Clears the in-flight flag once ordinary traffic reaches the target.
    pub fn observe(&mut self, seq_num: u64) {
        if seq_num >= self.target {
            self.in_flight = false;
        }
    }

    /// Clears the in-flight flag so the next chunk can be requested.
    pub fn release(&mut self) {
        self.in_flight = false;
    }

    /// Returns true if a newly detected gap may be requested.
    #[must_use]
    pub const fn accepts_new_gap(&self) -> bool {
        self.target == 0 || self.requested != self.target
    }

    /// Returns true while a requested resend is being satisfied.
    #[must_use]
    pub const fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Returns the last sequence number covered by the current chunk.
    #[must_use]
    pub const fn requested(&self) -> u64 {
        self.requested
    }

    /// Returns the end of the chunked range, or 0 if none is outstanding.
    #[must_use]
    pub const fn target(&self) -> u64 {
        self.target
    }
}

/// Run of logged administrative messages waiting to become one gap-fill.
#[derive(Debug)]
struct PendingGapFill {
    first_seq: u64,
    last_seq: u64,
    orig_sending_time: Option<String>,
}

impl FixSession {
    /// Asks the counterparty to resend `[start, target)`.
    ///
    /// # Errors
    /// Returns any error from sending the ResendRequest.
    pub fn request_resend(&mut self, start: u64, target: u64) -> Result<()> {
        let Some((begin, end)) = self.resend.request(start, target) else {
            return Ok(());
        };
        info!(key = %self.key, begin, end, target, "requesting resend");
        let request = Message::of_type(MsgType::ResendRequest)
            .with(tags::BEGIN_SEQ_NO, begin)
            .with(tags::END_SEQ_NO, end);
        self.send(&request, Delivery::Live)?;
        Ok(())
    }

    /// Replays logged outbound messages with sequence numbers in
    /// `[begin, end]`.
    ///
    /// `begin` defaults to 0 and `end` to the last sent sequence number.
    ///
    /// # Errors
    /// Returns `FixError::Store` if the log cannot be opened and any error
    /// from sending a replayed message.
    pub fn resend_messages(&mut self, begin: Option<u64>, end: Option<u64>) -> Result<()> {
        let begin = begin.unwrap_or(0);
        let end = end.unwrap_or_else(|| self.record.outgoing_seq_num.saturating_sub(1));
        info!(key = %self.key, begin, end, "replaying messages");

        let log = Arc::clone(&self.log);
        let mut gap_fill: Option<PendingGapFill> = None;

        for entry in log.entries(&self.key)? {
            let raw = match entry {
                Ok(raw) => raw,
                Err(err) => {
                    warn!(key = %self.key, error = %err, "message log read failed");
                    break;
                }
            };
            let logged = match self.codec.decode(&raw) {
                Ok(logged) => logged,
                Err(err) => {
                    warn!(key = %self.key, error = %err, entry = %printable(&raw), "skipping malformed log entry");
                    continue;
                }
            };
            let (Ok(seq_num), Ok(msg_type)) = (logged.seq_num(), logged.msg_type()) else {
                warn!(key = %self.key, entry = %printable(&raw), "skipping log entry without header");
                continue;
            };

            if seq_num > end {
                break;
            }
            if seq_num < begin {
                continue;
            }

            if msg_type.is_gap_filled() {
                let pending = gap_fill.get_or_insert_with(|| PendingGapFill {
                    first_seq: seq_num,
                    last_seq: seq_num,
                    orig_sending_time: logged.get(tags::SENDING_TIME).map(str::to_string),
                });
                pending.last_seq = seq_num;
                if seq_num == end {
                    self.send_gap_fill(gap_fill.take())?;
                }
            } else {
                self.send_gap_fill(gap_fill.take())?;
                let mut resent = logged;
                if let Some(sending_time) = resent.get(tags::SENDING_TIME).map(str::to_string) {
                    resent.set(tags::ORIG_SENDING_TIME, sending_time);
                }
                resent.set(tags::POSS_DUP_FLAG, "Y");
                resent.set(tags::MSG_SEQ_NUM, seq_num);
                self.send(&resent, Delivery::Replay)?;
            }
        }

        self.send_gap_fill(gap_fill.take())
    }

    fn send_gap_fill(&mut self, pending: Option<PendingGapFill>) -> Result<()> {
        let Some(pending) = pending else {
            return Ok(());
        };
        let mut gap_fill = Message::of_type(MsgType::SequenceReset);
        if let Some(sending_time) = pending.orig_sending_time {
            gap_fill.set(tags::ORIG_SENDING_TIME, sending_time);
        }
        gap_fill.set(tags::GAP_FILL_FLAG, "Y");
        gap_fill.set(tags::MSG_SEQ_NUM, pending.first_seq);
        gap_fill.set(tags::NEW_SEQ_NO, pending.last_seq.saturating_add(1));
        self.send(&gap_fill, Delivery::Replay)?;
        Ok(())
    }

    /// Handles an inbound SequenceReset.
    pub(crate) fn on_sequence_reset(&mut self, message: &Message, raw: &[u8]) -> Result<()> {
        let value = message.get(tags::NEW_SEQ_NO);
        let Some(new_seq) = value.and_then(|v| v.parse::<u64>().ok()) else {
            let reason = "sequence reset has invalid sequence number";
            warn!(key = %self.key, value = ?value, "{reason}");
            if let Err(err) = self.logoff(Some(reason)) {
                warn!(key = %self.key, error = %err, "failed to send logout");
            }
            return Err(SessionError::InvalidSequenceReset {
                value: value.map(str::to_string),
                raw: printable(raw),
            }
            .into());
        };

        let incoming = self.record.incoming_seq_num;
        if new_seq < incoming {
            warn!(key = %self.key, new_seq, incoming, "sequence reset may not decrement sequence numbers");
            return Ok(());
        }

        let (requested, target) = (self.resend.requested(), self.resend.target());
        if new_seq > target && requested != target {
            self.record.incoming_seq_num = requested + 1;
            self.resend.release();
            self.request_resend(requested + 1, target)?;
        } else {
            self.record.incoming_seq_num = new_seq;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{Harness, app, inbound};
    use fixlink_core::error::FixError;
    use fixlink_store::MessageLog;

    fn app_out(tag11: &str) -> Message {
        Message::of_type(MsgType::Application("D".to_string())).with(11, tag11)
    }

    fn resend_request(begin: u64, end: u64) -> Message {
        Message::of_type(MsgType::ResendRequest)
            .with(tags::BEGIN_SEQ_NO, begin)
            .with(tags::END_SEQ_NO, end)
    }

    fn sequence_reset(new_seq: &str) -> Message {
        Message::of_type(MsgType::SequenceReset).with(tags::NEW_SEQ_NO, new_seq)
    }

    #[test]
    fn test_request_small_range_clears_cursor() {
        let mut tracker = ResendTracker::default();
        assert_eq!(tracker.request(1, 1500), Some((1, 0)));
        assert!(tracker.in_flight());
        assert_eq!((tracker.requested(), tracker.target()), (0, 0));
        assert_eq!(tracker.request(1, 1500), None);
    }

    #[test]
    fn test_request_large_range_is_chunked() {
        let mut tracker = ResendTracker::default();
        assert_eq!(tracker.request(1, 5000), Some((1, 2001)));
        assert_eq!((tracker.requested(), tracker.target()), (2001, 5000));
        assert!(tracker.accepts_new_gap());

        tracker.observe(4999);
        assert!(tracker.in_flight());
        tracker.observe(5000);
        assert!(!tracker.in_flight());
    }

    #[test]
    fn test_request_empty_range_is_noop() {
        let mut tracker = ResendTracker::default();
        assert_eq!(tracker.request(5, 5), None);
        assert_eq!(tracker.request(6, 5), None);
        assert!(!tracker.in_flight());
    }

    #[test]
    fn test_session_request_resend_wire_bounds() {
        let mut h = Harness::logged_on_acceptor();
        h.session.request_resend(1, 5000).unwrap();
        h.session.request_resend(1, 5000).unwrap();

        let sent = h.transport.take_sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].get(tags::BEGIN_SEQ_NO), Some("1"));
        assert_eq!(sent[0].get(tags::END_SEQ_NO), Some("2001"));
    }

    #[test]
    fn test_replay_collapses_admin_runs() {
        let mut h = Harness::logged_on_acceptor();
        h.session.send(&app_out("A1"), Delivery::Live).unwrap();
        h.session.send(&app_out("A2"), Delivery::Live).unwrap();
        h.session
            .send(&Message::of_type(MsgType::Heartbeat), Delivery::Live)
            .unwrap();
        let live = h.transport.take_sent();
        assert_eq!(live.len(), 3);
        let outgoing = h.session.record().outgoing_seq_num;

        h.session.decode(&inbound(resend_request(1, 4), 2)).unwrap();

        let sent = h.transport.take_sent();
        assert_eq!(sent.len(), 4);

        assert_eq!(sent[0].msg_type().unwrap(), MsgType::SequenceReset);
        assert_eq!(sent[0].get(tags::GAP_FILL_FLAG), Some("Y"));
        assert_eq!(sent[0].seq_num().unwrap(), 1);
        assert_eq!(sent[0].get(tags::NEW_SEQ_NO), Some("2"));
        assert!(sent[0].contains(tags::ORIG_SENDING_TIME));

        for (msg, (seq, id)) in sent[1..3].iter().zip([(2, "A1"), (3, "A2")]) {
            assert_eq!(msg.msg_type().unwrap(), MsgType::Application("D".to_string()));
            assert_eq!(msg.seq_num().unwrap(), seq);
            assert_eq!(msg.get(11), Some(id));
            assert!(msg.is_poss_dup());
            assert!(msg.contains(tags::ORIG_SENDING_TIME));
        }

        assert_eq!(sent[3].msg_type().unwrap(), MsgType::SequenceReset);
        assert_eq!(sent[3].seq_num().unwrap(), 4);
        assert_eq!(sent[3].get(tags::NEW_SEQ_NO), Some("5"));

        assert_eq!(h.session.record().outgoing_seq_num, outgoing);
    }

    #[test]
    fn test_replay_merges_consecutive_admin_messages() {
        let mut h = Harness::logged_on_acceptor();
        for _ in 0..3 {
            h.session
                .send(&Message::of_type(MsgType::Heartbeat), Delivery::Live)
                .unwrap();
        }
        h.session.send(&app_out("A1"), Delivery::Live).unwrap();
        h.transport.take_sent();

        h.session.resend_messages(Some(1), None).unwrap();

        let sent = h.transport.take_sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].seq_num().unwrap(), 1);
        assert_eq!(sent[0].get(tags::NEW_SEQ_NO), Some("5"));
        assert_eq!(sent[1].seq_num().unwrap(), 5);
        assert!(sent[1].is_poss_dup());
    }

    #[test]
    fn test_replay_stops_after_end() {
        let mut h = Harness::logged_on_acceptor();
        for id in ["A1", "A2", "A3"] {
            h.session.send(&app_out(id), Delivery::Live).unwrap();
        }
        h.transport.take_sent();

        h.session.resend_messages(Some(2), Some(3)).unwrap();

        let sent = h.transport.take_sent();
        let seqs: Vec<u64> = sent.iter().map(|m| m.seq_num().unwrap()).collect();
        assert_eq!(seqs, vec![2, 3]);
    }

    #[test]
    fn test_replay_flushes_trailing_gap_fill() {
        let mut h = Harness::logged_on_acceptor();
        h.session.send(&app_out("A1"), Delivery::Live).unwrap();
        h.session
            .send(&Message::of_type(MsgType::Heartbeat), Delivery::Live)
            .unwrap();
        h.transport.take_sent();

        h.session.resend_messages(Some(2), Some(100)).unwrap();

        let sent = h.transport.take_sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].is_poss_dup());
        assert_eq!(sent[1].msg_type().unwrap(), MsgType::SequenceReset);
        assert_eq!(sent[1].get(tags::NEW_SEQ_NO), Some("4"));
    }

    #[test]
    fn test_resend_request_end_zero_means_latest() {
        let mut h = Harness::logged_on_acceptor();
        h.session.send(&app_out("A1"), Delivery::Live).unwrap();
        h.transport.take_sent();

        h.session.decode(&inbound(resend_request(2, 0), 2)).unwrap();

        let sent = h.transport.take_sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].get(11), Some("A1"));
    }

    #[test]
    fn test_replay_skips_malformed_entries() {
        let mut h = Harness::logged_on_acceptor();
        h.log.append("SERVER-CLIENT", b"garbage").unwrap();
        h.session.send(&app_out("A1"), Delivery::Live).unwrap();
        h.transport.take_sent();

        h.session.resend_messages(None, None).unwrap();

        let sent = h.transport.take_sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].get(11), Some("A1"));
    }

    #[test]
    fn test_sequence_reset_sets_incoming() {
        let mut h = Harness::logged_on_acceptor();
        h.session.decode(&inbound(sequence_reset("10"), 2)).unwrap();
        assert_eq!(h.session.record().incoming_seq_num, 10);
    }

    #[test]
    fn test_sequence_reset_never_decrements() {
        let mut h = Harness::logged_on_acceptor();
        for seq in 2..=5 {
            h.session.decode(&app(seq)).unwrap();
        }
        h.session.decode(&inbound(sequence_reset("3"), 6)).unwrap();
        assert_eq!(h.session.record().incoming_seq_num, 6);
        assert!(h.transport.take_sent().is_empty());
    }

    #[test]
    fn test_sequence_reset_invalid_value_is_fatal() {
        let mut h = Harness::logged_on_acceptor();
        let result = h.session.decode(&inbound(sequence_reset("abc"), 2));
        assert!(matches!(
            result,
            Err(FixError::Session(SessionError::InvalidSequenceReset { value: Some(v), .. })) if v == "abc"
        ));
        let sent = h.transport.take_sent();
        assert_eq!(sent[0].msg_type().unwrap(), MsgType::Logout);

        let mut h = Harness::logged_on_acceptor();
        let result = h
            .session
            .decode(&inbound(Message::of_type(MsgType::SequenceReset), 2));
        assert!(matches!(
            result,
            Err(FixError::Session(SessionError::InvalidSequenceReset { value: None, .. }))
        ));
    }

    #[test]
    fn test_sequence_reset_continues_chunked_resend() {
        let mut h = Harness::logged_on_acceptor();
        h.session.decode(&app(5002)).unwrap();
        let sent = h.transport.take_sent();
        assert_eq!(sent[0].get(tags::BEGIN_SEQ_NO), Some("2"));
        assert_eq!(sent[0].get(tags::END_SEQ_NO), Some("2002"));
        assert_eq!(h.session.record().incoming_seq_num, 5003);

        h.session
            .decode(&inbound(sequence_reset("6000"), 2003))
            .unwrap();

        assert_eq!(h.session.record().incoming_seq_num, 2003);
        let sent = h.transport.take_sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].get(tags::BEGIN_SEQ_NO), Some("2003"));
        assert_eq!(sent[0].get(tags::END_SEQ_NO), Some("4003"));
    }
}
