/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Heartbeat and TestRequest supervision.
//!
//! The supervisor only keeps clocks and decides. The session turns its
//! decisions into Heartbeat and TestRequest messages on every timer tick,
//! which fires at half the negotiated interval.

use crate::session::{Delivery, FixSession};
use fixlink_core::error::{Result, SessionError};
use fixlink_core::field::tags;
use fixlink_core::message::{Message, MsgType};
use std::time::{Duration, Instant};
use tracing::warn;

/// What one timer tick asks the session to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeartbeatActions {
    /// Send a Heartbeat.
    pub send_heartbeat: bool,
    /// Send a TestRequest with this TestReqID.
    pub test_request: Option<u64>,
    /// Report a timeout after this much inbound silence.
    pub timeout: Option<Duration>,
}

/// Tracks liveness of both directions of a session.
#[derive(Debug)]
pub struct HeartbeatSupervisor {
    /// Negotiated interval. `None` until a Logon starts the timer.
    interval: Option<Duration>,
    send_heartbeats: bool,
    expect_heartbeats: bool,
    last_inbound: Instant,
    last_outbound: Instant,
    last_heartbeat: Instant,
    next_test_req_id: u64,
}

impl HeartbeatSupervisor {
    /// Creates a stopped supervisor.
    #[must_use]
    pub fn new(send_heartbeats: bool, expect_heartbeats: bool) -> Self {
        let now = Instant::now();
        Self {
            interval: None,
            send_heartbeats,
            expect_heartbeats,
            last_inbound: now,
            last_outbound: now,
            last_heartbeat: now,
            next_test_req_id: 1,
        }
    }

    /// Starts supervision with the negotiated interval.
    pub fn start(&mut self, interval: Duration, now: Instant) {
        self.interval = Some(interval);
        self.last_inbound = now;
        self.last_outbound = now;
        self.last_heartbeat = now;
    }

    /// Stops supervision.
    pub fn stop(&mut self) {
        self.interval = None;
    }

    /// Returns the negotiated interval, if running.
    #[must_use]
    pub const fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Returns the timer period: half the interval.
    #[must_use]
    pub fn tick_period(&self) -> Option<Duration> {
        self.interval.map(|interval| interval / 2)
    }

    /// Records inbound traffic.
    #[inline]
    pub fn on_inbound(&mut self, now: Instant) {
        self.last_inbound = now;
    }

    /// Records outbound traffic.
    #[inline]
    pub fn on_outbound(&mut self, now: Instant) {
        self.last_outbound = now;
    }

    /// Records that a Heartbeat went out.
    #[inline]
    pub fn on_heartbeat_sent(&mut self, now: Instant) {
        self.last_heartbeat = now;
    }

    /// Decides what the tick at `now` must do.
    ///
    /// Every TestRequest it asks for consumes a fresh TestReqID.
    pub fn poll(&mut self, now: Instant) -> HeartbeatActions {
        let Some(interval) = self.interval else {
            return HeartbeatActions::default();
        };

        let idle_out = now.saturating_duration_since(self.last_heartbeat.max(self.last_outbound));
        let silence = now.saturating_duration_since(self.last_inbound);

        let send_heartbeat = self.send_heartbeats && idle_out > interval;
        let test_request = (self.expect_heartbeats && silence > interval * 3 / 2).then(|| {
            let id = self.next_test_req_id;
            self.next_test_req_id += 1;
            id
        });
        let timeout = (self.expect_heartbeats && silence > interval * 2).then_some(silence);

        HeartbeatActions {
            send_heartbeat,
            test_request,
            timeout,
        }
    }
}

impl FixSession {
    /// Runs one heartbeat timer tick.
    ///
    /// A timeout is reported to the transport and logged; the session stays
    /// connected.
    ///
    /// # Errors
    /// Returns any error from sending the Heartbeat or TestRequest.
    pub fn on_heartbeat_tick(&mut self, now: Instant) -> Result<()> {
        let actions = self.heartbeat.poll(now);

        if actions.send_heartbeat {
            self.send(&Message::of_type(MsgType::Heartbeat), Delivery::Live)?;
            self.heartbeat.on_heartbeat_sent(now);
        }
        if let Some(id) = actions.test_request {
            let test_request =
                Message::of_type(MsgType::TestRequest).with(tags::TEST_REQ_ID, id);
            self.send(&test_request, Delivery::Live)?;
        }
        if let Some(silence) = actions.timeout {
            let elapsed_ms = u64::try_from(silence.as_millis()).unwrap_or(u64::MAX);
            warn!(key = %self.key, elapsed_ms, "no heartbeat from counterparty");
            self.transport.report_error(
                SessionError::HeartbeatTimeout {
                    target: self.target_comp_id.clone(),
                    elapsed_ms,
                }
                .into(),
            );
        }
        Ok(())
    }
}
