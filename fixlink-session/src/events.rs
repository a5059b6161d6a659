/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session notifications.
//!
//! Observers either implement [`SessionListener`] directly or receive
//! [`SessionEvent`] values over a tokio channel.

use bytes::Bytes;
use fixlink_core::message::Message;
use tokio::sync::mpsc::UnboundedSender;

/// Details of a completed logout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoffEvent {
    /// Local CompID.
    pub sender_comp_id: String,
    /// Counterparty CompID.
    pub target_comp_id: String,
    /// Text (tag 58) of the counterparty's Logout, if any.
    pub reason: Option<String>,
}

/// Callbacks invoked synchronously from the session.
///
/// `on_data_out` fires before encoding and `on_fix_out` after, for every
/// outbound message including replays.
pub trait SessionListener: Send {
    /// A Logon was accepted; `target` is the counterparty CompID.
    fn on_logon(&mut self, _target: &str) {}

    /// The counterparty's Logout was processed.
    fn on_logoff(&mut self, _event: &LogoffEvent) {}

    /// A message is about to be encoded.
    fn on_data_out(&mut self, _message: &Message) {}

    /// A message was encoded and is about to be written.
    fn on_fix_out(&mut self, _raw: &[u8]) {}
}

/// Listener that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl SessionListener for NoopListener {}

/// Session notification delivered over a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A Logon was accepted.
    Logon {
        /// Counterparty CompID.
        target: String,
    },
    /// The counterparty's Logout was processed.
    Logoff(LogoffEvent),
    /// Outbound message before encoding.
    DataOut(Message),
    /// Outbound frame after encoding.
    FixOut(Bytes),
}

impl SessionListener for UnboundedSender<SessionEvent> {
    fn on_logon(&mut self, target: &str) {
        let _ = self.send(SessionEvent::Logon {
            target: target.to_string(),
        });
    }

    fn on_logoff(&mut self, event: &LogoffEvent) {
        let _ = self.send(SessionEvent::Logoff(event.clone()));
    }

    fn on_data_out(&mut self, message: &Message) {
        let _ = self.send(SessionEvent::DataOut(message.clone()));
    }

    fn on_fix_out(&mut self, raw: &[u8]) {
        let _ = self.send(SessionEvent::FixOut(Bytes::copy_from_slice(raw)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixlink_core::message::MsgType;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_channel_listener_forwards_events() {
        let (mut tx, mut rx) = mpsc::unbounded_channel();
        tx.on_logon("CLIENT");
        tx.on_data_out(&Message::of_type(MsgType::Heartbeat));
        tx.on_fix_out(b"8=FIX.4.4\x01");
        tx.on_logoff(&LogoffEvent {
            sender_comp_id: "SERVER".to_string(),
            target_comp_id: "CLIENT".to_string(),
            reason: Some("bye".to_string()),
        });

        assert_eq!(
            rx.recv().await,
            Some(SessionEvent::Logon {
                target: "CLIENT".to_string()
            })
        );
        assert!(matches!(rx.recv().await, Some(SessionEvent::DataOut(_))));
        assert_eq!(
            rx.recv().await,
            Some(SessionEvent::FixOut(Bytes::from_static(b"8=FIX.4.4\x01")))
        );
        match rx.recv().await {
            Some(SessionEvent::Logoff(event)) => assert_eq!(event.reason.as_deref(), Some("bye")),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_closed_channel_is_ignored() {
        let (mut tx, rx) = mpsc::unbounded_channel::<SessionEvent>();
        drop(rx);
        tx.on_logon("CLIENT");
    }
}
