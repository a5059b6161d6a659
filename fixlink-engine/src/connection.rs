/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! One TCP connection driving one session.
//!
//! The session is owned by a single driver task that multiplexes inbound
//! frames, the heartbeat timer, the persistence timer and caller commands.
//! Writes are queued to a separate writer task so the session never waits on
//! the socket.

use bytes::{Bytes, BytesMut};
use fixlink_core::error::{FixError, Result, SessionError};
use fixlink_core::message::Message;
use fixlink_session::{
    Delivery, FixSession, LogoffEvent, SessionBuilder, SessionEvent, SessionListener,
    SessionRecord, SessionReset, Transport,
};
use fixlink_transport::FixCodec;
use std::io;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior, interval_at};
use tokio_util::codec::Decoder;
use tracing::{debug, error, info, warn};

const READ_BUFFER_SIZE: usize = 4096;

/// Notification from a running connection.
#[derive(Debug)]
pub enum EngineEvent {
    /// Inbound message that passed the session checks.
    Message(Message),
    /// Session notification.
    Session(SessionEvent),
    /// Error surfaced by the session or the connection.
    Error(FixError),
    /// The connection closed and the session was torn down.
    Closed,
}

/// Caller request executed on the driver task.
#[derive(Debug)]
enum Command {
    Send(Message),
    Logon(Option<Message>),
    Logoff(Option<String>),
    Reset(SessionReset, oneshot::Sender<Result<SessionRecord>>),
    RequestResend(u64, u64),
}

/// Item queued for the writer task.
#[derive(Debug)]
enum Outbound {
    Frame(Bytes),
    Close,
}

/// [`Transport`] backed by the writer task's queue.
#[derive(Debug)]
pub struct ChannelTransport {
    frames: mpsc::UnboundedSender<Outbound>,
    events: mpsc::UnboundedSender<EngineEvent>,
    remote_addr: Option<SocketAddr>,
    closed: bool,
}

impl Transport for ChannelTransport {
    fn write(&mut self, frame: &Bytes) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "connection closed"));
        }
        self.frames
            .send(Outbound::Frame(frame.clone()))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "writer task stopped"))
    }

    fn destroy(&mut self) {
        if !self.closed {
            self.closed = true;
            let _ = self.frames.send(Outbound::Close);
        }
    }

    fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    fn report_error(&mut self, error: FixError) {
        let _ = self.events.send(EngineEvent::Error(error));
    }
}

/// Forwards session callbacks as [`EngineEvent`]s.
///
/// `DataOut` and `FixOut` are only forwarded when `outbound` is set.
#[derive(Debug, Clone)]
struct EventSink {
    events: mpsc::UnboundedSender<EngineEvent>,
    outbound: bool,
}

impl EventSink {
    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(EngineEvent::Session(event));
    }
}

impl SessionListener for EventSink {
    fn on_logon(&mut self, target: &str) {
        self.emit(SessionEvent::Logon {
            target: target.to_string(),
        });
    }

    fn on_logoff(&mut self, event: &LogoffEvent) {
        self.emit(SessionEvent::Logoff(event.clone()));
    }

    fn on_data_out(&mut self, message: &Message) {
        if self.outbound {
            self.emit(SessionEvent::DataOut(message.clone()));
        }
    }

    fn on_fix_out(&mut self, raw: &[u8]) {
        if self.outbound {
            self.emit(SessionEvent::FixOut(Bytes::copy_from_slice(raw)));
        }
    }
}

/// Caller side of a running connection.
///
/// Events queue without bound until read, so callers should keep draining
/// [`SessionHandle::next_event`] for as long as the connection runs.
#[derive(Debug)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    events: mpsc::UnboundedReceiver<EngineEvent>,
    remote_addr: Option<SocketAddr>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Sends an application or administrative message.
    ///
    /// # Errors
    /// Returns `SessionError::Connection` if the connection has closed.
    pub fn send(&self, message: Message) -> Result<()> {
        self.command(Command::Send(message))
    }

    /// Sends a Logon, or the default one when `message` is `None`.
    ///
    /// # Errors
    /// Returns `SessionError::Connection` if the connection has closed.
    pub fn logon(&self, message: Option<Message>) -> Result<()> {
        self.command(Command::Logon(message))
    }

    /// Sends a Logout with `reason`, or the default reason.
    ///
    /// # Errors
    /// Returns `SessionError::Connection` if the connection has closed.
    pub fn logoff(&self, reason: Option<String>) -> Result<()> {
        self.command(Command::Logoff(reason))
    }

    /// Asks the counterparty to resend `[start, target)`.
    ///
    /// # Errors
    /// Returns `SessionError::Connection` if the connection has closed.
    pub fn request_resend(&self, start: u64, target: u64) -> Result<()> {
        self.command(Command::RequestResend(start, target))
    }

    /// Reloads the session record with `reset` applied.
    ///
    /// # Errors
    /// Returns `SessionError::Connection` if the connection has closed, or
    /// the store error from reloading.
    pub async fn reset(&self, reset: SessionReset) -> Result<SessionRecord> {
        let (reply, response) = oneshot::channel();
        self.command(Command::Reset(reset, reply))?;
        response.await.map_err(|_| closed_error())?
    }

    /// Waits for the next event. Returns `None` once the connection is gone
    /// and every event has been received.
    pub async fn next_event(&mut self) -> Option<EngineEvent> {
        self.events.recv().await
    }

    /// Returns the counterparty's address.
    #[must_use]
    pub const fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Returns true once the driver task has finished.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the connection to close.
    pub async fn closed(self) {
        if let Err(err) = self.task.await {
            error!(error = %err, "session task failed");
        }
    }

    fn command(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| closed_error())
    }
}

fn closed_error() -> FixError {
    SessionError::Connection("session task has stopped".to_string()).into()
}

/// Starts the writer and driver tasks for `stream`.
pub(crate) fn spawn<S>(
    stream: S,
    remote_addr: Option<SocketAddr>,
    builder: SessionBuilder,
    framing: FixCodec,
    outbound_events: bool,
) -> SessionHandle
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    let (frames_tx, frames_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();

    let transport = ChannelTransport {
        frames: frames_tx,
        events: events_tx.clone(),
        remote_addr,
        closed: false,
    };
    let session = builder
        .listener(EventSink {
            events: events_tx.clone(),
            outbound: outbound_events,
        })
        .build(Box::new(transport));

    tokio::spawn(write_loop(writer, frames_rx));
    let task = tokio::spawn(async move {
        let driver = Driver {
            session,
            commands: commands_rx,
            events: events_tx,
            framing,
        };
        driver.run(reader).await;
    });

    SessionHandle {
        commands: commands_tx,
        events: events_rx,
        remote_addr,
        task,
    }
}

async fn write_loop<W>(mut writer: W, mut frames: mpsc::UnboundedReceiver<Outbound>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(outbound) = frames.recv().await {
        match outbound {
            Outbound::Frame(frame) => {
                if let Err(err) = writer.write_all(&frame).await {
                    warn!(error = %err, "write failed");
                    break;
                }
            }
            Outbound::Close => break,
        }
    }
    if let Err(err) = writer.shutdown().await {
        debug!(error = %err, "shutdown failed");
    }
}

struct Driver {
    session: FixSession,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<EngineEvent>,
    framing: FixCodec,
}

/// Heartbeat timer recreated whenever the negotiated period changes.
struct HeartbeatTimer {
    period: Duration,
    interval: Interval,
}

impl HeartbeatTimer {
    fn sync(timer: &mut Option<Self>, period: Option<Duration>) {
        match period {
            Some(period) if timer.as_ref().is_none_or(|t| t.period != period) => {
                let mut interval = interval_at(tokio::time::Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                *timer = Some(Self { period, interval });
            }
            None => *timer = None,
            Some(_) => {}
        }
    }

    async fn tick(timer: &mut Option<Self>) {
        match timer {
            Some(timer) => {
                timer.interval.tick().await;
            }
            None => std::future::pending().await,
        }
    }
}

impl Driver {
    async fn run<R>(mut self, mut reader: R)
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = BytesMut::with_capacity(READ_BUFFER_SIZE);
        let persist_period = self.session.config().persist_interval;
        let mut persist = interval_at(tokio::time::Instant::now() + persist_period, persist_period);
        persist.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut heartbeat: Option<HeartbeatTimer> = None;
        let mut commands_open = true;

        loop {
            HeartbeatTimer::sync(&mut heartbeat, self.session.heartbeat_tick_period());

            tokio::select! {
                read = reader.read_buf(&mut buf) => match read {
                    Ok(0) => {
                        info!(key = %self.session.key(), "peer closed connection");
                        break;
                    }
                    Ok(_) => {
                        if !self.on_readable(&mut buf) {
                            break;
                        }
                    }
                    Err(err) => {
                        warn!(key = %self.session.key(), error = %err, "read failed");
                        self.report(err.into());
                        break;
                    }
                },
                () = HeartbeatTimer::tick(&mut heartbeat) => {
                    let result = self.session.on_heartbeat_tick(Instant::now());
                    self.settle(result);
                }
                _ = persist.tick() => self.session.flush_persistence(Instant::now()),
                command = self.commands.recv(), if commands_open => match command {
                    Some(command) => self.execute(command),
                    None => commands_open = false,
                },
            }

            if self.session.take_disconnect() {
                break;
            }
        }

        self.session.take_disconnect();
        self.session.on_transport_closed();
        let _ = self.events.send(EngineEvent::Closed);
    }

    /// Decodes every complete frame in `buf`. Returns false if the
    /// connection must close.
    fn on_readable(&mut self, buf: &mut BytesMut) -> bool {
        loop {
            match self.framing.decode(buf) {
                Ok(Some(frame)) => {
                    match self.session.decode(&frame) {
                        Ok(message) => {
                            let _ = self.events.send(EngineEvent::Message(message));
                        }
                        Err(err) => {
                            let fatal = err.is_fatal();
                            error!(key = %self.session.key(), error = %err, "inbound message rejected");
                            self.report(err);
                            if fatal {
                                return false;
                            }
                        }
                    }
                    if self.session.take_disconnect() {
                        return false;
                    }
                }
                Ok(None) => return true,
                Err(err) => {
                    error!(key = %self.session.key(), error = %err, "framing error");
                    self.report(SessionError::Connection(err.to_string()).into());
                    return false;
                }
            }
        }
    }

    fn execute(&mut self, command: Command) {
        let result = match command {
            Command::Send(message) => self.session.send(&message, Delivery::Live).map(drop),
            Command::Logon(message) => self.session.logon(message).map(drop),
            Command::Logoff(reason) => self.session.logoff(reason.as_deref()).map(drop),
            Command::RequestResend(start, target) => self.session.request_resend(start, target),
            Command::Reset(reset, reply) => {
                let _ = reply.send(self.session.reset_session(reset));
                Ok(())
            }
        };
        self.settle(result);
    }

    fn settle(&mut self, result: Result<()>) {
        if let Err(err) = result {
            warn!(key = %self.session.key(), error = %err, "session operation failed");
            self.report(err);
        }
    }

    fn report(&self, error: FixError) {
        let _ = self.events.send(EngineEvent::Error(error));
    }
}
