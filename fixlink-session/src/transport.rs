/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Outbound side of the connection as seen by a session.

use bytes::Bytes;
use fixlink_core::error::FixError;
use std::io;
use std::net::SocketAddr;

/// Duplex connection the session writes to.
///
/// Writes must not block: implementations queue the frame and return.
pub trait Transport: Send {
    /// Queues one complete frame for writing.
    ///
    /// # Errors
    /// Returns an I/O error if the connection is already gone.
    fn write(&mut self, frame: &Bytes) -> io::Result<()>;

    /// Closes the connection after queued frames are flushed.
    fn destroy(&mut self);

    /// Returns the counterparty's address, if known.
    fn remote_addr(&self) -> Option<SocketAddr> {
        None
    }

    /// Surfaces a non-fatal connection-level error, such as a heartbeat
    /// timeout, to whoever owns the connection.
    fn report_error(&mut self, error: FixError);
}

/// Transport for sessions that are not attached to a connection.
///
/// Writes succeed and are discarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedTransport;

impl Transport for DetachedTransport {
    fn write(&mut self, _frame: &Bytes) -> io::Result<()> {
        Ok(())
    }

    fn destroy(&mut self) {}

    fn report_error(&mut self, error: FixError) {
        tracing::debug!(error = %error, "error on detached session");
    }
}
