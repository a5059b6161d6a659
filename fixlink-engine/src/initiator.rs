/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Client side: dial a counterparty and log on.

use crate::builder::EngineBuilder;
use crate::connection::{self, SessionHandle};
use fixlink_core::error::{Result, SessionError};
use fixlink_core::message::Message;
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::{info, warn};

/// Opens sessions to a counterparty.
#[derive(Debug, Clone)]
pub struct Initiator {
    engine: EngineBuilder,
}

impl Initiator {
    pub(crate) fn new(engine: EngineBuilder) -> Self {
        Self { engine }
    }

    /// Connects to `addr`, starts the session and sends `logon` (or the
    /// default Logon).
    ///
    /// # Errors
    /// Returns `SessionError::Connection` if the connection times out and
    /// `FixError::Io` if it fails.
    pub async fn connect(
        &self,
        addr: impl ToSocketAddrs,
        logon: Option<Message>,
    ) -> Result<SessionHandle> {
        let timeout = self.engine.connect_timeout();
        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| {
                SessionError::Connection(format!("connect timed out after {timeout:?}"))
            })??;
        if let Err(err) = stream.set_nodelay(true) {
            warn!(error = %err, "failed to disable nagle");
        }
        let remote = stream.peer_addr().ok();
        info!(remote = ?remote, "connected");

        let handle = connection::spawn(
            stream,
            remote,
            self.engine.session_builder(),
            self.engine.framing(),
            self.engine.outbound_events(),
        );
        handle.logon(logon)?;
        Ok(handle)
    }
}
