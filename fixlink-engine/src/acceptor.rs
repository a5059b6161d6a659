/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Server side: one session per accepted TCP connection.

use crate::builder::EngineBuilder;
use crate::connection::{self, SessionHandle};
use fixlink_core::error::Result;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Accepts counterparties and runs a session for each.
#[derive(Debug, Clone)]
pub struct Acceptor {
    engine: EngineBuilder,
}

impl Acceptor {
    pub(crate) fn new(engine: EngineBuilder) -> Self {
        Self { engine }
    }

    /// Accepts one connection and starts its session.
    ///
    /// # Errors
    /// Returns `FixError::Io` if accepting fails.
    pub async fn accept(&self, listener: &TcpListener) -> Result<SessionHandle> {
        let (stream, addr) = listener.accept().await?;
        if let Err(err) = stream.set_nodelay(true) {
            warn!(%addr, error = %err, "failed to disable nagle");
        }
        info!(%addr, "connection accepted");
        Ok(connection::spawn(
            stream,
            Some(addr),
            self.engine.session_builder(),
            self.engine.framing(),
            self.engine.outbound_events(),
        ))
    }

    /// Accepts connections until `listener` fails, handing every session to
    /// `sessions`.
    ///
    /// Sessions keep running when `sessions` has no receiver.
    ///
    /// # Errors
    /// Returns `FixError::Io` if accepting fails.
    pub async fn serve(
        &self,
        listener: TcpListener,
        sessions: mpsc::UnboundedSender<SessionHandle>,
    ) -> Result<()> {
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "acceptor listening");
        }
        loop {
            let handle = self.accept(&listener).await?;
            if sessions.send(handle).is_err() {
                warn!("no receiver for accepted session");
            }
        }
    }
}
