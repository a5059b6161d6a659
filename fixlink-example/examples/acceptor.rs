//! FIX acceptor example.
//!
//! Accepts any counterparty, persists sessions under `FIX_STORAGE` and
//! answers every NewOrderSingle (35=D) with an ExecutionReport (35=8).
//!
//! ```text
//! RUST_LOG=debug cargo run --example acceptor
//! ```

use fixlink::prelude::*;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

mod common;
use common::{ExampleConfig, init_logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cfg = ExampleConfig::server();

    let config = SessionConfig::acceptor()
        .with_reset_seq_num_on_reconnect(false)
        .with_storage_dir(&cfg.storage_dir);
    let acceptor = EngineBuilder::new(config)
        .with_file_storage()?
        .acceptor()?;

    let listener = TcpListener::bind(cfg.addr()).await?;
    info!("Acceptor listening on {}", cfg.addr());

    let (sessions_tx, mut sessions_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        if let Err(e) = acceptor.serve(listener, sessions_tx).await {
            error!("Acceptor stopped: {}", e);
        }
    });

    while let Some(session) = sessions_rx.recv().await {
        tokio::spawn(handle_session(session));
    }
    Ok(())
}

async fn handle_session(mut session: SessionHandle) {
    let peer = session.remote_addr();
    let mut exec_id: u64 = 0;

    while let Some(event) = session.next_event().await {
        match event {
            EngineEvent::Message(msg) => {
                if msg.msg_type().ok() != Some(MsgType::Application("D".to_string())) {
                    continue;
                }
                exec_id += 1;
                let report = execution_report(&msg, exec_id);
                if let Err(e) = session.send(report) {
                    warn!("Failed to send execution report: {}", e);
                }
            }
            EngineEvent::Session(SessionEvent::Logon { target }) => {
                info!("{} logged on from {:?}", target, peer);
            }
            EngineEvent::Session(SessionEvent::Logoff(logoff)) => {
                info!("{} logged off: {:?}", logoff.target_comp_id, logoff.reason);
            }
            EngineEvent::Session(_) => {}
            EngineEvent::Error(e) => warn!("Session error from {:?}: {}", peer, e),
            EngineEvent::Closed => {
                info!("Connection from {:?} closed", peer);
                break;
            }
        }
    }
}

/// Fills a NewOrderSingle in full.
fn execution_report(order: &Message, exec_id: u64) -> Message {
    let cl_ord_id = order.get(11).unwrap_or("UNKNOWN");
    let symbol = order.get(55).unwrap_or("N/A");
    let side = order.get(54).unwrap_or("1");
    let qty = order.get(38).unwrap_or("0");

    Message::of_type(MsgType::Application("8".to_string()))
        .with(37, format!("ORD-{exec_id}"))
        .with(11, cl_ord_id)
        .with(17, format!("EXEC-{exec_id}"))
        .with(150, "F")
        .with(39, "2")
        .with(55, symbol)
        .with(54, side)
        .with(38, qty)
        .with(14, qty)
        .with(151, 0)
        .with(6, "100.00")
}
