//! FIX initiator example.
//!
//! Logs on to the acceptor example, sends a few NewOrderSingles, prints the
//! execution reports and logs out.
//!
//! ```text
//! cargo run --example acceptor
//! cargo run --example initiator
//! ```

use std::time::Duration;

use fixlink::prelude::*;
use tracing::{info, warn};

mod common;
use common::{ExampleConfig, init_logging};

const ORDER_COUNT: u64 = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cfg = ExampleConfig::client();

    let config = SessionConfig::initiator(
        cfg.sender_comp_id.as_str(),
        cfg.target_comp_id.as_str(),
        "FIX.4.4",
    )
    .with_default_heartbeat(cfg.heartbeat)
    .with_reset_seq_num_on_reconnect(false)
    .with_storage_dir(&cfg.storage_dir);
    let initiator = EngineBuilder::new(config)
        .with_file_storage()?
        .with_connect_timeout(Duration::from_secs(5))
        .initiator()?;

    info!("Connecting to {}", cfg.addr());
    let mut session = initiator.connect(cfg.addr(), None).await?;
    let mut reports = 0;

    while let Some(event) = session.next_event().await {
        match event {
            EngineEvent::Session(SessionEvent::Logon { target }) => {
                info!("Logged on to {}", target);
                for n in 1..=ORDER_COUNT {
                    session.send(new_order(n))?;
                }
            }
            EngineEvent::Message(msg) if msg.msg_type().ok() == Some(MsgType::Application("8".to_string())) => {
                info!(
                    "Execution report for {}: {} @ {}",
                    msg.get(11).unwrap_or("?"),
                    msg.get(14).unwrap_or("?"),
                    msg.get(6).unwrap_or("?")
                );
                reports += 1;
                if reports == ORDER_COUNT {
                    session.logoff(Some("demo complete".to_string()))?;
                }
            }
            EngineEvent::Session(SessionEvent::Logoff(logoff)) => {
                info!("Logged off: {:?}", logoff.reason);
            }
            EngineEvent::Error(e) => warn!("Session error: {}", e),
            EngineEvent::Closed => break,
            _ => {}
        }
    }

    info!("Done");
    Ok(())
}

fn new_order(n: u64) -> Message {
    Message::of_type(MsgType::Application("D".to_string()))
        .with(11, format!("CL-{n}"))
        .with(55, "EURUSD")
        .with(54, "1")
        .with(38, 100 * n)
        .with(40, "1")
        .with(60, Timestamp::now())
}
