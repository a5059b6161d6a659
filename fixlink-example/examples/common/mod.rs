//! Shared settings for the example programs.

#![allow(dead_code)]

use std::time::Duration;

use tracing_subscriber::EnvFilter;

/// Example settings, overridable through the environment.
#[derive(Debug, Clone)]
pub struct ExampleConfig {
    /// Host to bind or dial.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Our CompID.
    pub sender_comp_id: String,
    /// Counterparty CompID.
    pub target_comp_id: String,
    /// Directory for session records and message logs.
    pub storage_dir: String,
    /// Heartbeat interval proposed in the Logon.
    pub heartbeat: Duration,
}

impl ExampleConfig {
    /// Settings for the acceptor example.
    pub fn server() -> Self {
        Self::from_env("SERVER", "CLIENT")
    }

    /// Settings for the initiator example.
    pub fn client() -> Self {
        Self::from_env("CLIENT", "SERVER")
    }

    fn from_env(sender: &str, target: &str) -> Self {
        let var = |name: &str, default: &str| std::env::var(name).unwrap_or_else(|_| default.to_string());
        Self {
            host: var("FIX_HOST", "127.0.0.1"),
            port: var("FIX_PORT", "9876").parse().unwrap_or(9876),
            sender_comp_id: var("FIX_SENDER", sender),
            target_comp_id: var("FIX_TARGET", target),
            storage_dir: var("FIX_STORAGE", "./storage"),
            heartbeat: Duration::from_secs(var("FIX_HEARTBEAT", "30").parse().unwrap_or(30)),
        }
    }

    /// Returns `host:port`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Installs a `tracing` subscriber honouring `RUST_LOG`.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}
