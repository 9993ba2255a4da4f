//! fastgtp server binary
//!
//! Reads the engine command from `FASTGTP_ENGINE` (falling back to
//! `FASTGTP_DEFAULT_ENGINE`), builds a session manager whose factory
//! spawns that engine per session, and serves the REST API until ctrl-c.
//! Exits non-zero when the required environment is absent.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use fastgtp::cli::Cli;
use fastgtp::session::SessionManager;
use fastgtp::transport::subprocess::SubprocessTransport;
use fastgtp::transport::GtpTransport;
use fastgtp::{config, server};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse_args();

    let engine = config::resolve_engine_command().context("engine configuration")?;
    let turn_timeout = config::turn_timeout_from_env().context("turn timeout configuration")?;

    let argv = engine.into_argv();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind = %cli.bind,
        engine = ?argv,
        "fastgtp server starting"
    );

    let manager = Arc::new(SessionManager::new(move || {
        let mut transport = SubprocessTransport::from_argv(argv.clone())?;
        if let Some(deadline) = turn_timeout {
            transport = transport.with_turn_timeout(deadline);
        }
        let transport: Arc<dyn GtpTransport> = Arc::new(transport);
        Ok(transport)
    }));

    let listener = tokio::net::TcpListener::bind(&cli.bind)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;

    server::serve(listener, manager).await
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
