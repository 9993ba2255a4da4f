//! REST adapter: HTTP surface over the session manager
//!
//! The router is an explicit table mapping `(method, path)` to handlers;
//! no runtime introspection. The HTTP layer receives the
//! [`SessionManager`] at construction (dependency injection) and calls
//! [`SessionManager::close_all`] when the server shuts down.
//!
//! # Endpoints
//!
//! ```text
//! GET  /health                       liveness probe
//! POST /open_session                 create a session + engine
//! POST /{sid}/quit                   close a session
//! GET  /{sid}/name                   engine name
//! GET  /{sid}/version                engine version
//! GET  /{sid}/protocol_version       protocol version
//! GET  /{sid}/commands               list_commands, split on newlines
//! POST /{sid}/boardsize              boardsize x [y]
//! GET  /{sid}/komi                   get_komi, parsed as float
//! POST /{sid}/komi                   komi value
//! POST /{sid}/clear_board            clear_board
//! POST /{sid}/play                   play color vertex
//! POST /{sid}/genmove                genmove color
//! GET  /{sid}/sgf                    printsgf
//! POST /{sid}/sgf                    loadsgf from filename or content
//! POST /{sid}/command                raw command passthrough
//! ```

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

use crate::session::SessionManager;

pub mod routes;
pub mod types;

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    /// The process-wide session registry.
    pub manager: Arc<SessionManager>,
}

/// Build the application router around a session manager.
pub fn build_router(manager: Arc<SessionManager>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/open_session", post(routes::open_session))
        .route("/:session_id/quit", post(routes::quit_session))
        .route("/:session_id/name", get(routes::engine_name))
        .route("/:session_id/version", get(routes::engine_version))
        .route("/:session_id/protocol_version", get(routes::protocol_version))
        .route("/:session_id/commands", get(routes::list_commands))
        .route("/:session_id/boardsize", post(routes::set_boardsize))
        .route("/:session_id/komi", get(routes::get_komi).post(routes::set_komi))
        .route("/:session_id/clear_board", post(routes::clear_board))
        .route("/:session_id/play", post(routes::play_move))
        .route("/:session_id/genmove", post(routes::generate_move))
        .route("/:session_id/sgf", get(routes::get_sgf).post(routes::load_sgf))
        .route("/:session_id/command", post(routes::send_raw_command))
        .with_state(AppState { manager })
}

/// Serve the REST API until ctrl-c, then close every session.
///
/// # Errors
///
/// Propagates IO errors from the listener.
pub async fn serve(listener: TcpListener, manager: Arc<SessionManager>) -> anyhow::Result<()> {
    let app = build_router(Arc::clone(&manager));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped, closing sessions");
    manager.close_all().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "failed to install ctrl-c handler");
    }
}
