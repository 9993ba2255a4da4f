//! GTP transport abstraction and implementations
//!
//! This module defines the [`GtpTransport`] trait that all transport
//! implementations must satisfy. Concrete implementations live in
//! submodules:
//!
//! - [`subprocess::SubprocessTransport`] -- spawns an engine child process
//!   and exchanges turns over its stdin/stdout pipes.
//! - [`scripted::ScriptedTransport`] -- in-process scripted engine used by
//!   tests and diagnostics.
//!
//! # Design
//!
//! The trait is intentionally minimal: one turn is `send_command` (a single
//! command line in, one complete response frame out), plus `close` for
//! teardown. Framing, process supervision, and turn serialization are the
//! responsibility of each implementation. Implementations must be safe to
//! call concurrently; concurrent turns are serialized in FIFO order.

use crate::error::Result;

/// Abstraction over something that can execute GTP commands.
///
/// Used polymorphically through `Arc<dyn GtpTransport>`; the session
/// manager owns one instance per session.
#[async_trait::async_trait]
pub trait GtpTransport: Send + Sync + std::fmt::Debug {
    /// Send a single command and return the raw response frame.
    ///
    /// # Arguments
    ///
    /// * `command` - One GTP command line without the terminating newline.
    ///   Must be non-empty after trimming surrounding whitespace.
    ///
    /// # Returns
    ///
    /// The complete raw response frame, including the terminating blank
    /// line, suitable for [`crate::gtp::parse_response`].
    ///
    /// # Errors
    ///
    /// - [`crate::error::FastGtpError::InvalidArgument`] for empty commands.
    /// - [`crate::error::FastGtpError::EngineExited`] when the engine
    ///   terminated during (or before) the turn.
    /// - [`crate::error::FastGtpError::TransportBroken`] when the channel
    ///   is unusable.
    /// - [`crate::error::FastGtpError::Timeout`] when a configured turn
    ///   deadline elapsed.
    async fn send_command(&self, command: &str) -> Result<String>;

    /// Release the transport's resources.
    ///
    /// Idempotent and best-effort; waits for an in-flight turn to finish
    /// before tearing down. After `close` every turn fails.
    async fn close(&self);
}

pub mod scripted;
pub mod subprocess;
