//! Error types for fastgtp
//!
//! This module defines all error types used throughout the crate, using
//! `thiserror` for ergonomic error handling. The variants mirror the
//! failure surface of the three core subsystems (codec, transport, session
//! manager) plus the adapter-level outcomes built on top of them.

use thiserror::Error;

/// Main error type for fastgtp operations.
///
/// Each variant is raised by exactly one layer:
///
/// - The codec raises [`InvalidArgument`](FastGtpError::InvalidArgument),
///   [`MalformedResponse`](FastGtpError::MalformedResponse) and
///   [`IdentifierMismatch`](FastGtpError::IdentifierMismatch).
/// - The transport raises [`EngineExited`](FastGtpError::EngineExited),
///   [`TransportBroken`](FastGtpError::TransportBroken),
///   [`Timeout`](FastGtpError::Timeout) and
///   [`Cancelled`](FastGtpError::Cancelled).
/// - The session manager raises
///   [`SessionNotFound`](FastGtpError::SessionNotFound).
/// - The REST adapter raises [`Engine`](FastGtpError::Engine) when the
///   engine answers a turn with a `?` failure reply.
#[derive(Error, Debug)]
pub enum FastGtpError {
    /// Caller-supplied input violated a contract (empty command, malformed
    /// vertex, bad identifier).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The session ID does not resolve to a live session.
    #[error("Unknown session")]
    SessionNotFound(String),

    /// The engine reply could not be parsed as a GTP response frame.
    #[error("Malformed GTP response: {0}")]
    MalformedResponse(String),

    /// The engine answered with a `?` failure reply; the payload is the
    /// engine's own error message.
    #[error("GTP engine error: {0}")]
    Engine(String),

    /// The engine process terminated before the turn completed, or a
    /// previous crash left the transport dead.
    #[error("{0}")]
    EngineExited(String),

    /// The underlying channel to the engine is unusable (spawn failure,
    /// missing pipes, closed transport).
    #[error("GTP transport broken: {0}")]
    TransportBroken(String),

    /// The response identifier disagrees with the identifier the command
    /// was sent with (including presence mismatch).
    #[error("GTP response identifier mismatch: expected {expected:?}, got {got:?}")]
    IdentifierMismatch {
        /// Identifier the command was tagged with, if any.
        expected: Option<String>,
        /// Identifier echoed by the engine, if any.
        got: Option<String>,
    },

    /// The caller abandoned the request before its turn started.
    #[error("Request cancelled before the turn started")]
    Cancelled,

    /// The turn exceeded the configured wall-clock deadline; the engine
    /// process has been terminated.
    #[error("GTP turn exceeded the {0:?} deadline")]
    Timeout(std::time::Duration),
}

/// Result type alias for fastgtp operations.
///
/// The error type is concrete so that callers (in particular the REST
/// adapter) can match on the failure taxonomy without downcasting.
pub type Result<T> = std::result::Result<T, FastGtpError>;
