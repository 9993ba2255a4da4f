//! fastgtp - Translate Go Text Protocol engines into REST APIs
//!
//! Each client session owns a dedicated GTP engine subprocess. REST
//! operations are translated into GTP command lines, executed as
//! serialized turns over the engine's standard streams, and the framed
//! replies are parsed back into structured JSON.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `gtp`: the GTP codec (command serialization, response parsing)
//! - `transport`: the turn abstraction plus the subprocess and scripted
//!   implementations
//! - `session`: the concurrent session registry
//! - `server`: the axum REST adapter
//! - `config`: engine command resolution from the environment
//! - `error`: error types and the result alias
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use fastgtp::session::SessionManager;
//! use fastgtp::transport::subprocess::SubprocessTransport;
//! use fastgtp::transport::GtpTransport;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let manager = Arc::new(SessionManager::new(|| {
//!         let transport: Arc<dyn GtpTransport> =
//!             Arc::new(SubprocessTransport::from_command_line("gnugo --mode gtp")?);
//!         Ok(transport)
//!     }));
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     fastgtp::server::serve(listener, manager).await
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod gtp;
pub mod server;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use config::EngineCommand;
pub use error::{FastGtpError, Result};
pub use gtp::{build_command, parse_command_line, parse_response, ParsedCommand, ParsedResponse};
pub use session::SessionManager;
pub use transport::scripted::ScriptedTransport;
pub use transport::subprocess::SubprocessTransport;
pub use transport::GtpTransport;
