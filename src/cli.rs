//! Command-line interface definition for fastgtp
//!
//! The server has a deliberately small surface: the listen address comes
//! from the CLI (or `FASTGTP_BIND`), everything engine-related comes from
//! the environment (see [`crate::config`]).

use clap::Parser;

/// fastgtp - Translate Go Text Protocol engines into REST APIs
///
/// Spawns one engine subprocess per session and serves REST endpoints
/// that are translated to GTP commands.
#[derive(Parser, Debug, Clone)]
#[command(name = "fastgtp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "FASTGTP_BIND", default_value = "127.0.0.1:8080")]
    pub bind: String,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
