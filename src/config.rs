//! Configuration for fastgtp
//!
//! The engine command is read from the environment, mirroring the way the
//! service is deployed: `FASTGTP_ENGINE` holds either a shell-style
//! command string or a JSON array of argv entries, and
//! `FASTGTP_DEFAULT_ENGINE` (populated inside the provided container
//! image) is used only when `FASTGTP_ENGINE` is unset.

use std::time::Duration;

use crate::error::{FastGtpError, Result};

/// Primary engine command variable.
pub const ENGINE_ENV: &str = "FASTGTP_ENGINE";
/// Fallback engine command variable, consulted when [`ENGINE_ENV`] is unset.
pub const DEFAULT_ENGINE_ENV: &str = "FASTGTP_DEFAULT_ENGINE";
/// Optional per-turn deadline, in whole seconds.
pub const TURN_TIMEOUT_ENV: &str = "FASTGTP_TURN_TIMEOUT_SECS";

/// A parsed engine launch command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    argv: Vec<String>,
}

impl EngineCommand {
    /// Parse an engine command from its textual form.
    ///
    /// A value starting with `[` is a JSON array of argv strings; anything
    /// else is tokenized with POSIX shell rules (quotes and backslash
    /// escapes honored, no environment expansion).
    ///
    /// # Errors
    ///
    /// Returns [`FastGtpError::InvalidArgument`] for empty input, invalid
    /// JSON, unbalanced quoting, or an empty argv.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(FastGtpError::InvalidArgument(
                "engine command cannot be empty".to_string(),
            ));
        }

        let argv = if raw.starts_with('[') {
            serde_json::from_str::<Vec<String>>(raw).map_err(|e| {
                FastGtpError::InvalidArgument(format!("engine command is not a JSON argv array: {e}"))
            })?
        } else {
            shlex::split(raw).ok_or_else(|| {
                FastGtpError::InvalidArgument(format!(
                    "engine command has unbalanced quoting: {raw:?}"
                ))
            })?
        };

        if argv.is_empty() {
            return Err(FastGtpError::InvalidArgument(
                "engine command argv cannot be empty".to_string(),
            ));
        }
        Ok(Self { argv })
    }

    /// The argument vector to spawn.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Consume the command, yielding the argument vector.
    pub fn into_argv(self) -> Vec<String> {
        self.argv
    }
}

/// Resolve the engine command from the environment.
///
/// [`ENGINE_ENV`] wins; [`DEFAULT_ENGINE_ENV`] is the fallback.
///
/// # Errors
///
/// Returns [`FastGtpError::InvalidArgument`] when neither variable is set
/// or the value fails to parse.
pub fn resolve_engine_command() -> Result<EngineCommand> {
    let raw = std::env::var(ENGINE_ENV)
        .or_else(|_| std::env::var(DEFAULT_ENGINE_ENV))
        .map_err(|_| {
            FastGtpError::InvalidArgument(format!(
                "{ENGINE_ENV} environment variable is required to launch the server \
                 (or set {DEFAULT_ENGINE_ENV})"
            ))
        })?;
    EngineCommand::parse(&raw)
}

/// Read the optional per-turn deadline from the environment.
///
/// # Errors
///
/// Returns [`FastGtpError::InvalidArgument`] when the value is present but
/// not a positive integer.
pub fn turn_timeout_from_env() -> Result<Option<Duration>> {
    let Ok(raw) = std::env::var(TURN_TIMEOUT_ENV) else {
        return Ok(None);
    };
    let seconds: u64 = raw.trim().parse().map_err(|_| {
        FastGtpError::InvalidArgument(format!(
            "{TURN_TIMEOUT_ENV} must be a positive integer, got {raw:?}"
        ))
    })?;
    if seconds == 0 {
        return Err(FastGtpError::InvalidArgument(format!(
            "{TURN_TIMEOUT_ENV} must be a positive integer, got 0"
        )));
    }
    Ok(Some(Duration::from_secs(seconds)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_shell_string() {
        let command = EngineCommand::parse("katago gtp -config /opt/katago/fastgtp.cfg").unwrap();
        assert_eq!(
            command.argv(),
            ["katago", "gtp", "-config", "/opt/katago/fastgtp.cfg"]
        );
    }

    #[test]
    fn test_parse_shell_string_honors_quotes() {
        let command = EngineCommand::parse(r#"engine --name "My Engine" -v"#).unwrap();
        assert_eq!(command.argv(), ["engine", "--name", "My Engine", "-v"]);
    }

    #[test]
    fn test_parse_json_array() {
        let command = EngineCommand::parse(r#"["gnugo", "--mode", "gtp"]"#).unwrap();
        assert_eq!(command.argv(), ["gnugo", "--mode", "gtp"]);
    }

    #[test]
    fn test_parse_rejects_empty_input() {
        assert!(matches!(
            EngineCommand::parse("   "),
            Err(FastGtpError::InvalidArgument(_))
        ));
        assert!(matches!(
            EngineCommand::parse("[]"),
            Err(FastGtpError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert!(matches!(
            EngineCommand::parse("[not json"),
            Err(FastGtpError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_rejects_unbalanced_quoting() {
        assert!(matches!(
            EngineCommand::parse("engine 'oops"),
            Err(FastGtpError::InvalidArgument(_))
        ));
    }

    #[test]
    #[serial]
    fn test_resolve_prefers_primary_over_fallback() {
        std::env::set_var(ENGINE_ENV, "primary --gtp");
        std::env::set_var(DEFAULT_ENGINE_ENV, "fallback --gtp");

        let command = resolve_engine_command().unwrap();
        assert_eq!(command.argv()[0], "primary");

        std::env::remove_var(ENGINE_ENV);
        let command = resolve_engine_command().unwrap();
        assert_eq!(command.argv()[0], "fallback");

        std::env::remove_var(DEFAULT_ENGINE_ENV);
        assert!(resolve_engine_command().is_err());
    }

    #[test]
    #[serial]
    fn test_turn_timeout_parsing() {
        std::env::remove_var(TURN_TIMEOUT_ENV);
        assert_eq!(turn_timeout_from_env().unwrap(), None);

        std::env::set_var(TURN_TIMEOUT_ENV, "30");
        assert_eq!(
            turn_timeout_from_env().unwrap(),
            Some(Duration::from_secs(30))
        );

        std::env::set_var(TURN_TIMEOUT_ENV, "0");
        assert!(turn_timeout_from_env().is_err());

        std::env::set_var(TURN_TIMEOUT_ENV, "soon");
        assert!(turn_timeout_from_env().is_err());

        std::env::remove_var(TURN_TIMEOUT_ENV);
    }
}
