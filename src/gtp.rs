//! GTP codec: command serialization and response parsing
//!
//! The Go Text Protocol is line oriented. A command is a single line of the
//! form `[id ]name[ arg1 arg2 ...]`. A response is a frame that starts with
//! a status line (`=` for success, `?` for failure, optionally followed by
//! the echoed identifier) and ends with a blank line. Engines may emit
//! banner output before the status line; those lines are protocol chatter
//! and are skipped.
//!
//! All functions in this module are pure: they never perform IO and never
//! suspend.

use crate::error::{FastGtpError, Result};

/// A GTP command split into its components.
///
/// The identifier is kept as text so that `007` and `7` round-trip
/// unchanged; absence of an identifier is distinct from an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Decimal identifier, if the command carried one.
    pub identifier: Option<String>,
    /// Command name, lowercased.
    pub name: String,
    /// Arguments in order, case preserved.
    pub arguments: Vec<String>,
}

/// A parsed GTP response frame.
///
/// On success `payload` holds the (possibly multi-line, possibly empty)
/// response text and `error` is `None`. On failure `payload` is empty and
/// `error` holds the engine's message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    /// Whether the engine answered with `=` (true) or `?` (false).
    pub success: bool,
    /// Identifier echoed by the engine, if present.
    pub identifier: Option<String>,
    /// Response text for successful replies; empty for failures.
    pub payload: String,
    /// Engine error message for failed replies; `None` for successes.
    pub error: Option<String>,
}

/// Serialize a GTP command line (no trailing newline).
///
/// # Arguments
///
/// * `name` - Command name; must be non-empty and contain no whitespace.
/// * `arguments` - Arguments emitted verbatim, space separated. Arguments
///   containing whitespace or control characters are rejected, as is the
///   empty string (it would not survive a parse round-trip).
/// * `identifier` - Optional decimal identifier; must match `[0-9]+`.
///
/// # Errors
///
/// Returns [`FastGtpError::InvalidArgument`] when any contract above is
/// violated.
///
/// # Examples
///
/// ```
/// use fastgtp::gtp::build_command;
///
/// let line = build_command("play", &["B", "D4"], Some("7")).unwrap();
/// assert_eq!(line, "7 play B D4");
/// ```
pub fn build_command(name: &str, arguments: &[&str], identifier: Option<&str>) -> Result<String> {
    if name.is_empty() {
        return Err(FastGtpError::InvalidArgument(
            "GTP command name cannot be empty".to_string(),
        ));
    }
    if name.chars().any(|c| c.is_whitespace()) {
        return Err(FastGtpError::InvalidArgument(format!(
            "GTP command name cannot contain whitespace: {name:?}"
        )));
    }

    let mut line = String::new();
    if let Some(id) = identifier {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(FastGtpError::InvalidArgument(format!(
                "GTP command identifier must be decimal digits: {id:?}"
            )));
        }
        line.push_str(id);
        line.push(' ');
    }
    line.push_str(name);

    for argument in arguments {
        if argument.is_empty() {
            return Err(FastGtpError::InvalidArgument(
                "GTP command argument cannot be empty".to_string(),
            ));
        }
        if argument.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(FastGtpError::InvalidArgument(format!(
                "GTP command argument cannot contain whitespace or control characters: {argument:?}"
            )));
        }
        line.push(' ');
        line.push_str(argument);
    }

    Ok(line)
}

/// Parse a single GTP command line into a [`ParsedCommand`].
///
/// Tokens are split on ASCII whitespace. When the first token is all
/// digits it is the identifier and the second token is the command name;
/// otherwise the first token is the name. The name is lowercased,
/// arguments keep their case.
///
/// # Errors
///
/// Returns [`FastGtpError::InvalidArgument`] for empty or whitespace-only
/// input, or when an identifier is present without a command name.
pub fn parse_command_line(line: &str) -> Result<ParsedCommand> {
    let mut tokens = line.split_ascii_whitespace();

    let first = tokens.next().ok_or_else(|| {
        FastGtpError::InvalidArgument("GTP command line cannot be empty".to_string())
    })?;

    let (identifier, name) = if first.chars().all(|c| c.is_ascii_digit()) {
        let name = tokens.next().ok_or_else(|| {
            FastGtpError::InvalidArgument(format!(
                "GTP command line has identifier {first:?} but no command name"
            ))
        })?;
        (Some(first.to_string()), name)
    } else {
        (None, first)
    };

    Ok(ParsedCommand {
        identifier,
        name: name.to_ascii_lowercase(),
        arguments: tokens.map(str::to_string).collect(),
    })
}

/// Parse a raw GTP response frame into a [`ParsedResponse`].
///
/// `raw` is the complete frame as read from the engine: any number of
/// chatter lines, a status line starting with `=` or `?` (leading
/// whitespace allowed), continuation lines, and a terminating blank line.
/// Line endings may be `\n` or `\r\n`. A missing terminating blank line is
/// tolerated when `raw` simply ends.
///
/// The identifier is recognized only when its digits immediately follow
/// the status character (`=5`); digits separated by whitespace are payload.
/// A single space after the identifier (or status character) is stripped;
/// the remainder is the first payload line. An empty first payload line is
/// dropped when continuation lines follow it.
///
/// # Arguments
///
/// * `raw` - The raw response frame.
/// * `expected_id` - When `Some`, the echoed identifier must match exactly
///   (including presence).
///
/// # Errors
///
/// - [`FastGtpError::MalformedResponse`] when no status line is found; the
///   message carries the chatter for diagnosis.
/// - [`FastGtpError::IdentifierMismatch`] when `expected_id` disagrees
///   with the echoed identifier.
pub fn parse_response(raw: &str, expected_id: Option<&str>) -> Result<ParsedResponse> {
    let lines: Vec<&str> = raw.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)).collect();

    let status_index = lines
        .iter()
        .position(|line| matches!(line.trim_start().chars().next(), Some('=') | Some('?')));

    let Some(status_index) = status_index else {
        let chatter = lines.join("\n");
        let chatter = chatter.trim();
        return Err(FastGtpError::MalformedResponse(if chatter.is_empty() {
            "no status line found in GTP response".to_string()
        } else {
            format!("no status line found in GTP response: {chatter}")
        }));
    };

    let status_line = lines[status_index].trim_start();
    let mut rest = &status_line[1..];
    let success = status_line.starts_with('=');

    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let identifier = if digits.is_empty() {
        None
    } else {
        rest = &rest[digits.len()..];
        Some(digits)
    };

    if let Some(expected) = expected_id {
        if identifier.as_deref() != Some(expected) {
            return Err(FastGtpError::IdentifierMismatch {
                expected: Some(expected.to_string()),
                got: identifier,
            });
        }
    }

    // One separating space belongs to the frame, not the payload.
    let first_line = rest.strip_prefix(' ').or_else(|| rest.strip_prefix('\t')).unwrap_or(rest);

    let continuation: Vec<&str> = lines[status_index + 1..]
        .iter()
        .take_while(|line| !line.trim().is_empty())
        .copied()
        .collect();

    let mut payload_lines: Vec<&str> = Vec::with_capacity(continuation.len() + 1);
    if !first_line.is_empty() || continuation.is_empty() {
        payload_lines.push(first_line);
    }
    payload_lines.extend(continuation);
    let text = payload_lines.join("\n");

    if success {
        Ok(ParsedResponse {
            success: true,
            identifier,
            payload: text,
            error: None,
        })
    } else {
        Ok(ParsedResponse {
            success: false,
            identifier,
            payload: String::new(),
            error: Some(text),
        })
    }
}
