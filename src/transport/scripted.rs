//! In-process scripted transport for tests
//!
//! This module provides [`ScriptedTransport`], an engine stand-in that
//! replays queued response frames instead of spawning a process. Tests
//! queue frames with [`ScriptedTransport::push_frame`] (or construct an
//! echoing transport with [`ScriptedTransport::echo`]), drive the code
//! under test, and then inspect the exact command transcript with
//! [`ScriptedTransport::transcript`].
//!
//! # Scripting
//!
//! - Each turn pops the next queued reply in FIFO order.
//! - [`ScriptedTransport::push_exit`] queues an engine crash: that turn
//!   fails with `EngineExited` and the transport stays dead afterwards,
//!   matching the subprocess transport's terminal-crash contract.
//! - When the queue is empty, an echoing transport replies `= <command>`
//!   and a plain one replies with an empty success frame (`=\n\n`).

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::{FastGtpError, Result};
use crate::transport::GtpTransport;

#[derive(Debug)]
enum ScriptedReply {
    Frame(String),
    Exit(String),
}

#[derive(Debug, Default)]
struct ScriptState {
    replies: VecDeque<ScriptedReply>,
    transcript: Vec<String>,
    dead: bool,
}

/// Scripted GTP engine for tests.
///
/// Implements [`GtpTransport`] without any process or network IO, so tests
/// can exercise the codec, session manager, and REST adapter
/// deterministically.
///
/// # Examples
///
/// ```
/// use fastgtp::transport::scripted::ScriptedTransport;
/// use fastgtp::transport::GtpTransport;
///
/// # #[tokio::main]
/// # async fn main() {
/// let engine = ScriptedTransport::new();
/// engine.push_frame("= KataGo\n\n");
///
/// let raw = engine.send_command("name").await.unwrap();
/// assert_eq!(raw, "= KataGo\n\n");
/// assert_eq!(engine.transcript(), vec!["name".to_string()]);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    state: Mutex<ScriptState>,
    echo: bool,
}

impl ScriptedTransport {
    /// Create a transport that replies with `=\n\n` once its queue runs dry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport that echoes each command back as its payload
    /// (`= <command>\n\n`) once its queue runs dry.
    pub fn echo() -> Self {
        Self {
            state: Mutex::new(ScriptState::default()),
            echo: true,
        }
    }

    /// Queue a raw response frame for a future turn.
    pub fn push_frame(&self, frame: impl Into<String>) {
        self.lock_state().replies.push_back(ScriptedReply::Frame(frame.into()));
    }

    /// Queue an engine crash: the matching turn fails with `EngineExited`
    /// carrying `detail`, and every turn after it fails the same way.
    pub fn push_exit(&self, detail: impl Into<String>) {
        self.lock_state().replies.push_back(ScriptedReply::Exit(detail.into()));
    }

    /// The commands received so far, in arrival order.
    pub fn transcript(&self) -> Vec<String> {
        self.lock_state().transcript.clone()
    }

    /// Number of queued replies not yet consumed.
    pub fn remaining_replies(&self) -> usize {
        self.lock_state().replies.len()
    }

    /// Whether the transport has been crashed or closed.
    pub fn is_dead(&self) -> bool {
        self.lock_state().dead
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        // The lock is only held for queue operations; poisoning would mean
        // a panic inside one of them.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait::async_trait]
impl GtpTransport for ScriptedTransport {
    async fn send_command(&self, command: &str) -> Result<String> {
        let stripped = command.trim();
        if stripped.is_empty() {
            return Err(FastGtpError::InvalidArgument(
                "GTP command cannot be empty".to_string(),
            ));
        }

        let mut state = self.lock_state();
        if state.dead {
            return Err(FastGtpError::EngineExited(
                "GTP engine is no longer running".to_string(),
            ));
        }
        state.transcript.push(stripped.to_string());

        match state.replies.pop_front() {
            Some(ScriptedReply::Frame(frame)) => Ok(frame),
            Some(ScriptedReply::Exit(detail)) => {
                state.dead = true;
                Err(FastGtpError::EngineExited(format!(
                    "GTP engine terminated unexpectedly: {detail}"
                )))
            }
            None if self.echo => Ok(format!("= {stripped}\n\n")),
            None => Ok("=\n\n".to_string()),
        }
    }

    async fn close(&self) {
        self.lock_state().dead = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_are_delivered_in_order() {
        let engine = ScriptedTransport::new();
        engine.push_frame("= one\n\n");
        engine.push_frame("= two\n\n");

        assert_eq!(engine.send_command("a").await.unwrap(), "= one\n\n");
        assert_eq!(engine.send_command("b").await.unwrap(), "= two\n\n");
        assert_eq!(engine.remaining_replies(), 0);
    }

    #[tokio::test]
    async fn test_transcript_records_trimmed_commands() {
        let engine = ScriptedTransport::new();
        engine.send_command("  name \n").await.unwrap();
        engine.send_command("version").await.unwrap();
        assert_eq!(
            engine.transcript(),
            vec!["name".to_string(), "version".to_string()]
        );
    }

    #[tokio::test]
    async fn test_empty_queue_yields_empty_success_frame() {
        let engine = ScriptedTransport::new();
        assert_eq!(engine.send_command("clear_board").await.unwrap(), "=\n\n");
    }

    #[tokio::test]
    async fn test_echo_mode_replies_with_command() {
        let engine = ScriptedTransport::echo();
        assert_eq!(
            engine.send_command("play B D4").await.unwrap(),
            "= play B D4\n\n"
        );
    }

    #[tokio::test]
    async fn test_exit_is_terminal() {
        let engine = ScriptedTransport::new();
        engine.push_exit("segfault");

        let first = engine.send_command("genmove B").await;
        assert!(matches!(first, Err(FastGtpError::EngineExited(_))));
        assert!(engine.is_dead());

        let second = engine.send_command("name").await;
        assert!(matches!(second, Err(FastGtpError::EngineExited(_))));
    }

    #[tokio::test]
    async fn test_close_makes_turns_fail() {
        let engine = ScriptedTransport::new();
        engine.close().await;
        let result = engine.send_command("name").await;
        assert!(matches!(result, Err(FastGtpError::EngineExited(_))));
    }

    #[tokio::test]
    async fn test_empty_command_is_rejected() {
        let engine = ScriptedTransport::new();
        let result = engine.send_command("   ").await;
        assert!(matches!(result, Err(FastGtpError::InvalidArgument(_))));
        assert!(engine.transcript().is_empty());
    }
}
