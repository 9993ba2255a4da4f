//! Subprocess transport for GTP engine child processes
//!
//! This module implements [`SubprocessTransport`], which owns one engine
//! child process and exchanges GTP turns over its stdin/stdout pipes.
//!
//! # Protocol
//!
//! - The command is written to the child's stdin as UTF-8, trimmed, with a
//!   single `\n` appended, then flushed.
//! - The reply is read from stdout line by line (lossy UTF-8 decoding).
//!   Lines accumulate, newlines included, until a line consisting of only
//!   whitespace terminates the frame. The accumulated buffer is returned
//!   unchanged so the codec sees authentic framing.
//! - Stderr is left untouched during normal turns and drained only when
//!   the engine dies, to enrich the failure message.
//!
//! # Lifecycle
//!
//! The child is spawned lazily on the first turn. A crash (EOF or pipe
//! error mid-turn) marks the transport dead; every later turn fails with
//! the same error class and the transport is never respawned. `close`
//! shuts stdin, signals the child (SIGTERM on Unix) and awaits its exit.
//! Dropping the transport sends a best-effort signal without blocking.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

use crate::error::{FastGtpError, Result};
use crate::transport::GtpTransport;

/// Lifecycle of the managed child process.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    /// No child has been spawned yet; the first turn spawns one.
    #[default]
    Fresh,
    /// The child is live (as far as we know).
    Running,
    /// The child exited, the transport was closed, or a turn timed out.
    /// Terminal: the transport is never respawned.
    Dead,
}

#[derive(Debug, Default)]
struct Inner {
    state: EngineState,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<BufReader<ChildStdout>>,
    stderr: Option<ChildStderr>,
}

/// What a single frame read produced.
enum FrameRead {
    /// A complete frame, terminating blank line included.
    Complete(String),
    /// Stdout ended (or failed) before the frame terminated.
    Interrupted,
}

/// GTP transport backed by one engine child process.
///
/// All turns are serialized through an internal FIFO-fair lock: a reply
/// can never be intermingled with another turn's request.
///
/// # Examples
///
/// ```no_run
/// use fastgtp::transport::subprocess::SubprocessTransport;
/// use fastgtp::transport::GtpTransport;
///
/// # #[tokio::main]
/// # async fn main() -> anyhow::Result<()> {
/// let transport = SubprocessTransport::from_command_line("gnugo --mode gtp")?;
/// let raw = transport.send_command("name").await?;
/// transport.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SubprocessTransport {
    argv: Vec<String>,
    turn_timeout: Option<Duration>,
    /// Turn lock: tokio's Mutex queues waiters in FIFO order.
    inner: Mutex<Inner>,
}

impl SubprocessTransport {
    /// Create a transport from a pre-split argument vector.
    ///
    /// # Errors
    ///
    /// Returns [`FastGtpError::InvalidArgument`] when `argv` is empty.
    pub fn from_argv(argv: Vec<String>) -> Result<Self> {
        if argv.is_empty() {
            return Err(FastGtpError::InvalidArgument(
                "GTP engine command cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            argv,
            turn_timeout: None,
            inner: Mutex::new(Inner::default()),
        })
    }

    /// Create a transport from a single command string.
    ///
    /// The string is tokenized with POSIX shell rules (quotes and
    /// backslash escapes honored, no environment expansion).
    ///
    /// # Errors
    ///
    /// Returns [`FastGtpError::InvalidArgument`] for unbalanced quoting or
    /// an empty command.
    pub fn from_command_line(command: &str) -> Result<Self> {
        let argv = shlex::split(command).ok_or_else(|| {
            FastGtpError::InvalidArgument(format!(
                "GTP engine command has unbalanced quoting: {command:?}"
            ))
        })?;
        Self::from_argv(argv)
    }

    /// Set an upper bound on a turn's wall-clock duration.
    ///
    /// When the deadline elapses the child is killed and the transport is
    /// marked dead; the turn fails with [`FastGtpError::Timeout`].
    #[must_use]
    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = Some(timeout);
        self
    }

    /// The argument vector this transport spawns.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    fn spawn_locked(&self, inner: &mut Inner) -> Result<()> {
        let mut command = Command::new(&self.argv[0]);
        command
            .args(&self.argv[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|e| {
            FastGtpError::TransportBroken(format!(
                "failed to spawn GTP engine `{}`: {}",
                self.argv[0], e
            ))
        })?;

        // Each handle is guaranteed present because we piped all three.
        let stdin = child.stdin.take().ok_or_else(|| {
            FastGtpError::TransportBroken("engine stdin unavailable after spawn".to_string())
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            FastGtpError::TransportBroken("engine stdout unavailable after spawn".to_string())
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            FastGtpError::TransportBroken("engine stderr unavailable after spawn".to_string())
        })?;

        tracing::info!(argv = ?self.argv, pid = child.id(), "spawned GTP engine");

        inner.stdin = Some(stdin);
        inner.stdout = Some(BufReader::new(stdout));
        inner.stderr = Some(stderr);
        inner.child = Some(child);
        inner.state = EngineState::Running;
        Ok(())
    }

    /// Tear down a crashed turn: drain stderr, reap the child, go `Dead`.
    async fn fail_turn(&self, inner: &mut Inner) -> FastGtpError {
        let mut stderr_output = String::new();
        if let Some(mut stderr) = inner.stderr.take() {
            let mut buf = Vec::new();
            let _ = tokio::time::timeout(Duration::from_secs(1), stderr.read_to_end(&mut buf)).await;
            stderr_output = String::from_utf8_lossy(&buf).trim().to_string();
        }

        if let Some(mut child) = inner.child.take() {
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
        inner.stdin = None;
        inner.stdout = None;
        inner.state = EngineState::Dead;

        let mut message = String::from("GTP engine terminated unexpectedly");
        if !stderr_output.is_empty() {
            message.push_str(": ");
            message.push_str(&stderr_output);
        }
        tracing::warn!(argv = ?self.argv, stderr = %stderr_output, "GTP engine died mid-turn");
        FastGtpError::EngineExited(message)
    }

    /// Kill the child after a turn deadline elapsed; the frame boundary is
    /// lost, so the transport cannot be reused.
    async fn fail_timeout(&self, inner: &mut Inner, deadline: Duration) -> FastGtpError {
        if let Some(mut child) = inner.child.take() {
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
        inner.stdin = None;
        inner.stdout = None;
        inner.stderr = None;
        inner.state = EngineState::Dead;
        tracing::warn!(argv = ?self.argv, ?deadline, "GTP turn deadline elapsed, engine killed");
        FastGtpError::Timeout(deadline)
    }
}

/// Read one response frame from the engine's stdout.
///
/// Lines are decoded lossily and appended, newline bytes included, until a
/// whitespace-only line terminates the frame.
async fn read_frame(stdout: &mut BufReader<ChildStdout>) -> FrameRead {
    let mut frame = String::new();
    let mut bytes = Vec::new();
    loop {
        bytes.clear();
        match stdout.read_until(b'\n', &mut bytes).await {
            Ok(0) | Err(_) => return FrameRead::Interrupted,
            Ok(_) => {}
        }
        let decoded = String::from_utf8_lossy(&bytes);
        frame.push_str(&decoded);
        if decoded.trim().is_empty() {
            return FrameRead::Complete(frame);
        }
    }
}

#[async_trait::async_trait]
impl GtpTransport for SubprocessTransport {
    async fn send_command(&self, command: &str) -> Result<String> {
        let stripped = command.trim();
        if stripped.is_empty() {
            return Err(FastGtpError::InvalidArgument(
                "GTP command cannot be empty".to_string(),
            ));
        }

        let mut inner = self.inner.lock().await;

        match inner.state {
            EngineState::Dead => {
                return Err(FastGtpError::EngineExited(
                    "GTP engine is no longer running".to_string(),
                ));
            }
            EngineState::Fresh => self.spawn_locked(&mut inner)?,
            EngineState::Running => {}
        }

        tracing::debug!(command = %stripped, "sending GTP command");

        let line = format!("{stripped}\n");
        let stdin = inner.stdin.as_mut().ok_or_else(|| {
            FastGtpError::TransportBroken("engine stdin is not available".to_string())
        })?;
        if stdin.write_all(line.as_bytes()).await.is_err() || stdin.flush().await.is_err() {
            // A broken pipe means the engine is gone.
            return Err(self.fail_turn(&mut inner).await);
        }

        let stdout = inner.stdout.as_mut().ok_or_else(|| {
            FastGtpError::TransportBroken("engine stdout is not available".to_string())
        })?;

        let outcome = match self.turn_timeout {
            Some(deadline) => match tokio::time::timeout(deadline, read_frame(stdout)).await {
                Ok(outcome) => outcome,
                Err(_) => return Err(self.fail_timeout(&mut inner, deadline).await),
            },
            None => read_frame(stdout).await,
        };

        match outcome {
            FrameRead::Complete(frame) => {
                tracing::debug!(bytes = frame.len(), "received GTP response frame");
                Ok(frame)
            }
            FrameRead::Interrupted => Err(self.fail_turn(&mut inner).await),
        }
    }

    /// Close stdin, signal the child (SIGTERM on Unix) and await its exit.
    ///
    /// Waits for an in-flight turn first (the turn lock serializes us
    /// behind it). "No such process" races are suppressed.
    async fn close(&self) {
        let mut inner = self.inner.lock().await;
        inner.stdin.take();
        inner.stdout.take();
        inner.stderr.take();
        if let Some(mut child) = inner.child.take() {
            #[cfg(unix)]
            {
                if let Some(pid) = child.id() {
                    // SAFETY: pid is a valid process ID obtained from tokio::process::Child.
                    unsafe {
                        libc::kill(pid as libc::pid_t, libc::SIGTERM);
                    }
                }
            }
            #[cfg(not(unix))]
            {
                let _ = child.start_kill();
            }
            let _ = child.wait().await;
            tracing::debug!(argv = ?self.argv, "GTP engine closed");
        }
        inner.state = EngineState::Dead;
    }
}

impl Drop for SubprocessTransport {
    /// Best-effort termination of the child process on drop.
    ///
    /// MUST NOT block; if the lock is held by an in-flight turn the child
    /// is left to the OS.
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.try_lock() {
            if let Some(child) = inner.child.as_mut() {
                #[cfg(unix)]
                {
                    if let Some(pid) = child.id() {
                        // SAFETY: pid is a valid process ID obtained from tokio::process::Child.
                        unsafe {
                            libc::kill(pid as libc::pid_t, libc::SIGTERM);
                        }
                    }
                }
                #[cfg(not(unix))]
                {
                    let _ = child.start_kill();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_argv_rejects_empty_vector() {
        let result = SubprocessTransport::from_argv(vec![]);
        assert!(matches!(result, Err(FastGtpError::InvalidArgument(_))));
    }

    #[test]
    fn test_from_command_line_tokenizes_quotes() {
        let transport =
            SubprocessTransport::from_command_line("katago gtp -config '/opt/kata go.cfg'")
                .unwrap();
        assert_eq!(
            transport.argv(),
            ["katago", "gtp", "-config", "/opt/kata go.cfg"]
        );
    }

    #[test]
    fn test_from_command_line_rejects_unbalanced_quote() {
        let result = SubprocessTransport::from_command_line("engine 'unterminated");
        assert!(matches!(result, Err(FastGtpError::InvalidArgument(_))));
    }

    #[test]
    fn test_from_command_line_rejects_blank() {
        let result = SubprocessTransport::from_command_line("   ");
        assert!(matches!(result, Err(FastGtpError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_empty_command_never_spawns() {
        let transport =
            SubprocessTransport::from_argv(vec!["/nonexistent/engine".to_string()]).unwrap();
        let result = transport.send_command("   ").await;
        assert!(matches!(result, Err(FastGtpError::InvalidArgument(_))));
        // The spawn would have failed loudly; the state must still be Fresh.
        assert_eq!(transport.inner.lock().await.state, EngineState::Fresh);
    }

    #[tokio::test]
    async fn test_spawn_failure_is_transport_broken() {
        let transport =
            SubprocessTransport::from_argv(vec!["/nonexistent/engine".to_string()]).unwrap();
        let result = transport.send_command("name").await;
        assert!(matches!(result, Err(FastGtpError::TransportBroken(_))));
    }

    #[tokio::test]
    async fn test_close_before_first_turn_is_harmless() {
        let transport = SubprocessTransport::from_argv(vec!["cat".to_string()]).unwrap();
        transport.close().await;
        transport.close().await;
        let result = transport.send_command("name").await;
        assert!(matches!(result, Err(FastGtpError::EngineExited(_))));
    }
}
