//! Subprocess transport turns against real child processes
//!
//! These tests use `sh` one-liners as stand-in GTP engines so the real
//! spawn/write/read/teardown path is exercised: framing, crash detection,
//! stderr capture, FIFO turn serialization, and close semantics.

#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;

use fastgtp::error::FastGtpError;
use fastgtp::gtp;
use fastgtp::transport::subprocess::SubprocessTransport;
use fastgtp::transport::GtpTransport;

/// Engine whose behavior is a small shell script.
fn sh_engine(script: &str) -> SubprocessTransport {
    SubprocessTransport::from_argv(vec![
        "sh".to_string(),
        "-c".to_string(),
        script.to_string(),
    ])
    .expect("argv is non-empty")
}

/// Engine that answers every command with `= <command>` and a blank line.
fn echo_engine() -> SubprocessTransport {
    sh_engine(r#"while read line; do echo "= $line"; echo; done"#)
}

#[tokio::test]
async fn test_turn_returns_complete_frame() {
    let engine = echo_engine();

    let raw = engine.send_command("name").await.unwrap();
    assert_eq!(raw, "= name\n\n");

    let parsed = gtp::parse_response(&raw, None).unwrap();
    assert!(parsed.success);
    assert_eq!(parsed.payload, "name");

    engine.close().await;
}

#[tokio::test]
async fn test_command_is_trimmed_before_sending() {
    let engine = echo_engine();
    let raw = engine.send_command("  name \n").await.unwrap();
    assert_eq!(raw, "= name\n\n");
    engine.close().await;
}

#[tokio::test]
async fn test_multi_line_frame_is_returned_unchanged() {
    let engine = sh_engine(r#"read line; printf '=\nname\nversion\n\n'"#);
    let raw = engine.send_command("list_commands").await.unwrap();
    assert_eq!(raw, "=\nname\nversion\n\n");
    engine.close().await;
}

#[tokio::test]
async fn test_chatter_before_status_line_stays_in_frame() {
    // The transport keeps reading through chatter: the frame ends at the
    // first whitespace-only line, which comes after the status line here.
    let engine = sh_engine(r#"read line; printf 'booting engine\n= ok\n\n'"#);
    let raw = engine.send_command("name").await.unwrap();
    let parsed = gtp::parse_response(&raw, None).unwrap();
    assert!(parsed.success);
    assert_eq!(parsed.payload, "ok");
    engine.close().await;
}

#[tokio::test]
async fn test_crash_mid_turn_is_engine_exited_and_terminal() {
    // Prints a status line but exits before the terminating blank line.
    let engine = sh_engine(r#"read line; printf '= partial\n'"#);

    let first = engine.send_command("genmove B").await;
    match first {
        Err(FastGtpError::EngineExited(message)) => {
            assert!(message.contains("terminated unexpectedly"), "{message}");
        }
        other => panic!("expected EngineExited, got {other:?}"),
    }

    // The transport is dead for good; no respawn.
    let second = engine.send_command("name").await;
    assert!(matches!(second, Err(FastGtpError::EngineExited(_))));
}

#[tokio::test]
async fn test_crash_carries_stderr() {
    let engine = sh_engine(r#"read line; echo 'model file missing' >&2; exit 3"#);

    let result = engine.send_command("name").await;
    match result {
        Err(FastGtpError::EngineExited(message)) => {
            assert!(message.contains("model file missing"), "{message}");
        }
        other => panic!("expected EngineExited, got {other:?}"),
    }
}

#[tokio::test]
async fn test_exit_before_any_output() {
    let engine = sh_engine("exit 0");
    let result = engine.send_command("name").await;
    assert!(matches!(result, Err(FastGtpError::EngineExited(_))));
}

#[tokio::test]
async fn test_concurrent_turns_pair_replies_with_commands() {
    let engine = Arc::new(echo_engine());

    let mut handles = Vec::new();
    for i in 0..8 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            let command = format!("play B C{i}");
            let raw = engine.send_command(&command).await.unwrap();
            (command, raw)
        }));
    }

    for handle in handles {
        let (command, raw) = handle.await.unwrap();
        // No crossover: each caller sees the reply to its own command.
        assert_eq!(raw, format!("= {command}\n\n"));
    }

    engine.close().await;
}

#[tokio::test]
async fn test_close_is_idempotent_under_concurrent_turns() {
    let engine = Arc::new(echo_engine());
    engine.send_command("name").await.unwrap();

    let closer = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine.close().await;
            engine.close().await;
        })
    };
    closer.await.unwrap();

    let result = engine.send_command("name").await;
    assert!(matches!(result, Err(FastGtpError::EngineExited(_))));
}

#[tokio::test]
async fn test_turn_timeout_kills_engine() {
    let engine = sh_engine("read line; sleep 10").with_turn_timeout(Duration::from_millis(200));

    let first = engine.send_command("genmove B").await;
    assert!(matches!(first, Err(FastGtpError::Timeout(_))));

    let second = engine.send_command("name").await;
    assert!(matches!(second, Err(FastGtpError::EngineExited(_))));
}

#[tokio::test]
async fn test_spawn_is_lazy() {
    // Construction must not spawn: the binary does not exist, yet the
    // constructor succeeds and only the first turn fails.
    let engine = SubprocessTransport::from_argv(vec!["/nonexistent/engine".to_string()])
        .expect("construction is lazy");
    let result = engine.send_command("name").await;
    assert!(matches!(result, Err(FastGtpError::TransportBroken(_))));
}
