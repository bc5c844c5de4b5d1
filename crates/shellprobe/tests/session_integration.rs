//! Integration tests for sessions on a real PTY.
//!
//! These drive `/bin/sh` and `cat`, which every Unix test host has.

#![cfg(unix)]

use std::path::PathBuf;
use std::time::Duration;

use shellprobe::{
    ControlChar, ExpectError, Pattern, PatternSet, Session, SessionConfig, SessionState, SpawnError,
    TimeoutConfig,
};

const WAIT: Duration = Duration::from_secs(5);

fn sh() -> SessionConfig {
    SessionConfig::new("/bin/sh")
        .args(["-i"])
        .env("PS1", "$ ")
        .env("ENV", "")
        .timeout(WAIT)
        .retain_consumed(true)
}

/// Spawn an interactive shell, run a command and read its output.
#[tokio::test]
async fn shell_command_output_before_prompt() {
    let mut session = Session::spawn_with_config(sh()).unwrap();
    session.expect("$ ").await.unwrap();

    // Quoting keeps the echoed command line from matching the output.
    session.send_line(r#"echo hel""lo"#).await.unwrap();
    let m = session.expect(Pattern::regex(r"hello\r?\n").unwrap()).await.unwrap();
    assert!(m.before.contains(r#"echo hel""lo"#));

    session.expect("$ ").await.unwrap();
    session.close().await.unwrap();
    assert_eq!(session.state(), SessionState::Closed);
}

/// A timeout reports what arrived and leaves it in the buffer.
#[tokio::test]
async fn timeout_carries_partial_output() {
    let mut session = Session::spawn("cat", &[]).unwrap();
    session.write(b"partial").await.unwrap();

    // The terminal echoes the unfinished line.
    session.expect("partial").await.unwrap();
    session.write(b" more").await.unwrap();

    let err = session
        .expect_timeout("never printed", Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert!(!err.is_fatal());
    assert!(err.buffer().unwrap().contains("more"));
    assert!(session.buffer().await.contains("more"));
    assert!(session.is_alive(), "a timeout must not kill the program");

    session.close().await.unwrap();
}

/// End of stream satisfies an EOF pattern and fails a text pattern early.
#[tokio::test]
async fn eof_after_program_exits() {
    let mut session = Session::spawn("/bin/sh", &["-c", "echo done"]).unwrap();

    let m = session.expect_eof(WAIT).await.unwrap();
    assert!(m.eof);
    assert!(m.before.contains("done"));

    let started = std::time::Instant::now();
    let err = session.expect_timeout("anything", WAIT).await.unwrap_err();
    assert!(err.is_eof());
    assert!(started.elapsed() < WAIT);

    let status = session.wait_exit(WAIT).await.unwrap();
    assert!(status.success());
}

/// Writing to a program that has exited is a fatal error.
#[tokio::test]
async fn write_after_exit_fails() {
    let mut session = Session::spawn("true", &[]).unwrap();
    session.wait_exit(WAIT).await.unwrap();
    assert!(!session.is_alive());

    let err = session.send_line("hello").await.unwrap_err();
    assert!(matches!(err, ExpectError::SessionClosed));
    assert!(err.is_fatal());
}

/// Ctrl-D at the start of a line ends `cat`.
#[tokio::test]
async fn control_character_reaches_program() {
    let mut session = Session::spawn("cat", &[]).unwrap();
    session.send_line("line").await.unwrap();
    session.expect(Pattern::regex(r"line\r\nline").unwrap()).await.unwrap();

    session.send_control(ControlChar::CtrlD).await.unwrap();
    session.expect_eof(WAIT).await.unwrap();
    assert!(session.wait_exit(WAIT).await.unwrap().success());
}

/// The match that starts earliest wins, whatever the pattern order.
#[tokio::test]
async fn expect_any_prefers_earliest_match() {
    let mut session = Session::spawn("/bin/sh", &["-c", "echo first second"]).unwrap();
    let patterns: PatternSet = vec![Pattern::literal("second"), Pattern::literal("first"), Pattern::Eof]
        .into_iter()
        .collect();

    let m = session.expect_any(&patterns, WAIT).await.unwrap();
    assert_eq!(m.pattern_index, 1);

    let m = session.expect_any(&patterns, WAIT).await.unwrap();
    assert_eq!(m.pattern_index, 0);
    assert_eq!(m.before, " ");

    let m = session.expect_any(&patterns, WAIT).await.unwrap();
    assert_eq!(m.pattern_index, 2);
}

#[tokio::test]
async fn missing_program_is_command_not_found() {
    let err = Session::spawn("/nonexistent/shell", &[]).unwrap_err();
    assert!(matches!(err, SpawnError::CommandNotFound { ref command } if command == "/nonexistent/shell"));
}

#[tokio::test]
async fn invalid_working_directory_is_rejected() {
    let err = Session::spawn_with_config(SessionConfig::new("/bin/sh").working_dir("/nonexistent/dir")).unwrap_err();
    assert!(matches!(err, SpawnError::InvalidWorkingDir { .. }));
}

/// `close` escalates to SIGKILL when SIGHUP is ignored.
#[tokio::test]
async fn close_kills_program_ignoring_hangup() {
    let config = SessionConfig::new("/bin/sh")
        .args(["-c", "trap '' HUP; echo armed; sleep 30"])
        .timeouts(TimeoutConfig::new(WAIT).close(Duration::from_millis(200)));
    let mut session = Session::spawn_with_config(config).unwrap();
    session.expect("armed").await.unwrap();

    let status = session.close().await.unwrap().unwrap();
    assert!(!status.success());
    assert_eq!(status.signal(), Some(9), "expected SIGKILL");

    // Closing twice is harmless.
    assert_eq!(session.close().await.unwrap(), Some(status));
    assert!(matches!(session.write(b"x").await, Err(ExpectError::SessionClosed)));
}

/// The transcript keeps consumed output when retention is on.
#[tokio::test]
async fn transcript_keeps_everything() {
    let mut session = Session::spawn_with_config(
        SessionConfig::new("/bin/sh")
            .args(["-c", "echo one; echo two"])
            .retain_consumed(true),
    )
    .unwrap();

    session.expect("one").await.unwrap();
    session.expect_eof(WAIT).await.unwrap();

    let transcript = session.transcript().await.unwrap();
    assert!(transcript.contains("one"));
    assert!(transcript.contains("two"));
    assert_eq!(session.buffer().await, "");
}

/// A relative program path is found from the launch directory, not the
/// child's working directory.
#[tokio::test]
async fn relative_program_ignores_working_dir() {
    let bin = tempfile::tempdir().unwrap();
    let bin_path = bin.path().canonicalize().unwrap();
    std::os::unix::fs::symlink("/bin/sh", bin_path.join("prog")).unwrap();
    let elsewhere = tempfile::tempdir().unwrap();

    let cwd = std::env::current_dir().unwrap();
    let depth = cwd.components().count() - 1;
    let relative: PathBuf = std::iter::repeat_n("..", depth)
        .collect::<PathBuf>()
        .join(bin_path.strip_prefix("/").unwrap())
        .join("prog");
    assert!(relative.is_relative());

    let config = SessionConfig::new(relative.to_string_lossy())
        .args(["-c", "echo relative-ok; pwd"])
        .working_dir(elsewhere.path());
    let mut session = Session::spawn_with_config(config).unwrap();

    let m = session.expect_eof(WAIT).await.unwrap();
    assert!(m.before.contains("relative-ok"));
    let elsewhere_name = elsewhere.path().file_name().unwrap().to_string_lossy().into_owned();
    assert!(m.before.contains(&elsewhere_name));
    assert!(session.wait_exit(WAIT).await.unwrap().success());
}

/// Removed variables are hidden and no default TERM is put back.
#[tokio::test]
async fn removed_env_is_not_inherited() {
    let config = SessionConfig::new("/bin/sh")
        .args(["-c", r#"echo "term=${TERM-unset}""#])
        .env_remove("TERM");
    let mut session = Session::spawn_with_config(config).unwrap();

    let m = session.expect_eof(WAIT).await.unwrap();
    assert!(m.before.contains("term=unset"), "got {:?}", m.before);
}

/// By default the PTY is the child's controlling terminal.
#[tokio::test]
async fn child_owns_controlling_terminal() {
    let mut session =
        Session::spawn("/bin/sh", &["-c", "(: < /dev/tty) 2>/dev/null && echo tty-yes"]).unwrap();

    let m = session.expect_eof(WAIT).await.unwrap();
    assert!(m.before.contains("tty-yes"));
}
