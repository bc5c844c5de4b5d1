//! Session handle for interacting with a spawned process.
//!
//! This module provides the main `Session` type: it owns the child, the write
//! half of the PTY master and a [`Matcher`] over the output the reader task
//! collects.

use std::sync::Arc;
use std::time::Duration;

use shellprobe_pty::{PtyChild, PtyError, PtyMaster, PtySignal};
use tokio::io::{AsyncWriteExt, WriteHalf};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use super::reader::spawn_reader;
use crate::config::SessionConfig;
use crate::error::{ExpectError, Result, SpawnError};
use crate::expect::{Matcher, OutputBuffer, Pattern, PatternSet};
use crate::types::{ControlChar, ExitStatus, Match, SessionState};

/// A program running on a pseudo-terminal.
///
/// Release it with [`close`](Self::close). Dropping an open session kills the
/// child and stops the reader without waiting.
pub struct Session {
    config: SessionConfig,
    child: PtyChild,
    /// `None` once the session is closed.
    writer: Option<WriteHalf<PtyMaster>>,
    reader: Option<JoinHandle<()>>,
    matcher: Matcher,
    state: SessionState,
}

impl Session {
    /// Spawn `command` with default configuration.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(command: &str, args: &[&str]) -> std::result::Result<Self, SpawnError> {
        Self::spawn_with_config(SessionConfig::new(command).args(args.iter().copied()))
    }

    /// Spawn the program described by `config`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_with_config(config: SessionConfig) -> std::result::Result<Self, SpawnError> {
        if let Some(ref dir) = config.working_dir {
            if !dir.is_dir() {
                return Err(SpawnError::InvalidWorkingDir { path: dir.clone() });
            }
        }

        let program = config.resolved_program()?;
        let (master, child) = shellprobe_pty::spawn(&program, &config.args, &config.pty_config())
            .map_err(|e| SpawnError::from_pty(&config.program, e))?;
        let (read_half, write_half) = tokio::io::split(master);

        let buffer = Arc::new(Mutex::new(OutputBuffer::new(config.buffer.retain_consumed)));
        let (notify_tx, notify_rx) = watch::channel(0);
        let reader = spawn_reader(read_half, Arc::clone(&buffer), notify_tx);

        tracing::debug!(program = %config.program, pid = child.pid(), "session started");

        Ok(Self {
            matcher: Matcher::new(buffer, notify_rx, config.timeout.expect),
            config,
            child,
            writer: Some(write_half),
            reader: Some(reader),
            state: SessionState::Running,
        })
    }

    /// Get the process ID.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.child.pid()
    }

    /// Get the current session state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Get the session configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The exit status, once the child has been reaped.
    #[must_use]
    pub const fn exit_status(&self) -> Option<ExitStatus> {
        self.child.exit_status()
    }

    /// Output received but not yet consumed by a match.
    pub async fn buffer(&self) -> String {
        self.matcher.buffer().lock().await.pending().to_string()
    }

    /// Everything the program printed, when consumed output is retained.
    pub async fn transcript(&self) -> Option<String> {
        self.matcher.buffer().lock().await.transcript().map(str::to_string)
    }

    /// Set the default expect timeout.
    pub const fn set_timeout(&mut self, timeout: Duration) {
        self.matcher.set_default_timeout(timeout);
    }

    /// Write raw bytes to the program. No newline is added.
    ///
    /// Fails with [`ExpectError::SessionClosed`] once the program has exited
    /// or the session was closed.
    pub async fn write(&mut self, data: &[u8]) -> Result<()> {
        if !self.refresh_state().is_usable() {
            return Err(ExpectError::SessionClosed);
        }
        let writer = self.writer.as_mut().ok_or(ExpectError::SessionClosed)?;

        tracing::trace!(bytes = data.len(), data = ?String::from_utf8_lossy(data), "sending");
        writer
            .write_all(data)
            .await
            .map_err(|e| ExpectError::io_context("writing to process", e))?;
        writer
            .flush()
            .await
            .map_err(|e| ExpectError::io_context("flushing process input", e))?;
        Ok(())
    }

    /// Send a line to the process (appends the configured line ending).
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        let data = format!("{line}{}", self.config.line_ending.as_str());
        self.write(data.as_bytes()).await
    }

    /// Send a control character to the process.
    pub async fn send_control(&mut self, ctrl: ControlChar) -> Result<()> {
        self.write(&[ctrl.as_byte()]).await
    }

    /// Expect a pattern within the default timeout.
    pub async fn expect(&mut self, pattern: impl Into<Pattern>) -> Result<Match> {
        let timeout = self.matcher.default_timeout();
        self.expect_timeout(pattern, timeout).await
    }

    /// Expect a pattern within `timeout`.
    pub async fn expect_timeout(&mut self, pattern: impl Into<Pattern>, timeout: Duration) -> Result<Match> {
        let patterns = PatternSet::from(pattern.into());
        self.matcher.expect(&patterns, timeout).await
    }

    /// Expect any of `patterns` within `timeout`.
    ///
    /// The match starting earliest in the output wins; ties go to the
    /// pattern listed first.
    pub async fn expect_any(&mut self, patterns: &PatternSet, timeout: Duration) -> Result<Match> {
        self.matcher.expect(patterns, timeout).await
    }

    /// Wait for the program to close its terminal.
    pub async fn expect_eof(&mut self, timeout: Duration) -> Result<Match> {
        self.expect_timeout(Pattern::Eof, timeout).await
    }

    /// Check whether the program is still running. Never blocks.
    pub fn is_alive(&mut self) -> bool {
        self.refresh_state() == SessionState::Running
    }

    /// Wait for the program to exit.
    pub async fn wait_exit(&mut self, timeout: Duration) -> Result<ExitStatus> {
        let status = tokio::time::timeout(timeout, self.child.wait())
            .await
            .map_err(|_| ExpectError::ExitTimeout { duration: timeout })?
            .map_err(|e| pty_error("waiting for process", e))?;

        if self.state == SessionState::Running {
            self.state = SessionState::Exited(status);
        }
        Ok(status)
    }

    /// Release the program and the terminal.
    ///
    /// A running program gets SIGHUP, as if its terminal had been hung up,
    /// and SIGKILL if it is still there after `timeout.close`. The reader is
    /// stopped and the child reaped. Calling `close` again is a no-op.
    pub async fn close(&mut self) -> Result<Option<ExitStatus>> {
        if self.state == SessionState::Closed {
            return Ok(self.child.exit_status());
        }

        let mut result = Ok(());
        if self.refresh_state() == SessionState::Running {
            result = self.hang_up().await;
        }

        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.shutdown().await {
                tracing::debug!(error = %e, "pty shutdown failed");
            }
        }

        self.state = SessionState::Closed;
        tracing::debug!(pid = self.child.pid(), status = ?self.child.exit_status(), "session closed");
        result.map(|()| self.child.exit_status())
    }

    async fn hang_up(&mut self) -> Result<()> {
        let grace = self.config.timeout.close;

        match self.child.signal(PtySignal::Hangup) {
            Ok(()) | Err(PtyError::ProcessExited) => {}
            Err(e) => tracing::warn!(error = %e, "failed to hang up child"),
        }
        if tokio::time::timeout(grace, self.child.wait()).await.is_ok() {
            return Ok(());
        }

        tracing::warn!(pid = self.child.pid(), ?grace, "child ignored SIGHUP, killing");
        match self.child.kill() {
            Ok(()) | Err(PtyError::ProcessExited) => {}
            Err(e) => return Err(pty_error("killing process", e)),
        }
        self.child
            .wait()
            .await
            .map(|_| ())
            .map_err(|e| pty_error("reaping process", e))
    }

    /// Reap the child if it has exited and update the state.
    fn refresh_state(&mut self) -> SessionState {
        if self.state == SessionState::Running {
            match self.child.try_wait() {
                Ok(Some(status)) => self.state = SessionState::Exited(status),
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "failed to poll child status"),
            }
        }
        self.state
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        if self.state != SessionState::Closed && matches!(self.child.try_wait(), Ok(None)) {
            tracing::debug!(pid = self.child.pid(), "session dropped without close, killing child");
            if let Err(e) = self.child.kill() {
                tracing::warn!(error = %e, "failed to kill child on drop");
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("program", &self.config.program)
            .field("pid", &self.child.pid())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

fn pty_error(context: &str, err: PtyError) -> ExpectError {
    ExpectError::io_context(context, std::io::Error::other(err))
}
