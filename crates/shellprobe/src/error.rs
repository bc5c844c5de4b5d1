//! Error types for shellprobe.
//!
//! Errors are split by how a scenario reacts to them. [`SpawnError`] and the
//! I/O variants of [`ExpectError`] end a run; timeouts and unexpected EOF are
//! caught at the step boundary and turned into failed verdicts. Variants that
//! concern terminal output carry the buffer contents for diagnostics.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Maximum length of buffer content to display in error messages.
const MAX_BUFFER_DISPLAY: usize = 500;

/// Lines of the buffer tail shown when the buffer is truncated.
const TAIL_LINES: usize = 6;

/// Format buffer content for display, truncating if necessary.
pub(crate) fn format_buffer_snippet(buffer: &str) -> String {
    if buffer.is_empty() {
        return "(empty buffer)".to_string();
    }

    let lines: Vec<&str> = buffer.lines().collect();
    if buffer.len() <= MAX_BUFFER_DISPLAY || lines.len() <= TAIL_LINES {
        return format!(
            "┌─ buffer ({} bytes) ──────────────────────\n│ {}\n└────────────────────────────────────────",
            buffer.len(),
            lines.join("\n│ ")
        );
    }

    let tail = &lines[lines.len() - TAIL_LINES..];
    format!(
        "┌─ buffer ({} bytes, {} lines) ─────────────\n│ ... ({} lines hidden)\n│ {}\n└────────────────────────────────────────",
        buffer.len(),
        lines.len(),
        lines.len() - tail.len(),
        tail.join("\n│ ")
    )
}

fn format_timeout_error(duration: Duration, pattern: &str, buffer: &str) -> String {
    format!(
        "timeout after {duration:?} waiting for pattern\n\nPattern: '{pattern}'\n\n{}",
        format_buffer_snippet(buffer)
    )
}

fn format_eof_error(pattern: &str, buffer: &str) -> String {
    format!(
        "end of file reached before pattern matched\n\nPattern: '{pattern}'\n\n{}",
        format_buffer_snippet(buffer)
    )
}

/// The main error type for session and expect operations.
#[derive(Debug, Error)]
pub enum ExpectError {
    /// Failed to spawn the program under test.
    #[error("failed to spawn process: {0}")]
    Spawn(#[from] SpawnError),

    /// An I/O error occurred while talking to the terminal.
    #[error("{context}: {source}")]
    Io {
        /// What operation was being performed.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Input was sent after the process terminated or the session was closed.
    #[error("session is closed")]
    SessionClosed,

    /// Timeout waiting for a pattern.
    #[error("{}", format_timeout_error(*duration, pattern, buffer))]
    Timeout {
        /// The timeout duration that elapsed.
        duration: Duration,
        /// The pattern that was being searched for.
        pattern: String,
        /// Unconsumed output at the time of the timeout.
        buffer: String,
    },

    /// The terminal reached end-of-stream before the pattern appeared.
    #[error("{}", format_eof_error(pattern, buffer))]
    Eof {
        /// The pattern that was being searched for.
        pattern: String,
        /// Unconsumed output when EOF was reached.
        buffer: String,
    },

    /// The process did not exit within the allotted time.
    #[error("process did not exit within {duration:?}")]
    ExitTimeout {
        /// How long we waited.
        duration: Duration,
    },

    /// Invalid regex pattern.
    #[error("invalid regex pattern: {0}")]
    Regex(#[from] regex::Error),

    /// A fixture file could not be created, read or removed.
    #[error("fixture {}: {source}", path.display())]
    Fixture {
        /// The fixture path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

/// Errors raised while starting the program under test.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// The executable does not exist.
    #[error("command not found: {command}")]
    CommandNotFound {
        /// The command that was not found.
        command: String,
    },

    /// The executable exists but cannot be run.
    #[error("permission denied: {command}")]
    PermissionDenied {
        /// The command that could not be executed.
        command: String,
    },

    /// The working directory does not exist or is not a directory.
    #[error("invalid working directory: {}", path.display())]
    InvalidWorkingDir {
        /// The offending path.
        path: PathBuf,
    },

    /// PTY allocation or setup failed.
    #[error("failed to allocate PTY: {0}")]
    PtyAllocation(#[source] shellprobe_pty::PtyError),

    /// Any other I/O failure while spawning.
    #[error("I/O error during spawn: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for shellprobe operations.
pub type Result<T> = std::result::Result<T, ExpectError>;

impl ExpectError {
    /// Create a timeout error.
    pub fn timeout(duration: Duration, pattern: impl Into<String>, buffer: impl Into<String>) -> Self {
        Self::Timeout {
            duration,
            pattern: pattern.into(),
            buffer: buffer.into(),
        }
    }

    /// Create an EOF error.
    pub fn eof(pattern: impl Into<String>, buffer: impl Into<String>) -> Self {
        Self::Eof {
            pattern: pattern.into(),
            buffer: buffer.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io_context(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a fixture error.
    pub fn fixture(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Fixture {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if this is an EOF error.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::Eof { .. })
    }

    /// Whether the error ends the scenario instead of failing a single step.
    ///
    /// Waiting errors (`Timeout`, `Eof`) only concern the current step.
    /// Everything else means the session can no longer be trusted.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Timeout { .. } | Self::Eof { .. })
    }

    /// Get the buffer contents if this error contains them.
    #[must_use]
    pub fn buffer(&self) -> Option<&str> {
        match self {
            Self::Timeout { buffer, .. } | Self::Eof { buffer, .. } => Some(buffer),
            _ => None,
        }
    }
}

impl SpawnError {
    /// Classify a PTY spawn failure for `command`.
    pub fn from_pty(command: &str, err: shellprobe_pty::PtyError) -> Self {
        let exec_failed = matches!(err, shellprobe_pty::PtyError::Spawn(_));
        match (exec_failed, err.io_kind()) {
            (true, Some(std::io::ErrorKind::NotFound)) => Self::CommandNotFound {
                command: command.to_string(),
            },
            (true, Some(std::io::ErrorKind::PermissionDenied)) => Self::PermissionDenied {
                command: command.to_string(),
            },
            _ => Self::PtyAllocation(err),
        }
    }
}
