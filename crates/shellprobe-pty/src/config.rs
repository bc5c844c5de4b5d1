//! Configuration types for spawning a program on a PTY.
//!
//! [`PtyConfig`] describes the child's environment and terminal geometry,
//! [`PtySignal`] names the signals the harness sends during shutdown.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::{PtyError, Result};

/// Configuration for spawning a child on a new PTY.
///
/// # Example
///
/// ```
/// use shellprobe_pty::PtyConfig;
///
/// let config = PtyConfig::builder()
///     .working_directory("/tmp")
///     .env("TERM", "xterm-256color")
///     .window_size(80, 24)
///     .build();
/// assert_eq!(config.window_size.cols, 80);
/// ```
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// Working directory for the child process.
    pub working_directory: Option<PathBuf>,

    /// Variables added to (or overriding) the inherited environment.
    pub env_add: HashMap<OsString, OsString>,

    /// Variables removed from the inherited environment.
    pub env_remove: Vec<OsString>,

    /// Initial window size.
    pub window_size: WindowSize,

    /// Make the slave the child's controlling terminal (`setsid` + `TIOCSCTTY`).
    pub controlling_terminal: bool,
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self {
            working_directory: None,
            env_add: HashMap::new(),
            env_remove: Vec::new(),
            window_size: WindowSize::default(),
            controlling_terminal: true,
        }
    }
}

impl PtyConfig {
    /// Create a new builder for `PtyConfig`.
    #[must_use]
    pub fn builder() -> PtyConfigBuilder {
        PtyConfigBuilder::default()
    }

    /// The environment the child will see.
    ///
    /// Starts from the parent's environment, applies `env_add`, then drops
    /// everything listed in `env_remove`.
    #[must_use]
    pub fn effective_env(&self) -> HashMap<OsString, OsString> {
        let mut env: HashMap<OsString, OsString> = std::env::vars_os().collect();
        env.extend(self.env_add.clone());
        for key in &self.env_remove {
            env.remove(key);
        }
        env
    }

    /// Check the configuration before any resources are allocated.
    pub fn validate(&self) -> Result<()> {
        self.window_size.validate()
    }
}

/// Builder for [`PtyConfig`].
#[derive(Debug, Clone, Default)]
pub struct PtyConfigBuilder {
    config: PtyConfig,
}

impl PtyConfigBuilder {
    /// Set the working directory for the child process.
    #[must_use]
    pub fn working_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.working_directory = Some(path.into());
        self
    }

    /// Add an environment variable.
    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.config.env_add.insert(key.into(), value.into());
        self
    }

    /// Remove an environment variable.
    #[must_use]
    pub fn env_remove(mut self, key: impl Into<OsString>) -> Self {
        self.config.env_remove.push(key.into());
        self
    }

    /// Set the initial window size.
    #[must_use]
    pub const fn window_size(mut self, cols: u16, rows: u16) -> Self {
        self.config.window_size = WindowSize::new(cols, rows);
        self
    }

    /// Set whether the slave becomes the controlling terminal.
    #[must_use]
    pub const fn controlling_terminal(mut self, value: bool) -> Self {
        self.config.controlling_terminal = value;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> PtyConfig {
        self.config
    }
}

/// Signals the harness sends to a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PtySignal {
    /// SIGKILL; cannot be caught.
    Kill,
    /// SIGHUP, what a shell receives when its terminal goes away.
    Hangup,
}

impl PtySignal {
    /// The Unix signal number.
    #[must_use]
    pub const fn as_unix_signal(self) -> i32 {
        match self {
            Self::Kill => libc::SIGKILL,
            Self::Hangup => libc::SIGHUP,
        }
    }
}

/// Window size for the PTY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    /// Number of columns (characters per line).
    pub cols: u16,
    /// Number of rows (lines).
    pub rows: u16,
}

impl WindowSize {
    /// Create a new window size with the given dimensions.
    #[must_use]
    pub const fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }

    /// Reject degenerate sizes; line-editing shells misbehave on a 0-column terminal.
    pub const fn validate(self) -> Result<()> {
        if self.cols == 0 || self.rows == 0 {
            return Err(PtyError::InvalidWindowSize {
                cols: self.cols,
                rows: self.rows,
            });
        }
        Ok(())
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

impl From<(u16, u16)> for WindowSize {
    fn from((cols, rows): (u16, u16)) -> Self {
        Self::new(cols, rows)
    }
}
