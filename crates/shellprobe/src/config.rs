//! Configuration types for shellprobe.
//!
//! [`SessionConfig`] describes one spawned program and how the harness talks
//! to it. [`ProbeConfig`] is the run-level configuration of the `shellprobe`
//! binary, assembled in layers: built-in defaults, then a TOML file, then
//! `SHELLPROBE_*` environment variables, then command-line flags.

mod env;
mod file;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use shellprobe_pty::PtyConfig;

use crate::error::{ExpectError, Result, SpawnError};
use crate::expect::Pattern;

pub use env::{DEFAULT_PREFIX, EnvConfig, vars};
pub use file::{ConfigError, FileConfig};

/// Default expect timeout (3 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Default time allowed for the program to exit after the exit command.
pub const DEFAULT_EXIT_TIMEOUT: Duration = Duration::from_secs(3);

/// Default grace period between SIGHUP and SIGKILL in `close()`.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Default terminal width.
pub const DEFAULT_TERMINAL_WIDTH: u16 = 80;

/// Default terminal height.
pub const DEFAULT_TERMINAL_HEIGHT: u16 = 24;

/// TERM given to the child when the parent has none.
pub const DEFAULT_TERM: &str = "xterm-256color";

/// Default program under test.
pub const DEFAULT_SHELL: &str = "./build/shell";

/// Default prompt pattern.
pub const DEFAULT_PROMPT: &str = r"\$";

/// Default command that ends the program under test.
pub const DEFAULT_EXIT_COMMAND: &str = "exit";

/// Configuration for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// The program to execute.
    pub program: String,

    /// Program arguments.
    pub args: Vec<String>,

    /// Environment variables added to the inherited environment.
    pub env: HashMap<String, String>,

    /// Inherited environment variables the child must not see.
    pub env_remove: Vec<String>,

    /// Working directory for the process.
    pub working_dir: Option<PathBuf>,

    /// Terminal dimensions (width, height).
    pub dimensions: (u16, u16),

    /// Timeout configuration.
    pub timeout: TimeoutConfig,

    /// Buffer configuration.
    pub buffer: BufferConfig,

    /// Line ending appended by `send_line`.
    pub line_ending: LineEnding,

    /// Give the child the PTY as its controlling terminal.
    pub controlling_terminal: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            program: String::new(),
            args: Vec::new(),
            env: HashMap::new(),
            env_remove: Vec::new(),
            working_dir: None,
            dimensions: (DEFAULT_TERMINAL_WIDTH, DEFAULT_TERMINAL_HEIGHT),
            timeout: TimeoutConfig::default(),
            buffer: BufferConfig::default(),
            line_ending: LineEnding::default(),
            controlling_terminal: true,
        }
    }
}

impl SessionConfig {
    /// Create a new session configuration with the given program.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    /// Set the program arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Add an environment variable.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Hide an inherited environment variable from the child.
    #[must_use]
    pub fn env_remove(mut self, key: impl Into<String>) -> Self {
        self.env_remove.push(key.into());
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }

    /// Set the terminal dimensions.
    #[must_use]
    pub const fn dimensions(mut self, width: u16, height: u16) -> Self {
        self.dimensions = (width, height);
        self
    }

    /// Set the default expect timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout.expect = timeout;
        self
    }

    /// Replace the whole timeout configuration.
    #[must_use]
    pub const fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeout = timeouts;
        self
    }

    /// Keep consumed output so the full transcript stays available.
    #[must_use]
    pub const fn retain_consumed(mut self, retain: bool) -> Self {
        self.buffer.retain_consumed = retain;
        self
    }

    /// Set the line ending style.
    #[must_use]
    pub const fn line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Keep the child out of a new session when `false`.
    ///
    /// Job control and `/dev/tty` are unavailable to such a child.
    #[must_use]
    pub const fn controlling_terminal(mut self, value: bool) -> Self {
        self.controlling_terminal = value;
        self
    }

    /// The program path handed to exec.
    ///
    /// The child changes into `working_dir` before exec, so a relative path
    /// with a directory part (`./build/shell`) is made absolute against the
    /// current directory first. Bare names are left to the `PATH` lookup.
    pub fn resolved_program(&self) -> std::io::Result<String> {
        let path = Path::new(&self.program);
        if path.is_relative() && path.components().count() > 1 {
            Ok(std::path::absolute(path)?.to_string_lossy().into_owned())
        } else {
            Ok(self.program.clone())
        }
    }

    /// Translate into the PTY layer's spawn configuration.
    ///
    /// The child inherits the parent's environment plus `env`, minus
    /// `env_remove`. When neither defines `TERM` and it is not removed, it
    /// gets [`DEFAULT_TERM`].
    #[must_use]
    pub fn pty_config(&self) -> PtyConfig {
        let (cols, rows) = self.dimensions;
        let mut builder = PtyConfig::builder()
            .window_size(cols, rows)
            .controlling_terminal(self.controlling_terminal);

        if let Some(ref dir) = self.working_dir {
            builder = builder.working_directory(dir);
        }
        for (key, value) in &self.env {
            builder = builder.env(key, value);
        }
        for key in &self.env_remove {
            builder = builder.env_remove(key);
        }
        let term_removed = self.env_remove.iter().any(|key| key == "TERM");
        if !term_removed && !self.env.contains_key("TERM") && std::env::var_os("TERM").is_none() {
            builder = builder.env("TERM", DEFAULT_TERM);
        }

        builder.build()
    }
}

/// Configuration for timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Default timeout for expect operations.
    pub expect: Duration,

    /// Time between SIGHUP and SIGKILL when closing.
    pub close: Duration,

    /// Time allowed for the program to reach end of stream after the exit command.
    pub exit: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            expect: DEFAULT_TIMEOUT,
            close: DEFAULT_CLOSE_TIMEOUT,
            exit: DEFAULT_EXIT_TIMEOUT,
        }
    }
}

impl TimeoutConfig {
    /// Create a new timeout configuration with the given expect timeout.
    #[must_use]
    pub fn new(expect: Duration) -> Self {
        Self {
            expect,
            ..Default::default()
        }
    }

    /// Set the close timeout.
    #[must_use]
    pub const fn close(mut self, timeout: Duration) -> Self {
        self.close = timeout;
        self
    }

    /// Set the exit timeout.
    #[must_use]
    pub const fn exit(mut self, timeout: Duration) -> Self {
        self.exit = timeout;
        self
    }
}

/// Configuration for the output buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferConfig {
    /// Keep text that matches have consumed, for transcripts.
    pub retain_consumed: bool,
}

/// Line ending styles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// Unix-style line ending (LF).
    #[default]
    Lf,

    /// Windows-style line ending (CRLF).
    CrLf,

    /// Carriage return, what the Enter key sends.
    Cr,
}

impl LineEnding {
    /// Get the line ending as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
        }
    }

    /// Get the line ending as bytes.
    #[must_use]
    pub const fn as_bytes(self) -> &'static [u8] {
        self.as_str().as_bytes()
    }
}

/// Run-level configuration of the `shellprobe` binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Program under test.
    pub shell: PathBuf,
    /// Arguments for the program under test.
    pub args: Vec<String>,
    /// Prompt regex used to synchronize steps.
    pub prompt: String,
    /// Expect timeout for every step.
    pub timeout: Duration,
    /// Time allowed for the program to exit.
    pub exit_timeout: Duration,
    /// Grace period between SIGHUP and SIGKILL.
    pub close_timeout: Duration,
    /// Directory the program runs in and where fixtures live.
    pub work_dir: Option<PathBuf>,
    /// TERM override for the child.
    pub term: Option<String>,
    /// Terminal dimensions (width, height).
    pub dimensions: (u16, u16),
    /// Command that ends the program.
    pub exit_command: String,
    /// Line ending appended to every line of input.
    pub line_ending: LineEnding,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            shell: PathBuf::from(DEFAULT_SHELL),
            args: Vec::new(),
            prompt: DEFAULT_PROMPT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            exit_timeout: DEFAULT_EXIT_TIMEOUT,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            work_dir: None,
            term: None,
            dimensions: (DEFAULT_TERMINAL_WIDTH, DEFAULT_TERMINAL_HEIGHT),
            exit_command: DEFAULT_EXIT_COMMAND.to_string(),
            line_ending: LineEnding::Lf,
        }
    }
}

impl ProbeConfig {
    /// Defaults, overlaid with `file` (when given) and then the environment.
    pub fn layered(file: Option<&Path>, env: &EnvConfig) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = file {
            FileConfig::load(path)?.apply(&mut config);
        }
        env.apply(&mut config)?;
        Ok(config)
    }

    /// The working directory as a canonical absolute path.
    ///
    /// Falls back to the current directory. A directory that does not exist
    /// is a spawn error.
    pub fn resolved_work_dir(&self) -> Result<PathBuf> {
        let dir = match self.work_dir {
            Some(ref dir) => dir.clone(),
            None => std::env::current_dir()
                .map_err(|e| ExpectError::io_context("reading current directory", e))?,
        };
        dir.canonicalize()
            .map_err(|_| SpawnError::InvalidWorkingDir { path: dir }.into())
    }

    /// Compile the prompt regex.
    pub fn prompt_pattern(&self) -> Result<Pattern> {
        Pattern::regex(&self.prompt).map_err(ExpectError::from)
    }

    /// Reject settings that would make every step fail.
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(ExpectError::config("timeout must be greater than zero"));
        }
        if self.dimensions.0 == 0 || self.dimensions.1 == 0 {
            return Err(ExpectError::config(format!(
                "invalid terminal size {}x{}",
                self.dimensions.0, self.dimensions.1
            )));
        }
        self.prompt_pattern().map(|_| ())
    }

    /// Session configuration for the program under test in `work_dir`.
    #[must_use]
    pub fn session_config(&self, work_dir: &Path) -> SessionConfig {
        let shell = if self.shell.is_relative() && self.shell.components().count() > 1 {
            std::path::absolute(&self.shell).unwrap_or_else(|_| self.shell.clone())
        } else {
            self.shell.clone()
        };
        let mut config = SessionConfig::new(shell.to_string_lossy())
            .args(self.args.iter().cloned())
            .working_dir(work_dir)
            .dimensions(self.dimensions.0, self.dimensions.1)
            .timeouts(
                TimeoutConfig::new(self.timeout)
                    .close(self.close_timeout)
                    .exit(self.exit_timeout),
            )
            .line_ending(self.line_ending)
            .retain_consumed(true);

        if let Some(ref term) = self.term {
            config = config.env("TERM", term);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn session_config_builder() {
        let config = SessionConfig::new("/bin/sh")
            .args(["-i"])
            .env("PS1", "$ ")
            .working_dir("/tmp")
            .dimensions(120, 40)
            .timeout(Duration::from_millis(500));

        assert_eq!(config.program, "/bin/sh");
        assert_eq!(config.args, vec!["-i"]);
        assert_eq!(config.dimensions, (120, 40));
        assert_eq!(config.timeout.expect, Duration::from_millis(500));
        assert_eq!(config.timeout.close, DEFAULT_CLOSE_TIMEOUT);
        assert!(!config.buffer.retain_consumed);
    }

    #[test]
    fn pty_config_carries_env_and_size() {
        let pty = SessionConfig::new("sh")
            .env("TERM", "dumb")
            .working_dir("/tmp")
            .dimensions(100, 30)
            .pty_config();

        assert_eq!(pty.window_size.cols, 100);
        assert_eq!(pty.working_directory, Some(PathBuf::from("/tmp")));
        assert_eq!(
            pty.env_add.get(&OsString::from("TERM")),
            Some(&OsString::from("dumb"))
        );
    }

    #[test]
    fn child_always_has_a_term() {
        let env = SessionConfig::new("sh").pty_config().effective_env();
        assert!(env.contains_key(&OsString::from("TERM")));
    }

    #[test]
    fn pty_config_carries_env_removal_and_terminal_flag() {
        let pty = SessionConfig::new("sh")
            .env_remove("TERM")
            .controlling_terminal(false)
            .pty_config();

        assert!(!pty.controlling_terminal);
        assert_eq!(pty.env_remove, vec![OsString::from("TERM")]);
        assert!(!pty.effective_env().contains_key(&OsString::from("TERM")));
        assert!(SessionConfig::new("sh").pty_config().controlling_terminal);
    }

    #[test]
    fn relative_program_is_resolved_against_current_dir() {
        let cwd = std::env::current_dir().unwrap();

        let dotted = SessionConfig::new("./build/shell").working_dir("/tmp");
        assert_eq!(
            PathBuf::from(dotted.resolved_program().unwrap()),
            cwd.join("./build/shell")
        );

        let parent = SessionConfig::new("../bin/prog").resolved_program().unwrap();
        assert!(Path::new(&parent).is_absolute());
        assert!(parent.ends_with("bin/prog"));

        assert_eq!(SessionConfig::new("cat").resolved_program().unwrap(), "cat");
        assert_eq!(SessionConfig::new("/bin/sh").resolved_program().unwrap(), "/bin/sh");
    }

    #[test]
    fn work_dir_is_canonicalized() {
        let probe = ProbeConfig {
            work_dir: Some(PathBuf::from(".")),
            ..Default::default()
        };
        let dir = probe.resolved_work_dir().unwrap();
        assert!(dir.is_absolute());
        assert_eq!(dir, std::env::current_dir().unwrap().canonicalize().unwrap());
    }

    #[test]
    fn missing_work_dir_is_a_spawn_error() {
        let probe = ProbeConfig {
            work_dir: Some(PathBuf::from("/nonexistent/work/dir")),
            ..Default::default()
        };
        assert!(matches!(
            probe.resolved_work_dir(),
            Err(ExpectError::Spawn(SpawnError::InvalidWorkingDir { .. }))
        ));
    }

    #[test]
    fn line_endings() {
        assert_eq!(LineEnding::default().as_str(), "\n");
        assert_eq!(LineEnding::CrLf.as_bytes(), b"\r\n");
        assert_eq!(LineEnding::Cr.as_str(), "\r");
    }

    #[test]
    fn probe_defaults() {
        let config = ProbeConfig::default();
        assert_eq!(config.shell, PathBuf::from("./build/shell"));
        assert_eq!(config.prompt, r"\$");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn probe_validation() {
        let bad_prompt = ProbeConfig {
            prompt: "(".into(),
            ..Default::default()
        };
        assert!(matches!(bad_prompt.validate(), Err(ExpectError::Regex(_))));

        let zero = ProbeConfig {
            timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(zero.validate(), Err(ExpectError::Config { .. })));
    }

    #[test]
    fn probe_to_session_config() {
        let probe = ProbeConfig {
            term: Some("vt100".into()),
            timeout: Duration::from_secs(7),
            ..Default::default()
        };
        let session = probe.session_config(Path::new("/work"));

        assert!(Path::new(&session.program).is_absolute());
        assert!(session.program.ends_with("build/shell"));
        assert_eq!(session.working_dir, Some(PathBuf::from("/work")));
        assert_eq!(session.timeout.expect, Duration::from_secs(7));
        assert_eq!(session.env.get("TERM").map(String::as_str), Some("vt100"));
        assert!(session.buffer.retain_consumed);
    }

    #[test]
    fn layered_without_file_uses_env() {
        let env = EnvConfig::with_vars(DEFAULT_PREFIX, [("SHELLPROBE_PROMPT", "> ")]);
        let config = ProbeConfig::layered(None, &env).unwrap();
        assert_eq!(config.prompt, "> ");
        assert_eq!(config.shell, PathBuf::from(DEFAULT_SHELL));
    }
}
