//! File-based configuration loading.
//!
//! A `shellprobe.toml` may set any run option; keys left out keep the value
//! of the layer below.
//!
//! ```toml
//! shell = "./build/shell"
//! prompt = '\$ '
//! timeout_ms = 3000
//!
//! [terminal]
//! cols = 120
//! rows = 40
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use super::{LineEnding, ProbeConfig};
use crate::error::ExpectError;

/// Errors from the file and environment configuration layers.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// The file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has unknown keys.
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        /// The file.
        path: PathBuf,
        /// The TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A value has the wrong shape.
    #[error("invalid value for {key}: {value:?}")]
    Invalid {
        /// The key or variable name.
        key: String,
        /// The rejected value.
        value: String,
    },
}

impl From<ConfigError> for ExpectError {
    fn from(err: ConfigError) -> Self {
        Self::config(err.to_string())
    }
}

/// Contents of a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Program under test.
    pub shell: Option<PathBuf>,
    /// Arguments for the program.
    pub args: Option<Vec<String>>,
    /// Prompt regex.
    pub prompt: Option<String>,
    /// Expect timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Working directory.
    pub work_dir: Option<PathBuf>,
    /// TERM for the child.
    pub term: Option<String>,
    /// Line ending: `lf`, `crlf` or `cr`.
    pub line_ending: Option<LineEnding>,
    /// Terminal geometry.
    #[serde(default)]
    pub terminal: TerminalSection,
    /// Shutdown behavior.
    #[serde(default)]
    pub shutdown: ShutdownSection,
}

/// `[terminal]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TerminalSection {
    /// Columns.
    pub cols: Option<u16>,
    /// Rows.
    pub rows: Option<u16>,
}

/// `[shutdown]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShutdownSection {
    /// Command that ends the program.
    pub exit_command: Option<String>,
    /// Time allowed to reach end of stream after the exit command.
    pub exit_timeout_ms: Option<u64>,
    /// Grace period between SIGHUP and SIGKILL.
    pub close_timeout_ms: Option<u64>,
}

impl FileConfig {
    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded configuration file");
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Overlay the keys present in the file onto `config`.
    pub fn apply(self, config: &mut ProbeConfig) {
        if let Some(shell) = self.shell {
            config.shell = shell;
        }
        if let Some(args) = self.args {
            config.args = args;
        }
        if let Some(prompt) = self.prompt {
            config.prompt = prompt;
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout = Duration::from_millis(ms);
        }
        if let Some(dir) = self.work_dir {
            config.work_dir = Some(dir);
        }
        if let Some(term) = self.term {
            config.term = Some(term);
        }
        if let Some(line_ending) = self.line_ending {
            config.line_ending = line_ending;
        }
        if let Some(cols) = self.terminal.cols {
            config.dimensions.0 = cols;
        }
        if let Some(rows) = self.terminal.rows {
            config.dimensions.1 = rows;
        }
        if let Some(command) = self.shutdown.exit_command {
            config.exit_command = command;
        }
        if let Some(ms) = self.shutdown.exit_timeout_ms {
            config.exit_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.shutdown.close_timeout_ms {
            config.close_timeout = Duration::from_millis(ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnvConfig, DEFAULT_PREFIX};
    use std::io::Write;

    #[test]
    fn parse_full_file() {
        let file = FileConfig::parse(
            r#"
            shell = "/bin/sh"
            args = ["-i"]
            prompt = '\$ '
            timeout_ms = 1500
            line_ending = "crlf"

            [terminal]
            cols = 132

            [shutdown]
            exit_command = "quit"
            exit_timeout_ms = 500
            "#,
        )
        .unwrap();

        let mut config = ProbeConfig::default();
        file.apply(&mut config);

        assert_eq!(config.shell, PathBuf::from("/bin/sh"));
        assert_eq!(config.args, vec!["-i"]);
        assert_eq!(config.prompt, r"\$ ");
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.line_ending, LineEnding::CrLf);
        assert_eq!(config.dimensions, (132, 24));
        assert_eq!(config.exit_command, "quit");
        assert_eq!(config.exit_timeout, Duration::from_millis(500));
    }

    #[test]
    fn empty_file_keeps_defaults() {
        let mut config = ProbeConfig::default();
        FileConfig::parse("").unwrap().apply(&mut config);
        assert_eq!(config, ProbeConfig::default());
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(FileConfig::parse("shel = \"typo\"").is_err());
    }

    #[test]
    fn environment_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "prompt = 'file> '\ntimeout_ms = 100").unwrap();

        let env = EnvConfig::with_vars(DEFAULT_PREFIX, [("SHELLPROBE_PROMPT", "env> ")]);
        let config = ProbeConfig::layered(Some(file.path()), &env).unwrap();

        assert_eq!(config.prompt, "env> ");
        assert_eq!(config.timeout, Duration::from_millis(100));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let env = EnvConfig::with_vars(DEFAULT_PREFIX, Vec::<(String, String)>::new());
        let err = ProbeConfig::layered(Some(Path::new("/nonexistent/shellprobe.toml")), &env)
            .unwrap_err();
        assert!(matches!(err, ExpectError::Config { .. }));
        assert!(err.to_string().contains("cannot read"));
    }
}
