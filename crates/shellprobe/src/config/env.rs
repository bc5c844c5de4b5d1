//! Environment-based configuration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use super::ProbeConfig;
use super::file::ConfigError;

/// Environment configuration prefix.
pub const DEFAULT_PREFIX: &str = "SHELLPROBE";

/// Environment variable reader.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Prefix for environment variables.
    prefix: String,
    /// Fixed variables used instead of the process environment.
    vars: Option<HashMap<String, String>>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl EnvConfig {
    /// Create a reader over the process environment.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            vars: None,
        }
    }

    /// Create a reader over a fixed set of variables.
    #[must_use]
    pub fn with_vars<I, K, V>(prefix: impl Into<String>, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            prefix: prefix.into(),
            vars: Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
        }
    }

    /// Build the full environment variable name.
    fn var_name(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_uppercase()
        } else {
            format!("{}_{}", self.prefix, name.to_uppercase())
        }
    }

    /// Get a string value. Empty values count as unset.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        let var_name = self.var_name(name);
        let value = match self.vars {
            Some(ref vars) => vars.get(&var_name).cloned(),
            None => std::env::var(&var_name).ok(),
        };
        value.filter(|v| !v.is_empty())
    }

    /// Get a parsed value; a value that does not parse is an error.
    pub fn parse<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>, ConfigError> {
        self.get(name)
            .map(|value| {
                value.parse().map_err(|_| ConfigError::Invalid {
                    key: self.var_name(name),
                    value,
                })
            })
            .transpose()
    }

    /// Get a duration in milliseconds.
    pub fn duration_millis(&self, name: &str) -> Result<Option<Duration>, ConfigError> {
        Ok(self.parse::<u64>(name)?.map(Duration::from_millis))
    }

    /// Check if a variable is set.
    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Overlay every recognized variable onto `config`.
    pub fn apply(&self, config: &mut ProbeConfig) -> Result<(), ConfigError> {
        if let Some(shell) = self.get(vars::SHELL) {
            config.shell = PathBuf::from(shell);
        }
        if let Some(prompt) = self.get(vars::PROMPT) {
            config.prompt = prompt;
        }
        if let Some(timeout) = self.duration_millis(vars::TIMEOUT_MS)? {
            config.timeout = timeout;
        }
        if let Some(dir) = self.get(vars::WORK_DIR) {
            config.work_dir = Some(PathBuf::from(dir));
        }
        if let Some(term) = self.get(vars::TERM) {
            config.term = Some(term);
        }
        Ok(())
    }
}

/// Variable names recognized after the prefix.
pub mod vars {
    /// Program under test.
    pub const SHELL: &str = "SHELL";
    /// Prompt regex.
    pub const PROMPT: &str = "PROMPT";
    /// Expect timeout in milliseconds.
    pub const TIMEOUT_MS: &str = "TIMEOUT_MS";
    /// Working directory.
    pub const WORK_DIR: &str = "WORK_DIR";
    /// TERM for the child.
    pub const TERM: &str = "TERM";
}
