//! Scenarios: fixed, ordered sequences of interaction steps.
//!
//! A [`Scenario`] is plain data built in code. A [`Runner`] executes it
//! against a fresh [`Session`](crate::Session), one [`Driver`] step at a time,
//! and collects a [`Verdict`] per step into a [`Report`](crate::Report).
//!
//! # Example
//!
//! ```ignore
//! use shellprobe::{Pattern, Runner, Scenario, SessionConfig, Step};
//!
//! # async fn demo() -> shellprobe::Result<()> {
//! let scenario = Scenario::new("echo", SessionConfig::new("/bin/sh").env("PS1", "$ "))
//!     .prompt(Pattern::literal("$ "))
//!     .step(Step::command("echo", "echo hello", "hello"));
//!
//! let report = Runner::new(scenario).run().await?;
//! assert!(report.success());
//! # Ok(())
//! # }
//! ```

mod driver;
mod fixtures;
mod runner;
mod shell;
mod step;
mod verdict;

use crate::config::{DEFAULT_EXIT_COMMAND, DEFAULT_PROMPT, SessionConfig};
use crate::expect::Pattern;

pub use driver::Driver;
pub use fixtures::{FixtureGuard, Fixtures};
pub use runner::{RunState, Runner, STARTUP_LABEL};
pub use shell::{AUTOCOMPLETE_FILE, shell_suite};
pub use step::{Check, Input, Step};
pub use verdict::{Failure, Verdict};

/// Everything needed to run one scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Name shown in the report.
    pub name: String,
    /// How to spawn the program under test.
    pub session: SessionConfig,
    /// Pattern that marks the program as ready for input.
    pub prompt: Pattern,
    /// Steps, executed in order.
    pub steps: Vec<Step>,
    /// Files seeded before and removed after the run.
    pub fixtures: Fixtures,
    /// Line that makes the program exit.
    pub exit_command: String,
}

impl Scenario {
    /// An empty scenario with the default prompt and exit command.
    ///
    /// Fixtures live in the session's working directory, or the current
    /// directory when none is set.
    #[must_use]
    pub fn new(name: impl Into<String>, session: SessionConfig) -> Self {
        let root = session.working_dir.clone().unwrap_or_default();
        Self {
            name: name.into(),
            session,
            prompt: Pattern::regex(DEFAULT_PROMPT).unwrap_or_else(|_| Pattern::literal("$")),
            steps: Vec::new(),
            fixtures: Fixtures::new(root),
            exit_command: DEFAULT_EXIT_COMMAND.to_string(),
        }
    }

    /// Set the prompt pattern.
    #[must_use]
    pub fn prompt(mut self, prompt: impl Into<Pattern>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Append a step.
    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Append several steps.
    #[must_use]
    pub fn steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Replace the fixtures.
    #[must_use]
    pub fn fixtures(mut self, fixtures: Fixtures) -> Self {
        self.fixtures = fixtures;
        self
    }

    /// Set the exit command.
    #[must_use]
    pub fn exit_command(mut self, command: impl Into<String>) -> Self {
        self.exit_command = command.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn scenario_builder() {
        let scenario = Scenario::new("demo", SessionConfig::new("sh").working_dir("/work"))
            .prompt(Pattern::literal("> "))
            .step(Step::command("one", "echo one", "one"))
            .steps([Step::new("two"), Step::new("three")])
            .exit_command("quit");

        assert_eq!(scenario.steps.len(), 3);
        assert_eq!(scenario.prompt.as_str(), "> ");
        assert_eq!(scenario.exit_command, "quit");
        assert_eq!(scenario.fixtures.root(), Path::new("/work"));
    }

    #[test]
    fn default_prompt_is_dollar_regex() {
        let scenario = Scenario::new("demo", SessionConfig::new("sh"));
        assert!(matches!(scenario.prompt, Pattern::Regex(_)));
        assert_eq!(scenario.prompt.as_str(), r"\$");
        assert_eq!(scenario.exit_command, "exit");
    }
}
