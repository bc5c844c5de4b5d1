//! Per-step outcomes.

use serde::Serialize;

use crate::error::ExpectError;

/// Why a step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Failure {
    /// Output arrived but did not satisfy the check.
    Mismatch,
    /// The prompt did not appear in time.
    Timeout,
    /// The program closed its terminal first.
    Eof,
    /// Talking to the program (or reading a fixture) failed.
    Io,
}

/// Immutable pass/fail record of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    /// Step label.
    pub label: String,
    /// What the step expected.
    pub expected: String,
    /// What was observed: output before the prompt, file contents, or the
    /// partial buffer on timeout.
    pub observed: String,
    /// Whether the step passed.
    pub passed: bool,
    /// Failure kind, for failed steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
}

impl Verdict {
    /// A passing verdict.
    #[must_use]
    pub fn pass(label: impl Into<String>, expected: impl Into<String>, observed: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            expected: expected.into(),
            observed: observed.into(),
            passed: true,
            failure: None,
        }
    }

    /// A failing verdict.
    #[must_use]
    pub fn fail(
        label: impl Into<String>,
        expected: impl Into<String>,
        observed: impl Into<String>,
        failure: Failure,
    ) -> Self {
        Self {
            label: label.into(),
            expected: expected.into(),
            observed: observed.into(),
            passed: false,
            failure: Some(failure),
        }
    }

    /// A failing verdict for an error raised while running the step.
    ///
    /// Waiting errors keep the partial buffer as the observed output.
    #[must_use]
    pub fn from_error(label: impl Into<String>, expected: impl Into<String>, err: &ExpectError) -> Self {
        let (failure, observed) = match err {
            ExpectError::Timeout { buffer, .. } => (Failure::Timeout, buffer.clone()),
            ExpectError::Eof { buffer, .. } => (Failure::Eof, buffer.clone()),
            other => (Failure::Io, other.to_string()),
        };
        Self::fail(label, expected, observed, failure)
    }
}
