//! Scenario reports and their text and JSON renderings.

use std::fmt::Write as _;

use serde::{Serialize, Serializer};

use crate::scenario::Verdict;
use crate::types::ExitStatus;

/// Outcome of a scenario run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Scenario name.
    pub scenario: String,
    /// One verdict per executed step, in order.
    pub verdicts: Vec<Verdict>,
    /// How the program ended, when it was reaped.
    #[serde(serialize_with = "serialize_exit_status")]
    pub exit_status: Option<ExitStatus>,
    /// Why the run was cut short, if it was.
    pub fatal: Option<String>,
}

impl Report {
    /// An empty report for `scenario`.
    #[must_use]
    pub fn new(scenario: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            verdicts: Vec::new(),
            exit_status: None,
            fatal: None,
        }
    }

    /// Number of passing verdicts.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.verdicts.iter().filter(|v| v.passed).count()
    }

    /// Number of failing verdicts.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.verdicts.len() - self.passed()
    }

    /// Every verdict passed and the run was not aborted.
    #[must_use]
    pub fn success(&self) -> bool {
        self.fatal.is_none() && self.failed() == 0
    }

    /// Human-readable report.
    ///
    /// Failures always show the expected value and the observed output;
    /// with `verbose` passes do too.
    #[must_use]
    pub fn render(&self, verbose: bool) -> String {
        let mut out = String::new();
        for verdict in &self.verdicts {
            render_verdict(&mut out, verdict, verbose);
        }

        if let Some(ref fatal) = self.fatal {
            let _ = writeln!(out, "❌ aborted: {fatal}\n");
        } else if let Some(status) = self.exit_status {
            let _ = writeln!(out, "✅ program {status}\n");
        }

        let _ = writeln!(out, "{} passed, {} failed", self.passed(), self.failed());
        out
    }

    /// The report as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn render_verdict(out: &mut String, verdict: &Verdict, verbose: bool) {
    let mark = if verdict.passed { '✅' } else { '❌' };
    let _ = writeln!(out, "{mark} {}", verdict.label);

    if verbose || !verdict.passed {
        let _ = writeln!(out, "   Expected: {}", verdict.expected);
        let _ = writeln!(out, "   Output: {}", verdict.observed.trim());
        if let Some(failure) = verdict.failure {
            let _ = writeln!(out, "   Failure: {failure:?}");
        }
    }
    out.push('\n');
}

#[allow(clippy::ref_option)]
fn serialize_exit_status<S: Serializer>(status: &Option<ExitStatus>, serializer: S) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct Exit {
        code: Option<i32>,
        signal: Option<i32>,
    }

    status
        .map(|s| Exit {
            code: s.code(),
            signal: s.signal(),
        })
        .serialize(serializer)
}
