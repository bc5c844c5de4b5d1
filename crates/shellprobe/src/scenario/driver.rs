//! Executes one step against a live session: send, await, assert.

use std::io;
use std::path::{Path, PathBuf};

use super::step::{Check, Input, Step};
use super::verdict::{Failure, Verdict};
use crate::encoding::strip_ansi;
use crate::error::{ExpectError, Result};
use crate::expect::PatternSet;
use crate::session::Session;

/// Shown when a file check finds no file.
const FILE_NOT_CREATED: &str = "<file not created>";

/// Drives steps through a session, synchronizing on the prompt.
#[derive(Debug)]
pub struct Driver<'a> {
    session: &'a mut Session,
    prompt: PatternSet,
}

impl<'a> Driver<'a> {
    /// A driver that waits for `prompt` between steps.
    pub fn new(session: &'a mut Session, prompt: impl Into<PatternSet>) -> Self {
        Self {
            session,
            prompt: prompt.into(),
        }
    }

    /// The underlying session.
    pub fn session(&mut self) -> &mut Session {
        self.session
    }

    /// Wait for the prompt within the session's default timeout.
    ///
    /// Returns the output that preceded it.
    pub async fn await_prompt(&mut self) -> Result<String> {
        let timeout = self.session.config().timeout.expect;
        let m = self.session.expect_any(&self.prompt, timeout).await?;
        Ok(m.before)
    }

    /// Run `step` and judge it.
    ///
    /// A prompt that does not show up, or a program that exits, fails the
    /// step. Errors returned from here mean the session can no longer be
    /// driven and end the run.
    pub async fn run_step(&mut self, step: &Step) -> Result<Verdict> {
        let expected = step.check.expected();
        tracing::debug!(label = %step.label, "running step");

        if step.clear_line {
            self.session.send_line("").await?;
            if let Err(e) = self.await_prompt().await {
                return recoverable(&step.label, &expected, e);
            }
        }

        for input in &step.inputs {
            match input {
                Input::Line(line) => self.session.send_line(line).await?,
                Input::Bytes(bytes) => self.session.write(bytes).await?,
            }
        }

        let output = if step.await_prompt {
            match self.await_prompt().await {
                Ok(before) => before,
                Err(e) => return recoverable(&step.label, &expected, e),
            }
        } else {
            self.session.buffer().await
        };

        let observed = if step.strip_ansi {
            strip_ansi(&output).into_owned()
        } else {
            output
        };

        let verdict = self.judge(step, expected, observed);
        tracing::debug!(label = %verdict.label, passed = verdict.passed, "step finished");
        Ok(verdict)
    }

    fn judge(&self, step: &Step, expected: String, observed: String) -> Verdict {
        let passed = match step.check {
            Check::Contains(ref needle) => observed.contains(needle.as_str()),
            Check::Matches(ref regex) => regex.find_with_captures(&observed).is_some(),
            Check::FileContains { ref path, ref needle } => {
                return self.judge_file(&step.label, path, needle);
            }
            Check::None => true,
        };

        if passed {
            Verdict::pass(&step.label, expected, observed)
        } else {
            Verdict::fail(&step.label, expected, observed, Failure::Mismatch)
        }
    }

    fn judge_file(&self, label: &str, path: &Path, needle: &str) -> Verdict {
        let path = self.resolve(path);
        match std::fs::read_to_string(&path) {
            Ok(content) if content.contains(needle) => Verdict::pass(label, needle, content),
            Ok(content) => Verdict::fail(label, needle, content, Failure::Mismatch),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Verdict::fail(label, needle, FILE_NOT_CREATED, Failure::Mismatch)
            }
            Err(e) => Verdict::fail(
                label,
                needle,
                ExpectError::fixture(path, e).to_string(),
                Failure::Io,
            ),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match self.session.config().working_dir {
            Some(ref dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Turn a waiting error into a failed verdict; pass anything else up.
fn recoverable(label: &str, expected: &str, err: ExpectError) -> Result<Verdict> {
    if err.is_fatal() {
        return Err(err);
    }
    tracing::debug!(label, error = %err, "step failed while waiting");
    Ok(Verdict::from_error(label, expected, &err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn waiting_errors_are_recoverable() {
        let v = recoverable("pwd", "/w", ExpectError::timeout(Duration::ZERO, r"\$", "pw")).unwrap();
        assert_eq!(v.failure, Some(Failure::Timeout));
        assert_eq!(v.observed, "pw");

        let v = recoverable("pwd", "/w", ExpectError::eof(r"\$", "")).unwrap();
        assert_eq!(v.failure, Some(Failure::Eof));
    }

    #[test]
    fn other_errors_end_the_run() {
        assert!(recoverable("x", "", ExpectError::SessionClosed).is_err());
    }
}
