//! Interaction steps.

use std::path::PathBuf;

use regex::Regex;

use crate::expect::CompiledRegex;
use crate::types::ControlChar;

/// One piece of input typed into the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Text followed by the session's line ending.
    Line(String),
    /// Raw bytes, sent as they are.
    Bytes(Vec<u8>),
}

impl Input {
    /// A line of text.
    #[must_use]
    pub fn line(text: impl Into<String>) -> Self {
        Self::Line(text.into())
    }

    /// Text without a line ending.
    #[must_use]
    pub fn text(text: impl AsRef<str>) -> Self {
        Self::Bytes(text.as_ref().as_bytes().to_vec())
    }

    /// A single control character.
    #[must_use]
    pub fn control(ctrl: ControlChar) -> Self {
        Self::Bytes(vec![ctrl.as_byte()])
    }
}

/// What a step asserts once its input has been processed.
#[derive(Debug, Clone)]
pub enum Check {
    /// The output before the prompt contains this text. An empty needle
    /// always passes.
    Contains(String),
    /// The output before the prompt matches this regex.
    Matches(CompiledRegex),
    /// A file (relative paths resolve against the working directory)
    /// exists and contains this text.
    FileContains {
        /// The file to read.
        path: PathBuf,
        /// Text the file must contain.
        needle: String,
    },
    /// Nothing is asserted; the step passes once its input was sent.
    None,
}

impl Check {
    /// The expected value shown in reports.
    #[must_use]
    pub fn expected(&self) -> String {
        match self {
            Self::Contains(needle) | Self::FileContains { needle, .. } => needle.clone(),
            Self::Matches(regex) => regex.pattern().to_string(),
            Self::None => String::new(),
        }
    }
}

/// A labelled send / await / assert unit of a scenario.
#[derive(Debug, Clone)]
pub struct Step {
    /// Name shown in the report.
    pub label: String,
    /// Input sent in order.
    pub inputs: Vec<Input>,
    /// Send an empty line and wait for the prompt before the input, so that
    /// leftovers of the previous step are flushed from the line editor.
    pub clear_line: bool,
    /// Wait for the prompt after the input.
    pub await_prompt: bool,
    /// Strip ANSI escape sequences from the output before checking it.
    pub strip_ansi: bool,
    /// The assertion.
    pub check: Check,
}

impl Step {
    /// A step with no input that waits for the prompt and checks nothing.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            inputs: Vec::new(),
            clear_line: false,
            await_prompt: true,
            strip_ansi: true,
            check: Check::None,
        }
    }

    /// Shorthand for a one-line command whose output must contain `expected`.
    #[must_use]
    pub fn command(label: impl Into<String>, line: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::new(label).line(line).expect_contains(expected)
    }

    /// Send a line.
    #[must_use]
    pub fn line(mut self, text: impl Into<String>) -> Self {
        self.inputs.push(Input::line(text));
        self
    }

    /// Send text without a line ending.
    #[must_use]
    pub fn text(mut self, text: impl AsRef<str>) -> Self {
        self.inputs.push(Input::text(text));
        self
    }

    /// Send raw bytes.
    #[must_use]
    pub fn bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.inputs.push(Input::Bytes(bytes.into()));
        self
    }

    /// Send a control character.
    #[must_use]
    pub fn control(mut self, ctrl: ControlChar) -> Self {
        self.inputs.push(Input::control(ctrl));
        self
    }

    /// Press tab.
    #[must_use]
    pub fn tab(self) -> Self {
        self.control(ControlChar::Tab)
    }

    /// Flush the line editor with an empty line before sending input.
    #[must_use]
    pub const fn clear_line(mut self) -> Self {
        self.clear_line = true;
        self
    }

    /// Do not wait for the prompt after sending input.
    #[must_use]
    pub const fn no_prompt(mut self) -> Self {
        self.await_prompt = false;
        self
    }

    /// Check the output as received, escape sequences included.
    #[must_use]
    pub const fn raw_output(mut self) -> Self {
        self.strip_ansi = false;
        self
    }

    /// Require the output to contain `needle`.
    #[must_use]
    pub fn expect_contains(mut self, needle: impl Into<String>) -> Self {
        self.check = Check::Contains(needle.into());
        self
    }

    /// Require the output to match `regex`.
    pub fn expect_match(mut self, regex: &str) -> Result<Self, regex::Error> {
        let compiled = CompiledRegex::new(regex.to_string(), Regex::new(regex)?);
        self.check = Check::Matches(compiled);
        Ok(self)
    }

    /// Require `path` to contain `needle` after the step.
    #[must_use]
    pub fn expect_file(mut self, path: impl Into<PathBuf>, needle: impl Into<String>) -> Self {
        self.check = Check::FileContains {
            path: path.into(),
            needle: needle.into(),
        };
        self
    }
}
