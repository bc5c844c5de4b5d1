//! Pattern matching engine for expect operations.
//!
//! The [`Matcher`] combines the shared [`OutputBuffer`], the reader task's
//! notification channel and a deadline into a bounded wait for a pattern.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::time::Instant;

use super::buffer::OutputBuffer;
use super::pattern::PatternSet;
use crate::error::{ExpectError, Result};
use crate::types::Match;

/// Buffer shared between the reader task and the matcher.
pub type SharedBuffer = Arc<Mutex<OutputBuffer>>;

/// Waits for patterns to appear in session output.
#[derive(Debug)]
pub struct Matcher {
    buffer: SharedBuffer,
    /// Bumped by the reader task after every append and at end of stream.
    notify: watch::Receiver<u64>,
    default_timeout: Duration,
}

impl Matcher {
    /// Create a matcher over `buffer`, woken through `notify`.
    #[must_use]
    pub const fn new(buffer: SharedBuffer, notify: watch::Receiver<u64>, default_timeout: Duration) -> Self {
        Self {
            buffer,
            notify,
            default_timeout,
        }
    }

    /// Get the default timeout.
    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Set the default timeout.
    pub const fn set_default_timeout(&mut self, timeout: Duration) {
        self.default_timeout = timeout;
    }

    /// The shared buffer.
    #[must_use]
    pub const fn buffer(&self) -> &SharedBuffer {
        &self.buffer
    }

    /// Wait until one of `patterns` matches or the wait fails.
    ///
    /// Output already in the buffer is checked before the deadline, so a
    /// zero timeout still returns a match that has arrived. A text match
    /// consumes the buffer up to its end; unmatched output stays for the
    /// next call. Fails with [`ExpectError::Eof`] when the stream ends
    /// without a match (unless the set contains [`Pattern::Eof`]) and with
    /// [`ExpectError::Timeout`] when the deadline passes.
    ///
    /// [`Pattern::Eof`]: super::Pattern::Eof
    pub async fn expect(&mut self, patterns: &PatternSet, timeout: Duration) -> Result<Match> {
        let state = ExpectState::new(patterns, timeout);

        loop {
            // Mark the current generation as seen before looking, so output
            // appended after the check always wakes the wait below.
            self.notify.borrow_and_update();

            {
                let mut buffer = self.buffer.lock().await;
                if let Some(result) = state.try_match(&buffer) {
                    let (before, matched) = buffer.consume(result.start, result.end);
                    tracing::debug!(
                        pattern = %patterns.describe(),
                        index = result.pattern_index,
                        matched = %matched,
                        "pattern matched"
                    );
                    return Ok(Match::new(result.pattern_index, matched, before)
                        .with_captures(result.captures));
                }

                if buffer.is_eof() {
                    if let Some(index) = patterns.eof_index() {
                        tracing::debug!(index, "matched end of stream");
                        return Ok(Match::eof(index, buffer.consume_all()));
                    }
                    return Err(ExpectError::eof(patterns.describe(), buffer.pending()));
                }

                if state.is_timed_out() {
                    tracing::debug!(pattern = %patterns.describe(), ?timeout, "expect timed out");
                    return Err(ExpectError::timeout(timeout, patterns.describe(), buffer.pending()));
                }
            }

            match tokio::time::timeout_at(state.deadline(), self.notify.changed()).await {
                Ok(Ok(())) | Err(_) => {}
                Ok(Err(_)) => {
                    // Reader is gone; nothing more will arrive.
                    self.buffer.lock().await.finish();
                }
            }
        }
    }

    /// Wait for a set of patterns using the default timeout.
    pub async fn expect_default(&mut self, patterns: &PatternSet) -> Result<Match> {
        self.expect(patterns, self.default_timeout).await
    }
}

/// Result of a pattern match against the pending buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Index of the pattern that matched.
    pub pattern_index: usize,
    /// Start position in the pending text.
    pub start: usize,
    /// End position in the pending text.
    pub end: usize,
    /// Capture groups.
    pub captures: Vec<String>,
}

impl MatchResult {
    /// Get the length of the match.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the match is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A single in-flight expectation: what to look for and until when.
#[derive(Debug)]
pub struct ExpectState<'a> {
    patterns: &'a PatternSet,
    deadline: Instant,
}

impl<'a> ExpectState<'a> {
    /// Start an expectation that gives up after `timeout`.
    #[must_use]
    pub fn new(patterns: &'a PatternSet, timeout: Duration) -> Self {
        Self {
            patterns,
            deadline: Instant::now() + timeout,
        }
    }

    /// Match the pending text of `buffer` against the patterns.
    #[must_use]
    pub fn try_match(&self, buffer: &OutputBuffer) -> Option<MatchResult> {
        self.patterns
            .find_match(buffer.pending())
            .map(|(pattern_index, m)| MatchResult {
                pattern_index,
                start: m.start,
                end: m.end,
                captures: m.captures,
            })
    }

    /// When the expectation gives up.
    #[must_use]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Check if the operation has timed out.
    #[must_use]
    pub fn is_timed_out(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Get the remaining time until timeout.
    #[must_use]
    pub fn remaining_time(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Check if the patterns include an EOF pattern.
    #[must_use]
    pub fn expects_eof(&self) -> bool {
        self.patterns.has_eof()
    }
}
