//! Expect pattern matching module.
//!
//! This module provides the pattern types, the output buffer the session's
//! reader task fills, and the matcher that waits on it.

mod buffer;
mod matcher;
mod pattern;

pub use buffer::OutputBuffer;
pub use matcher::{ExpectState, MatchResult, Matcher, SharedBuffer};
pub use pattern::{CompiledRegex, Pattern, PatternMatch, PatternSet};
