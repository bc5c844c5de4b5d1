//! Pattern types for expect operations.
//!
//! A [`Pattern`] is either text to search for (a literal or a regular
//! expression) or the end-of-stream condition. Several patterns are grouped
//! in a [`PatternSet`] when a step can legitimately end in more than one way.

use regex::Regex;
use std::fmt;

/// A pattern that can be matched against terminal output.
#[derive(Clone)]
pub enum Pattern {
    /// Match an exact string.
    Literal(String),

    /// Match a regular expression.
    Regex(CompiledRegex),

    /// Match end of file (the process closed its terminal).
    Eof,
}

impl Pattern {
    /// Create a literal pattern.
    #[must_use]
    pub fn literal(s: impl Into<String>) -> Self {
        Self::Literal(s.into())
    }

    /// Create a regex pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the regex pattern is invalid.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(pattern)?;
        Ok(Self::Regex(CompiledRegex::new(pattern.to_string(), regex)))
    }

    /// Create an EOF pattern.
    #[must_use]
    pub const fn eof() -> Self {
        Self::Eof
    }

    /// Get the pattern as a string for display purposes.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(s) => s,
            Self::Regex(r) => r.pattern(),
            Self::Eof => "<EOF>",
        }
    }

    /// Search `text` anywhere for this pattern.
    ///
    /// Returns the leftmost match. [`Pattern::Eof`] never matches text.
    #[must_use]
    pub fn matches(&self, text: &str) -> Option<PatternMatch> {
        match self {
            Self::Literal(s) => text.find(s.as_str()).map(|pos| PatternMatch {
                start: pos,
                end: pos + s.len(),
                captures: Vec::new(),
            }),
            Self::Regex(r) => r.find_with_captures(text),
            Self::Eof => None,
        }
    }

    /// Check if this is an EOF pattern.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(s) => write!(f, "Literal({s:?})"),
            Self::Regex(r) => write!(f, "Regex({:?})", r.pattern()),
            Self::Eof => write!(f, "Eof"),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Pattern {
    fn from(s: &str) -> Self {
        Self::Literal(s.to_string())
    }
}

impl From<String> for Pattern {
    fn from(s: String) -> Self {
        Self::Literal(s)
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Self::Regex(CompiledRegex::new(regex.as_str().to_string(), regex))
    }
}

/// A compiled regular expression with its source pattern.
#[derive(Clone)]
pub struct CompiledRegex {
    pattern: String,
    regex: Regex,
}

impl fmt::Debug for CompiledRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CompiledRegex").field(&self.pattern).finish()
    }
}

impl CompiledRegex {
    /// Create a new compiled regex.
    #[must_use]
    pub const fn new(pattern: String, regex: Regex) -> Self {
        Self { pattern, regex }
    }

    /// Get the source pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Find the leftmost match and its capture groups in one pass.
    ///
    /// Groups that did not participate in the match are reported as empty
    /// strings so that indices stay aligned with the expression.
    #[must_use]
    pub fn find_with_captures(&self, text: &str) -> Option<PatternMatch> {
        let caps = self.regex.captures(text)?;
        let whole = caps.get(0)?;
        let captures = caps
            .iter()
            .skip(1)
            .map(|m| m.map_or_else(String::new, |m| m.as_str().to_string()))
            .collect();

        Some(PatternMatch {
            start: whole.start(),
            end: whole.end(),
            captures,
        })
    }
}

/// Position of a successful pattern match within the searched text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    /// Start position of the match in the text.
    pub start: usize,
    /// End position of the match in the text.
    pub end: usize,
    /// Capture groups (for regex patterns).
    pub captures: Vec<String>,
}

impl PatternMatch {
    /// Get the matched text from the original input.
    #[must_use]
    pub fn as_str<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }

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

/// An ordered set of patterns for multi-pattern matching.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    /// Create a new empty pattern set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pattern set from a vector of patterns.
    #[must_use]
    pub const fn from_patterns(patterns: Vec<Pattern>) -> Self {
        Self { patterns }
    }

    /// Add a pattern to the set.
    pub fn add(&mut self, pattern: impl Into<Pattern>) -> &mut Self {
        self.patterns.push(pattern.into());
        self
    }

    /// Get the number of patterns in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Check if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Find the best match among the text patterns.
    ///
    /// The match starting earliest in `text` wins; on equal start positions
    /// the pattern added first wins.
    #[must_use]
    pub fn find_match(&self, text: &str) -> Option<(usize, PatternMatch)> {
        let mut best_match: Option<(usize, PatternMatch)> = None;

        for (idx, pattern) in self.patterns.iter().enumerate() {
            if let Some(m) = pattern.matches(text) {
                match &best_match {
                    None => best_match = Some((idx, m)),
                    Some((_, current)) if m.start < current.start => {
                        best_match = Some((idx, m));
                    }
                    _ => {}
                }
            }
        }

        best_match
    }

    /// Get a pattern by index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Pattern> {
        self.patterns.get(index)
    }

    /// Index of the first EOF pattern, if any.
    #[must_use]
    pub fn eof_index(&self) -> Option<usize> {
        self.patterns.iter().position(Pattern::is_eof)
    }

    /// Check if any pattern is an EOF pattern.
    #[must_use]
    pub fn has_eof(&self) -> bool {
        self.eof_index().is_some()
    }

    /// All patterns joined for error messages, e.g. `\$ | <EOF>`.
    #[must_use]
    pub fn describe(&self) -> String {
        self.patterns
            .iter()
            .map(Pattern::as_str)
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// Get iterator over patterns.
    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }
}

impl From<Pattern> for PatternSet {
    fn from(pattern: Pattern) -> Self {
        Self::from_patterns(vec![pattern])
    }
}

impl FromIterator<Pattern> for PatternSet {
    fn from_iter<I: IntoIterator<Item = Pattern>>(iter: I) -> Self {
        Self::from_patterns(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_pattern_matches() {
        let pattern = Pattern::literal("hello");
        let m = pattern.matches("say hello world").unwrap();
        assert_eq!(m.start, 4);
        assert_eq!(m.end, 9);
    }

    #[test]
    fn empty_literal_matches_at_start() {
        let m = Pattern::literal("").matches("anything").unwrap();
        assert!(m.is_empty());
        assert_eq!(m.start, 0);
    }

    #[test]
    fn regex_pattern_matches() {
        let pattern = Pattern::regex(r"\d+").unwrap();
        let m = pattern.matches("test 123 value").unwrap();
        assert_eq!(m.as_str("test 123 value"), "123");
    }

    #[test]
    fn regex_pattern_captures() {
        let pattern = Pattern::regex(r"(\w+)@(\w+)").unwrap();
        let m = pattern.matches("email: user@domain here").unwrap();
        assert_eq!(m.captures, vec!["user", "domain"]);
    }

    #[test]
    fn optional_group_keeps_index() {
        let pattern = Pattern::regex(r"(a)?(b)").unwrap();
        let m = pattern.matches("xb").unwrap();
        assert_eq!(m.captures, vec!["", "b"]);
    }

    #[test]
    fn regex_debug_shows_source() {
        let Pattern::Regex(compiled) = Pattern::regex(r"\d+ files?").unwrap() else {
            panic!("expected a regex pattern");
        };
        assert_eq!(format!("{compiled:?}"), r#"CompiledRegex("\\d+ files?")"#);
    }

    #[test]
    fn invalid_regex_is_rejected() {
        assert!(Pattern::regex("(unclosed").is_err());
    }

    #[test]
    fn eof_never_matches_text() {
        assert!(Pattern::eof().matches("<EOF>").is_none());
        assert!(Pattern::Eof.is_eof());
    }

    #[test]
    fn earliest_match_wins() {
        let mut set = PatternSet::new();
        set.add("world").add("hello");

        let (idx, _) = set.find_match("hello world").unwrap();
        assert_eq!(idx, 1);
    }

    #[test]
    fn tie_goes_to_first_pattern() {
        let mut set = PatternSet::new();
        set.add(Pattern::regex(r"\$ ").unwrap()).add("$");

        let (idx, m) = set.find_match("out\n$ ").unwrap();
        assert_eq!(idx, 0);
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn eof_index_and_describe() {
        let set: PatternSet = vec![Pattern::regex(r"\$").unwrap(), Pattern::Eof]
            .into_iter()
            .collect();
        assert_eq!(set.eof_index(), Some(1));
        assert!(set.has_eof());
        assert_eq!(set.describe(), r"\$ | <EOF>");
    }
}
