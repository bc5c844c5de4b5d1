//! Common types shared by the session, matcher and scenario layers.

use std::fmt;

pub use shellprobe_pty::ExitStatus;

/// A successful expect operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Index of the pattern that matched, in the order the patterns were given.
    pub pattern_index: usize,

    /// The text that matched. Empty for an EOF match.
    pub matched: String,

    /// Capture groups from regex patterns.
    pub captures: Vec<String>,

    /// Everything between the previous match and this one.
    pub before: String,

    /// Whether the match was the end-of-stream condition.
    pub eof: bool,
}

impl Match {
    /// Create a new match result.
    #[must_use]
    pub fn new(pattern_index: usize, matched: impl Into<String>, before: impl Into<String>) -> Self {
        Self {
            pattern_index,
            matched: matched.into(),
            captures: Vec::new(),
            before: before.into(),
            eof: false,
        }
    }

    /// An end-of-stream match; `before` holds whatever was still unconsumed.
    #[must_use]
    pub fn eof(pattern_index: usize, before: impl Into<String>) -> Self {
        Self {
            eof: true,
            ..Self::new(pattern_index, "", before)
        }
    }

    /// Create a match with captures.
    #[must_use]
    pub fn with_captures(mut self, captures: Vec<String>) -> Self {
        self.captures = captures;
        self
    }

    /// Get a capture group by index.
    #[must_use]
    pub fn capture(&self, index: usize) -> Option<&str> {
        self.captures.get(index).map(String::as_str)
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.eof {
            f.write_str("<EOF>")
        } else {
            f.write_str(&self.matched)
        }
    }
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The child is (as far as we know) running.
    Running,
    /// The child has exited and been reaped.
    Exited(ExitStatus),
    /// `close()` has released the terminal and the child.
    Closed,
}

impl SessionState {
    /// Whether input can still be sent.
    #[must_use]
    pub const fn is_usable(&self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Control characters a test can type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlChar {
    /// Ctrl+C (ETX) - Interrupt
    CtrlC,
    /// Ctrl+D (EOT) - End of transmission / EOF
    CtrlD,
    /// Ctrl+I (HT) - Tab, triggers completion in line editors
    Tab,
    /// Ctrl+L (FF) - Clear screen
    CtrlL,
    /// Ctrl+M (CR) - Carriage return
    Enter,
    /// Ctrl+U (NAK) - Kill line
    CtrlU,
    /// Ctrl+W (ETB) - Kill word
    CtrlW,
    /// Ctrl+Z (SUB) - Suspend
    CtrlZ,
    /// Escape
    Escape,
    /// DEL, what most terminals send for the backspace key
    Backspace,
}

impl ControlChar {
    /// Get the byte value of this control character.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::CtrlC => 0x03,
            Self::CtrlD => 0x04,
            Self::Tab => 0x09,
            Self::CtrlL => 0x0C,
            Self::Enter => 0x0D,
            Self::CtrlU => 0x15,
            Self::CtrlW => 0x17,
            Self::CtrlZ => 0x1A,
            Self::Escape => 0x1B,
            Self::Backspace => 0x7F,
        }
    }
}

impl From<ControlChar> for u8 {
    fn from(c: ControlChar) -> Self {
        c.as_byte()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_creation() {
        let m = Match::new(1, "$", "echo one\r\none\r\n").with_captures(vec!["cap".to_string()]);

        assert_eq!(m.pattern_index, 1);
        assert_eq!(m.to_string(), "$");
        assert_eq!(m.capture(0), Some("cap"));
        assert_eq!(m.capture(1), None);
        assert!(!m.eof);
    }

    #[test]
    fn eof_match() {
        let m = Match::eof(0, "exit\r\n");
        assert!(m.eof);
        assert!(m.matched.is_empty());
        assert_eq!(m.before, "exit\r\n");
        assert_eq!(m.to_string(), "<EOF>");
    }

    #[test]
    fn session_state_usable() {
        assert!(SessionState::Running.is_usable());
        assert!(!SessionState::Closed.is_usable());
        assert!(!SessionState::Exited(ExitStatus::Exited(0)).is_usable());
    }

    #[test]
    fn control_char_bytes() {
        assert_eq!(ControlChar::Tab.as_byte(), b'\t');
        assert_eq!(ControlChar::CtrlC.as_byte(), 0x03);
        assert_eq!(u8::from(ControlChar::Escape), 0x1B);
    }
}
