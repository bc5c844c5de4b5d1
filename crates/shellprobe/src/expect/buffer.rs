//! Accumulated terminal output.
//!
//! [`OutputBuffer`] is filled by the session's reader task and consumed by
//! the matcher. It holds decoded text plus a cursor; everything before the
//! cursor has already been handed out by a match, everything after it is
//! still waiting for the next expectation.

use std::fmt;

use crate::encoding::Utf8Decoder;

/// Decoded output of a session with a read cursor.
pub struct OutputBuffer {
    decoder: Utf8Decoder,
    /// Decoded text. Starts at the beginning of the session when consumed
    /// text is retained, otherwise at the cursor of the last compaction.
    text: String,
    /// Byte offset into `text` where unconsumed output begins.
    cursor: usize,
    /// Raw bytes received so far.
    total_bytes: usize,
    eof: bool,
    retain_consumed: bool,
}

impl OutputBuffer {
    /// Create an empty buffer.
    ///
    /// With `retain_consumed` the full transcript stays available through
    /// [`transcript`](Self::transcript); otherwise matched text is released.
    #[must_use]
    pub fn new(retain_consumed: bool) -> Self {
        Self {
            decoder: Utf8Decoder::new(),
            text: String::new(),
            cursor: 0,
            total_bytes: 0,
            eof: false,
            retain_consumed,
        }
    }

    /// Append raw bytes read from the terminal.
    pub fn append(&mut self, data: &[u8]) {
        self.total_bytes += data.len();
        self.decoder.decode_into(data, &mut self.text);
    }

    /// Mark end of stream, flushing any incomplete character. Idempotent.
    pub fn finish(&mut self) {
        if !self.eof {
            self.decoder.finish(&mut self.text);
            self.eof = true;
        }
    }

    /// Whether the terminal has reached end of stream.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.eof
    }

    /// Text received but not yet consumed by a match.
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.text[self.cursor..]
    }

    /// Everything received so far, when consumed text is retained.
    #[must_use]
    pub fn transcript(&self) -> Option<&str> {
        self.retain_consumed.then_some(self.text.as_str())
    }

    /// Raw bytes received so far.
    #[must_use]
    pub const fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Replacement characters produced by invalid input.
    #[must_use]
    pub const fn replacements(&self) -> usize {
        self.decoder.replacements()
    }

    /// Consume a match found in [`pending`](Self::pending).
    ///
    /// `start..end` are offsets into the pending text. Returns the text before
    /// the match and the matched text, and moves the cursor past the match.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds or not on character boundaries.
    pub fn consume(&mut self, start: usize, end: usize) -> (String, String) {
        let pending = self.pending();
        let before = pending[..start].to_string();
        let matched = pending[start..end].to_string();
        self.advance(end);
        (before, matched)
    }

    /// Consume all pending text.
    pub fn consume_all(&mut self) -> String {
        let rest = self.pending().to_string();
        self.advance(rest.len());
        rest
    }

    fn advance(&mut self, len: usize) {
        self.cursor += len;
        if !self.retain_consumed {
            self.text.drain(..self.cursor);
            self.cursor = 0;
        }
    }
}

impl fmt::Debug for OutputBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputBuffer")
            .field("pending", &self.pending().len())
            .field("cursor", &self.cursor)
            .field("total_bytes", &self.total_bytes)
            .field("eof", &self.eof)
            .finish_non_exhaustive()
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn consume_splits_before_and_match() {
        let mut buf = OutputBuffer::new(false);
        buf.append(b"echo hi\r\nhi\r\n$ ");

        let (before, matched) = buf.consume(13, 14);
        assert_eq!(before, "echo hi\r\nhi\r\n");
        assert_eq!(matched, "$");
        assert_eq!(buf.pending(), " ");
        assert!(buf.transcript().is_none());
    }

    #[test]
    fn retained_transcript_keeps_consumed_text() {
        let mut buf = OutputBuffer::new(true);
        buf.append(b"first$ second");
        buf.consume(5, 6);

        assert_eq!(buf.pending(), " second");
        assert_eq!(buf.transcript(), Some("first$ second"));
    }

    #[test]
    fn split_character_is_completed_by_next_append() {
        let mut buf = OutputBuffer::default();
        let check = "✓".as_bytes();
        buf.append(&check[..2]);
        assert_eq!(buf.pending(), "");
        buf.append(&check[2..]);
        assert_eq!(buf.pending(), "✓");
        assert_eq!(buf.total_bytes(), 3);
    }

    #[test]
    fn finish_flushes_and_is_idempotent() {
        let mut buf = OutputBuffer::default();
        buf.append(b"tail\xe2");
        buf.finish();
        buf.finish();

        assert!(buf.is_eof());
        assert_eq!(buf.consume_all(), "tail\u{FFFD}");
        assert_eq!(buf.pending(), "");
        assert_eq!(buf.replacements(), 1);
    }

    proptest! {
        #[test]
        fn consumed_plus_pending_is_everything(
            chunks in proptest::collection::vec("[a-z$\\n ]{0,12}", 1..10),
            retain in any::<bool>(),
        ) {
            let mut buf = OutputBuffer::new(retain);
            let mut consumed = String::new();

            for chunk in &chunks {
                buf.append(chunk.as_bytes());
                if let Some(pos) = buf.pending().find('$') {
                    let (before, matched) = buf.consume(pos, pos + 1);
                    consumed.push_str(&before);
                    consumed.push_str(&matched);
                }
            }

            let everything: String = chunks.concat();
            prop_assert_eq!(format!("{consumed}{}", buf.pending()), everything.clone());
            prop_assert_eq!(buf.total_bytes(), everything.len());
            if retain {
                prop_assert_eq!(buf.transcript(), Some(everything.as_str()));
            }
        }
    }
}
