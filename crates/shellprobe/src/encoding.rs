//! Text decoding for terminal output.
//!
//! Terminal reads end wherever the kernel decides, so a multi-byte UTF-8
//! character is routinely split across two reads. [`Utf8Decoder`] keeps the
//! incomplete tail of one chunk and finishes it with the next, and replaces
//! genuinely invalid bytes with U+FFFD instead of failing.

use std::borrow::Cow;

/// Streaming, lossy UTF-8 decoder.
#[derive(Debug, Default, Clone)]
pub struct Utf8Decoder {
    /// Bytes of a character whose remaining bytes have not arrived yet.
    pending: Vec<u8>,
    /// Replacement characters emitted so far.
    replacements: usize,
}

impl Utf8Decoder {
    /// Create a new decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `input`, appending complete characters to `out`.
    ///
    /// A trailing incomplete sequence is held back until the next call or
    /// until [`finish`](Self::finish).
    pub fn decode_into(&mut self, input: &[u8], out: &mut String) {
        let joined;
        let mut bytes = if self.pending.is_empty() {
            input
        } else {
            self.pending.extend_from_slice(input);
            joined = std::mem::take(&mut self.pending);
            joined.as_slice()
        };

        loop {
            match std::str::from_utf8(bytes) {
                Ok(text) => {
                    out.push_str(text);
                    return;
                }
                Err(e) => {
                    let (valid, rest) = bytes.split_at(e.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.replacements += 1;
                            bytes = &rest[len..];
                        }
                        None => {
                            self.pending = rest.to_vec();
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Flush a dangling partial sequence at end of stream.
    pub fn finish(&mut self, out: &mut String) {
        if !self.pending.is_empty() {
            self.pending.clear();
            out.push(char::REPLACEMENT_CHARACTER);
            self.replacements += 1;
        }
    }

    /// Number of bytes held back waiting for the rest of a character.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of replacement characters emitted so far.
    #[must_use]
    pub const fn replacements(&self) -> usize {
        self.replacements
    }
}

/// Strip ANSI escape sequences from text.
///
/// Removes CSI and OSC sequences plus two-byte escapes, which is what line
/// editors emit when they redraw a prompt.
#[must_use]
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    if !text.contains('\x1b') {
        return Cow::Borrowed(text);
    }

    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\x1b' {
            result.push(c);
            continue;
        }
        match chars.peek() {
            Some('[') => {
                // CSI: parameters, then a final byte in 0x40..=0x7E
                chars.next();
                for param in chars.by_ref() {
                    if ('\x40'..='\x7e').contains(&param) {
                        break;
                    }
                }
            }
            Some(']') => {
                // OSC: terminated by BEL or ESC \
                chars.next();
                while let Some(osc_char) = chars.next() {
                    if osc_char == '\x07' {
                        break;
                    }
                    if osc_char == '\x1b' {
                        if chars.peek() == Some(&'\\') {
                            chars.next();
                        }
                        break;
                    }
                }
            }
            Some('(' | ')') => {
                chars.next();
                chars.next();
            }
            Some(_) => {
                chars.next();
            }
            None => {}
        }
    }

    Cow::Owned(result)
}
