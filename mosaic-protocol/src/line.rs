//! Incremental line assembly for the serial command channel.
//!
//! Command traffic is newline-terminated ASCII. Bytes arrive in whatever
//! chunks the UART delivers, so the reader accumulates one byte at a time
//! and yields a complete, trimmed line when the terminator shows up.
//! Overlong lines are swallowed until their terminator and reported once,
//! leaving the reader ready for the next line.

use heapless::{String, Vec};

/// Maximum accepted command line length, terminator excluded.
///
/// The longest catalogued command is `CMD:UPDATE_CONFIG:` with six
/// numeric parameters; 96 bytes leaves generous slack.
pub const MAX_LINE_LEN: usize = 96;

/// Errors surfaced while assembling a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Line exceeded [`MAX_LINE_LEN`]; it was discarded up to its terminator
    TooLong,
    /// Line contained bytes that are not valid UTF-8
    InvalidUtf8,
}

/// Accumulates serial bytes into newline-terminated command lines
#[derive(Debug, Default)]
pub struct LineReader {
    buf: Vec<u8, MAX_LINE_LEN>,
    overflowed: bool,
}

impl LineReader {
    /// Create an empty reader
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            overflowed: false,
        }
    }

    /// Discard any partially assembled line
    pub fn clear(&mut self) {
        self.buf.clear();
        self.overflowed = false;
    }

    /// Feed a single byte
    ///
    /// Returns `Ok(Some(line))` when a terminator completes a line (with
    /// surrounding whitespace and any `\r` trimmed), `Ok(None)` while the
    /// line is still incomplete, or `Err` once per discarded line.
    pub fn feed(&mut self, byte: u8) -> Result<Option<String<MAX_LINE_LEN>>, LineError> {
        if byte == b'\n' {
            if self.overflowed {
                self.clear();
                return Err(LineError::TooLong);
            }

            let line = match core::str::from_utf8(&self.buf) {
                Ok(text) => {
                    let mut line = String::new();
                    // Trimmed text always fits: it is a subslice of buf
                    let _ = line.push_str(text.trim());
                    line
                }
                Err(_) => {
                    self.clear();
                    return Err(LineError::InvalidUtf8);
                }
            };

            self.buf.clear();
            return Ok(Some(line));
        }

        if self.overflowed {
            return Ok(None);
        }

        if self.buf.push(byte).is_err() {
            self.overflowed = true;
        }

        Ok(None)
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use std::vec::Vec as StdVec;

    proptest! {
        /// Any sequence of printable ASCII lines is reassembled verbatim
        /// (modulo the documented trimming), one line per terminator.
        #[test]
        fn lines_round_trip(texts in proptest::collection::vec("[ -~]{0,80}", 1..6)) {
            let mut reader = LineReader::new();
            let mut lines: StdVec<String<MAX_LINE_LEN>> = StdVec::new();

            for text in &texts {
                for &b in text.as_bytes() {
                    prop_assert_eq!(reader.feed(b), Ok(None));
                }
                if let Ok(Some(line)) = reader.feed(b'\n') {
                    lines.push(line);
                }
            }

            prop_assert_eq!(lines.len(), texts.len());
            for (line, text) in lines.iter().zip(&texts) {
                prop_assert_eq!(line.as_str(), text.trim());
            }
        }
    }
}
