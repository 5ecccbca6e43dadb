//! Newline framing for an incoming byte stream.
//!
//! Chunks arrive in whatever sizes the pipe delivers. The framer accumulates
//! them and hands out one complete line at a time; a line is only complete once
//! its terminating `\n` has been seen. Whitespace around a line (including the
//! `\r` of CRLF endings) is trimmed and blank lines are skipped.
//!
//! Unterminated data is capped at [`LineFramer::max_line_bytes`]. A line that
//! outgrows the cap is reported once as [`FrameError::LineTooLong`] and its
//! remaining bytes are dropped up to the next newline.

use thiserror::Error;

/// Default cap on the length of one line: 10 MiB.
pub const DEFAULT_MAX_LINE_BYTES: usize = 10 * 1024 * 1024;

/// A line that could not be handed to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The line grew past the configured cap.
    #[error("line of {len} bytes exceeds the {limit} byte limit")]
    LineTooLong {
        /// Bytes seen when the line was rejected.
        len: usize,
        /// Configured cap.
        limit: usize,
    },
    /// The line is not valid UTF-8.
    #[error("line is not valid UTF-8")]
    InvalidUtf8,
}

/// One framed line, or the reason it was rejected.
pub type Frame = Result<String, FrameError>;

/// Accumulation buffer turning chunks into lines.
#[derive(Debug)]
pub struct LineFramer {
    buffer: Vec<u8>,
    /// Start of the data not yet handed out.
    read_pos: usize,
    /// Everything between `read_pos` and here is known to hold no newline.
    scan_pos: usize,
    max_line_bytes: usize,
    /// Dropping the rest of an oversized line.
    discarding: bool,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_BYTES)
    }
}

impl LineFramer {
    /// Creates a framer that rejects lines longer than `max_line_bytes`.
    #[must_use]
    pub const fn new(max_line_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            read_pos: 0,
            scan_pos: 0,
            max_line_bytes,
            discarding: false,
        }
    }

    /// Returns the maximum allowed line length in bytes.
    #[must_use]
    pub const fn max_line_bytes(&self) -> usize {
        self.max_line_bytes
    }

    /// Bytes buffered but not yet part of a complete line.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len() - self.read_pos
    }

    /// Appends a chunk. Call [`next_frame`](Self::next_frame) until it
    /// returns `None` to drain the lines the chunk completed.
    pub fn push(&mut self, chunk: &[u8]) {
        if self.read_pos > 0 {
            self.buffer.drain(..self.read_pos);
            self.scan_pos -= self.read_pos;
            self.read_pos = 0;
        }
        self.buffer.extend_from_slice(chunk);
    }

    /// Extracts the next complete, non-blank line.
    pub fn next_frame(&mut self) -> Option<Frame> {
        loop {
            let Some(offset) = self.buffer[self.scan_pos..]
                .iter()
                .position(|&byte| byte == b'\n')
            else {
                return self.check_pending();
            };

            let start = self.read_pos;
            let end = self.scan_pos + offset;
            self.read_pos = end + 1;
            self.scan_pos = self.read_pos;

            if std::mem::take(&mut self.discarding) {
                continue;
            }

            let len = end - start;
            if len > self.max_line_bytes {
                return Some(Err(FrameError::LineTooLong {
                    len,
                    limit: self.max_line_bytes,
                }));
            }

            match std::str::from_utf8(&self.buffer[start..end]) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        return Some(Ok(line.to_owned()));
                    }
                }
                Err(_) => return Some(Err(FrameError::InvalidUtf8)),
            }
        }
    }

    /// No newline in sight: enforce the cap on the unterminated tail.
    fn check_pending(&mut self) -> Option<Frame> {
        self.scan_pos = self.buffer.len();
        let pending = self.buffered();
        if pending <= self.max_line_bytes {
            return None;
        }

        self.buffer.clear();
        self.read_pos = 0;
        self.scan_pos = 0;
        if self.discarding {
            return None;
        }
        self.discarding = true;
        Some(Err(FrameError::LineTooLong {
            len: pending,
            limit: self.max_line_bytes,
        }))
    }

    /// Ends the stream. Unterminated data is never a message; it is dropped
    /// and its length returned.
    pub fn finish(&mut self) -> usize {
        let dropped = self.buffered();
        self.buffer.clear();
        self.read_pos = 0;
        self.scan_pos = 0;
        self.discarding = false;
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(framer: &mut LineFramer) -> Vec<Frame> {
        std::iter::from_fn(|| framer.next_frame()).collect()
    }

    #[test]
    fn joins_a_request_split_across_chunks() {
        let mut framer = LineFramer::default();

        framer.push(br#"{"jsonrpc":"2.0","id":1,"method":"tools/l"#);
        assert!(framer.next_frame().is_none());

        framer.push(b"ist\"}\n");
        assert_eq!(
            drain(&mut framer),
            vec![Ok(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#.to_string())]
        );
        assert_eq!(framer.buffered(), 0);
    }

    #[test]
    fn splits_several_lines_and_skips_blank_ones() {
        let mut framer = LineFramer::default();
        framer.push(b"one\n\n   \n two \r\nthree\r\npartial");

        assert_eq!(
            drain(&mut framer),
            vec![
                Ok("one".to_string()),
                Ok("two".to_string()),
                Ok("three".to_string())
            ]
        );
        assert_eq!(framer.buffered(), "partial".len());
    }

    #[test]
    fn unterminated_tail_is_dropped_at_end_of_stream() {
        let mut framer = LineFramer::default();
        framer.push(b"{\"id\":1}\n{\"id\":");
        assert_eq!(drain(&mut framer).len(), 1);

        assert_eq!(framer.finish(), 6);
        assert!(framer.next_frame().is_none());
    }

    #[test]
    fn keeps_multibyte_characters_split_between_chunks() {
        let mut framer = LineFramer::default();
        let text = "\"é\"\n".as_bytes();
        framer.push(&text[..2]);
        assert!(framer.next_frame().is_none());
        framer.push(&text[2..]);
        assert_eq!(drain(&mut framer), vec![Ok("\"é\"".to_string())]);
    }

    #[test]
    fn rejects_invalid_utf8_and_moves_on() {
        let mut framer = LineFramer::default();
        framer.push(b"\xff\xfe\nok\n");
        assert_eq!(
            drain(&mut framer),
            vec![Err(FrameError::InvalidUtf8), Ok("ok".to_string())]
        );
    }

    #[test]
    fn oversized_unterminated_line_is_reported_once() {
        let mut framer = LineFramer::new(8);

        framer.push(b"0123456789");
        assert_eq!(
            drain(&mut framer),
            vec![Err(FrameError::LineTooLong { len: 10, limit: 8 })]
        );
        assert_eq!(framer.buffered(), 0);

        framer.push(b"more junk without end");
        assert!(drain(&mut framer).is_empty());

        framer.push(b"tail\nnext\n");
        assert_eq!(drain(&mut framer), vec![Ok("next".to_string())]);
    }

    #[test]
    fn oversized_complete_line_is_rejected() {
        let mut framer = LineFramer::new(4);
        framer.push(b"abcdefgh\nok\n");
        assert_eq!(
            drain(&mut framer),
            vec![
                Err(FrameError::LineTooLong { len: 8, limit: 4 }),
                Ok("ok".to_string())
            ]
        );
    }
}
