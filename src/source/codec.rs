//! Line decoder for merged process output.
//!
//! Splits a byte stream on `\n` (dropping one trailing `\r`), decodes each
//! line lossily as UTF-8 and caps line length. A line longer than the cap
//! is delivered truncated; the rest of it, up to the next terminator, is
//! discarded so decoding never stalls on a runaway line.

// Rust guideline compliant 2026-01

use std::io;

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::constants::MAX_LINE_BYTES;

/// `Decoder` producing one `String` per output line.
#[derive(Debug, Clone)]
pub struct LogLineDecoder {
    max_length: usize,
    /// Bytes already scanned for a terminator in the current line.
    next_index: usize,
    /// True while skipping the tail of an overlong line.
    discarding: bool,
}

impl LogLineDecoder {
    /// Create a decoder capping lines at `max_length` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `max_length == 0`.
    #[must_use]
    pub fn new(max_length: usize) -> Self {
        assert!(max_length > 0, "max line length must be > 0");
        Self {
            max_length,
            next_index: 0,
            discarding: false,
        }
    }

    /// Configured line cap in bytes.
    #[must_use]
    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl Default for LogLineDecoder {
    fn default() -> Self {
        Self::new(MAX_LINE_BYTES)
    }
}

fn to_line(mut bytes: &[u8]) -> String {
    if let Some(stripped) = bytes.strip_suffix(b"\n") {
        bytes = stripped;
    }
    if let Some(stripped) = bytes.strip_suffix(b"\r") {
        bytes = stripped;
    }
    String::from_utf8_lossy(bytes).into_owned()
}

impl Decoder for LogLineDecoder {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, io::Error> {
        loop {
            let newline = buf[self.next_index..]
                .iter()
                .position(|b| *b == b'\n')
                .map(|offset| self.next_index + offset);

            match (newline, self.discarding) {
                (Some(end), true) => {
                    // End of an overlong line whose head was already emitted.
                    let _ = buf.split_to(end + 1);
                    self.next_index = 0;
                    self.discarding = false;
                }
                (Some(end), false) => {
                    let line = buf.split_to(end + 1);
                    self.next_index = 0;
                    let limit = self.max_length.min(line.len());
                    return Ok(Some(to_line(&line[..limit])));
                }
                (None, true) => {
                    buf.clear();
                    self.next_index = 0;
                    return Ok(None);
                }
                (None, false) if buf.len() > self.max_length => {
                    let head = buf.split_to(self.max_length);
                    self.next_index = 0;
                    self.discarding = true;
                    return Ok(Some(to_line(&head)));
                }
                (None, false) => {
                    self.next_index = buf.len();
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<String>, io::Error> {
        if let Some(line) = self.decode(buf)? {
            return Ok(Some(line));
        }
        if buf.is_empty() || self.discarding {
            buf.clear();
            self.next_index = 0;
            self.discarding = false;
            return Ok(None);
        }
        // Final line without a terminator.
        let rest = buf.split_to(buf.len());
        self.next_index = 0;
        Ok(Some(to_line(&rest)))
    }
}
