//! Newline reassembly over a rolling byte buffer
//!
//! Serial reads hand back arbitrary fragments of the device's output. The
//! [`LineBuffer`] accumulates those fragments and yields complete lines in
//! order, keeping any trailing partial line until its newline arrives.

/// Rolling byte accumulator that splits on `\n`
///
/// After [`next_line`](LineBuffer::next_line) returns `None`, the buffer holds
/// only bytes of an incomplete trailing line.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
    /// Prefix of `buf` already known to contain no newline
    scanned: usize,
}

impl LineBuffer {
    /// Creates an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends freshly read bytes
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Splits off the first complete line, without its terminating `\n`
    pub fn next_line(&mut self) -> Option<Vec<u8>> {
        let newline = self.buf[self.scanned..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|offset| self.scanned + offset);

        match newline {
            Some(pos) => {
                let rest = self.buf.split_off(pos + 1);
                let mut line = std::mem::replace(&mut self.buf, rest);
                line.pop();
                self.scanned = 0;
                Some(line)
            }
            None => {
                self.scanned = self.buf.len();
                None
            }
        }
    }

    /// Bytes of the incomplete trailing line
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }
}

/// Decodes a raw line as UTF-8, dropping undecodable bytes, and trims it
pub fn decode_line(raw: &[u8]) -> String {
    let mut text = String::with_capacity(raw.len());
    for chunk in raw.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text.trim().to_string()
}
