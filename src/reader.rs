//! Bounded line reading for debugfs and procfs text files.
//!
//! Kernel debug files are read through a fixed-size line buffer: a line longer
//! than the buffer is handed out in consecutive chunks, and nothing beyond the
//! limit is ever held in memory at once.

use std::io::{self, BufRead, BufReader, Read};

/// Reads lines of at most `limit - 1` bytes, newline included.
pub struct LineReader<R> {
    inner: BufReader<R>,
    limit: usize,
    buf: Vec<u8>,
}

impl<R: Read> LineReader<R> {
    pub fn new(io: R, limit: usize) -> Self {
        Self {
            inner: BufReader::new(io),
            limit,
            buf: Vec::with_capacity(limit),
        }
    }

    /// Like [`new`](Self::new) with an explicit read buffer size.
    pub fn with_capacity(capacity: usize, io: R, limit: usize) -> Self {
        Self {
            inner: BufReader::with_capacity(capacity.max(1), io),
            limit,
            buf: Vec::with_capacity(limit),
        }
    }

    /// Returns the next line (or line chunk), `None` at end of data.
    ///
    /// The returned slice keeps its trailing newline when one fit in the buffer.
    pub fn next_line(&mut self) -> io::Result<Option<&[u8]>> {
        self.buf.clear();
        let max = self.limit.saturating_sub(1);

        while self.buf.len() < max {
            let available = match self.inner.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                break;
            }

            let room = max - self.buf.len();
            let window = &available[..available.len().min(room)];
            match window.iter().position(|&b| b == b'\n') {
                Some(newline_idx) => {
                    self.buf.extend_from_slice(&window[..=newline_idx]);
                    self.inner.consume(newline_idx + 1);
                    break;
                }
                None => {
                    let n = window.len();
                    self.buf.extend_from_slice(window);
                    self.inner.consume(n);
                }
            }
        }

        if self.buf.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.buf.as_slice()))
        }
    }

    /// Discards everything up to and including the next newline, whatever its length.
    ///
    /// Returns the number of bytes skipped.
    pub fn skip_line(&mut self) -> io::Result<u64> {
        let mut skipped = 0u64;
        loop {
            let available = match self.inner.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                return Ok(skipped);
            }

            match available.iter().position(|&b| b == b'\n') {
                Some(newline_idx) => {
                    self.inner.consume(newline_idx + 1);
                    return Ok(skipped + newline_idx as u64 + 1);
                }
                None => {
                    let n = available.len();
                    self.inner.consume(n);
                    skipped += n as u64;
                }
            }
        }
    }
}

/// Strips a trailing `\n` (and `\r`) from a line for display and comparisons.
pub fn trim_newline(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
