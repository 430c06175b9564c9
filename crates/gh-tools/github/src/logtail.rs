//! Ring-buffer tail over streamed GitHub Actions logs.
//!
//! Job logs can be arbitrarily large; only the last N lines are of any use
//! to an agent. [`LineTail`] consumes a byte stream chunk by chunk, keeping
//! memory bounded by `max_lines` short lines plus one in-flight line capped
//! at 10 MiB.

use crate::error::RawHttpError;

/// Hard upper bound for `max_lines`.
pub const MAX_TAIL_LINES: usize = 100_000;
/// A single line larger than this is truncated and flagged.
const MAX_LINE_BYTES: usize = 10 * 1024 * 1024;
/// Truncated lines keep this many leading chars before the marker.
const TRUNCATED_PREFIX_CHARS: usize = 1000;
const TRUNCATED_MARKER: &str = "... [TRUNCATED]";

/// The tail of a log plus the number of lines actually observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailedLog {
    pub text: String,
    pub total_lines: u64,
}

/// Streaming accumulator for the last `max_lines` lines of a byte stream.
#[derive(Debug)]
pub struct LineTail {
    max_lines: usize,
    ring: Vec<String>,
    total: u64,
    current: Vec<u8>,
    truncated: bool,
}

impl LineTail {
    /// `max_lines` is clamped to [`MAX_TAIL_LINES`]. With `max_lines == 0`
    /// the output is empty but `total_lines` still counts every line seen.
    pub fn new(max_lines: usize) -> Self {
        let max_lines = max_lines.min(MAX_TAIL_LINES);
        Self {
            max_lines,
            ring: Vec::new(),
            total: 0,
            current: Vec::new(),
            truncated: false,
        }
    }

    /// Feed the next chunk of the body.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        let mut rest = bytes;
        while let Some(pos) = rest.iter().position(|b| *b == b'\n') {
            self.push_line_part(&rest[..pos]);
            self.commit_line();
            rest = &rest[pos + 1..];
        }
        self.push_line_part(rest);
    }

    /// Flush the trailing partial line and serialize the ring.
    pub fn finish(mut self) -> TailedLog {
        if !self.current.is_empty() || self.truncated {
            self.commit_line();
        }

        let text = if self.max_lines == 0 || self.total == 0 {
            String::new()
        } else if self.total <= self.max_lines as u64 {
            self.ring.join("\n")
        } else {
            let w = (self.total % self.max_lines as u64) as usize;
            let mut lines: Vec<&str> = Vec::with_capacity(self.max_lines);
            for i in 0..self.max_lines {
                lines.push(&self.ring[(w + i) % self.max_lines]);
            }
            lines.join("\n")
        };

        TailedLog {
            text,
            total_lines: self.total,
        }
    }

    fn push_line_part(&mut self, part: &[u8]) {
        if self.truncated {
            // The rest of an overlong line is dropped on the floor.
            return;
        }
        let remaining = MAX_LINE_BYTES - self.current.len();
        if part.len() > remaining {
            self.current.extend_from_slice(&part[..remaining]);
            self.truncated = true;
        } else {
            self.current.extend_from_slice(part);
        }
    }

    fn commit_line(&mut self) {
        let line = if self.truncated {
            let text = String::from_utf8_lossy(&self.current);
            let prefix: String = text.chars().take(TRUNCATED_PREFIX_CHARS).collect();
            format!("{prefix}{TRUNCATED_MARKER}")
        } else {
            String::from_utf8_lossy(&self.current).into_owned()
        };
        self.current.clear();
        self.truncated = false;

        if self.max_lines > 0 {
            let idx = (self.total % self.max_lines as u64) as usize;
            if idx < self.ring.len() {
                self.ring[idx] = line;
            } else {
                self.ring.push(line);
            }
        }
        self.total += 1;
    }
}

/// Drive a `reqwest` response body through a [`LineTail`].
pub async fn tail_response(
    response: reqwest::Response,
    max_lines: usize,
) -> Result<TailedLog, RawHttpError> {
    let url = response.url().to_string();
    let mut response = response;
    let mut tail = LineTail::new(max_lines);
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| RawHttpError::from_reqwest(&url, &e))?
    {
        tail.push_bytes(&chunk);
    }
    Ok(tail.finish())
}
