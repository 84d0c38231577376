//! Streaming frame extraction.
//!
//! The serial stream has no framing guarantee: one JSON array may be split
//! across many reads, many arrays may arrive in one read, and arbitrary
//! non-JSON noise may sit between them. [`FrameExtractor`] accumulates
//! chunks and emits each syntactically complete top-level array as a
//! [`Frame`], verbatim.
//!
//! Boundary detection counts `[`/`]` and `{`/`}` depth while tracking
//! string literals, so a bracket inside a quoted value is never treated
//! as a delimiter. A frame opens at the first `[` seen at zero depth and
//! closes at the `]` that returns both depths to zero. Closed candidates
//! are validated with a full JSON parse; invalid candidates are logged
//! and skipped without aborting the rest of the buffer.

use serde_json::Value;
use tracing::warn;

/// Default cap on the accumulation buffer.
///
/// Matches the serial receive buffer the stream is read through. A frame
/// that has not closed within this many bytes is treated as noise and
/// dropped, so a stray unmatched `[` cannot grow memory without bound.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// One syntactically complete top-level JSON array from the stream.
///
/// Carries both the verbatim text (byte-for-byte as it appeared on the
/// wire, whitespace included) and the value it parsed to during
/// validation, so downstream classification never reparses.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    raw: String,
    value: Value,
}

impl Frame {
    pub(crate) fn new(raw: String, value: Value) -> Self {
        Self { raw, value }
    }

    /// The frame text exactly as it appeared on the wire.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The parsed JSON value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consumes the frame, returning the raw text and parsed value.
    pub fn into_parts(self) -> (String, Value) {
        (self.raw, self.value)
    }
}

/// Stateful extractor turning arbitrary-sized chunks into frames.
///
/// Safe to call [`feed`](Self::feed) repeatedly; leftover bytes from an
/// unterminated frame carry over to the next call. Not restartable
/// across process restarts — there is no persistence.
#[derive(Debug)]
pub struct FrameExtractor {
    buffer: String,
    max_buffer_size: usize,
    discarded: Vec<String>,
}

impl Default for FrameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameExtractor {
    /// Creates an extractor with the default buffer cap.
    pub fn new() -> Self {
        Self::with_max_buffer_size(DEFAULT_MAX_BUFFER_SIZE)
    }

    /// Creates an extractor with a custom buffer cap.
    pub fn with_max_buffer_size(max_buffer_size: usize) -> Self {
        Self {
            buffer: String::new(),
            max_buffer_size,
            discarded: Vec::new(),
        }
    }

    /// Bytes currently held for the next call.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// Drains the candidates discarded since the last call.
    ///
    /// Discards are structurally balanced stretches that failed JSON
    /// validation; extraction continued past them. Callers surface these
    /// as warnings.
    pub fn take_discarded(&mut self) -> Vec<String> {
        std::mem::take(&mut self.discarded)
    }

    /// Consumes a chunk and returns every frame it completed, in order.
    ///
    /// Content consumed by emitted (or discarded) frames and the noise
    /// preceding them is dropped; a trailing partial frame is kept for
    /// the next call.
    pub fn feed(&mut self, chunk: &str) -> Vec<Frame> {
        self.buffer.push_str(chunk);

        let mut frames = Vec::new();
        // Start byte offset of the currently open frame, if any. All
        // delimiters are ASCII, so byte offsets are char boundaries.
        let mut start: Option<usize> = None;
        let mut bracket_depth: u64 = 0;
        let mut brace_depth: u64 = 0;
        let mut in_string = false;
        let mut escaped = false;

        for (i, byte) in self.buffer.bytes().enumerate() {
            if start.is_none() {
                if byte == b'[' {
                    start = Some(i);
                    bracket_depth = 1;
                    brace_depth = 0;
                    in_string = false;
                    escaped = false;
                }
                continue;
            }

            if in_string {
                if escaped {
                    escaped = false;
                } else if byte == b'\\' {
                    escaped = true;
                } else if byte == b'"' {
                    in_string = false;
                }
                continue;
            }

            match byte {
                b'"' => in_string = true,
                b'[' => bracket_depth += 1,
                b'{' => brace_depth += 1,
                b'}' => brace_depth = brace_depth.saturating_sub(1),
                b']' => {
                    bracket_depth = bracket_depth.saturating_sub(1);
                    if bracket_depth == 0
                        && brace_depth == 0
                        && let Some(opened) = start.take()
                    {
                        let candidate = &self.buffer[opened..=i];
                        match serde_json::from_str::<Value>(candidate) {
                            Ok(value) => {
                                frames.push(Frame::new(candidate.to_string(), value));
                            }
                            Err(error) => {
                                warn!(%error, frame = candidate, "discarding malformed frame");
                                self.discarded.push(candidate.to_string());
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        // Retain only an unterminated frame; everything else (emitted
        // frames, discarded candidates, interleaved noise) is consumed.
        match start {
            Some(opened) => {
                if opened > 0 {
                    self.buffer.drain(..opened);
                }
            }
            None => self.buffer.clear(),
        }

        if self.buffer.len() > self.max_buffer_size {
            warn!(
                pending = self.buffer.len(),
                max = self.max_buffer_size,
                "frame never closed within buffer cap, dropping pending data"
            );
            self.buffer.clear();
        }

        frames
    }
}
