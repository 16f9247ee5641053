use tracing::{trace, warn};

use super::event::{FrameError, StreamEvent};

/// Marker that identifies a line as carrying an event payload.
pub const DATA_PREFIX: &str = "data: ";

/// Lifecycle of a [`StreamDecoder`]. The transition to `Closed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecoderState {
    Reading,
    Closed,
}

/// Incremental decoder for `data: <json>` line streams.
///
/// Chunks may split lines anywhere (including inside a multi-byte UTF-8
/// sequence); the unterminated tail of each chunk is carried over and joined
/// with the next one. Malformed frames are logged and skipped.
#[derive(Debug)]
pub struct StreamDecoder {
    buf: Vec<u8>,
    state: DecoderState,
    dropped_frames: u64,
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            state: DecoderState::Reading,
            dropped_frames: 0,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Number of `data:` frames dropped because their payload was invalid.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    /// Bytes currently held back waiting for a line terminator.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    /// Feeds one transport chunk and returns the events completed by it, in
    /// order. Returns nothing once the decoder is closed.
    pub fn push_chunk(&mut self, chunk: impl AsRef<[u8]>) -> Vec<StreamEvent> {
        if self.state == DecoderState::Closed {
            return Vec::new();
        }
        // The carried-over tail holds no '\n'; only the new bytes need scanning.
        let mut scan_from = self.buf.len();
        self.buf.extend_from_slice(chunk.as_ref());

        let mut events = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.buf[scan_from..].iter().position(|b| *b == b'\n') {
            let end = scan_from + offset;
            match decode_line(&self.buf[consumed..end]) {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(err) => {
                    self.dropped_frames += 1;
                    warn!(error = %err, "dropping malformed stream frame");
                }
            }
            consumed = end + 1;
            scan_from = consumed;
        }
        self.buf.drain(..consumed);
        events
    }

    /// Marks end-of-stream. Any unterminated tail is discarded; returns the
    /// number of bytes thrown away.
    pub fn finish(&mut self) -> usize {
        let discarded = self.buf.len();
        if self.buf.starts_with(DATA_PREFIX.as_bytes()) {
            warn!(bytes = discarded, "discarding unterminated stream frame at end of stream");
        } else if discarded > 0 {
            trace!(bytes = discarded, "discarding unterminated non-data line at end of stream");
        }
        self.buf = Vec::new();
        self.state = DecoderState::Closed;
        discarded
    }
}

/// Decodes a single line (without its `\n`).
///
/// `Ok(None)` means the line carries no event (blank, comment, or another SSE
/// field); `Err` means it was a `data:` frame that could not be parsed.
fn decode_line(raw: &[u8]) -> Result<Option<StreamEvent>, FrameError> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    if raw.is_empty() {
        return Ok(None);
    }
    let Some(payload) = raw.strip_prefix(DATA_PREFIX.as_bytes()) else {
        trace!(len = raw.len(), "ignoring non-data stream line");
        return Ok(None);
    };
    let payload = std::str::from_utf8(payload).map_err(|_| FrameError::InvalidUtf8)?;
    StreamEvent::from_payload(payload).map(Some)
}
