//! Incremental decoder for the backend's `data: {json}` record stream
//!
//! The backend answers with newline-separated lines of the form
//! `data: {"delta": "..."}`, `data: {"done": true}` or
//! `data: {"error": true, "message": "..."}`. Records may be split across
//! read chunks, so the decoder buffers an incomplete trailing line and
//! only parses complete ones. Anything that is not a decodable record is
//! treated as a keep-alive and skipped.

use serde::Deserialize;

use crate::error::{Error, Result};

/// One decoded record from the reply stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyEvent {
    /// An incremental fragment of assistant text
    Delta(String),
    /// The backend finished the reply
    Done,
}

#[derive(Debug, Default, Deserialize)]
struct RawRecord {
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    delta: Option<String>,
}

/// Chunk-at-a-time record decoder.
///
/// Feed raw response bytes as they arrive; complete records come out in
/// order. Once a `done` or `error` record has been seen the decoder is
/// finished and ignores further input.
#[derive(Debug, Default)]
pub struct RecordDecoder {
    buffer: Vec<u8>,
    finished: bool,
}

impl RecordDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a terminal record has been decoded
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Decode all complete records contained in `chunk` plus any
    /// previously buffered partial line.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<ReplyEvent>> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }
        self.buffer.extend_from_slice(chunk);

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            // A multi-byte character never straddles a newline, so complete
            // lines decode independently of how the chunks were cut.
            let line = String::from_utf8_lossy(&line);
            let Some(payload) = line.trim().strip_prefix("data:") else {
                continue;
            };
            let payload = payload.trim();
            if payload.is_empty() {
                continue;
            }
            let Ok(record) = serde_json::from_str::<RawRecord>(payload) else {
                // Keep-alive or junk; never aborts the stream.
                continue;
            };

            if record.done {
                self.finished = true;
                self.buffer.clear();
                events.push(Ok(ReplyEvent::Done));
                return events;
            }
            if record.error {
                self.finished = true;
                self.buffer.clear();
                let message = record.message.unwrap_or_else(|| "stream_failed".to_string());
                events.push(Err(Error::Stream(message)));
                return events;
            }
            if let Some(delta) = record.delta {
                if !delta.is_empty() {
                    events.push(Ok(ReplyEvent::Delta(delta)));
                }
            }
        }

        events
    }
}
