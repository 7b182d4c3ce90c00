use serde_json::Value;
use tracing::{debug, warn};

use crate::events::{AnswerPayload, StreamFrame};

/// Incremental parser for the backend's `data:`-prefixed event stream.
///
/// Bytes are buffered until a blank-line record boundary arrives, so records
/// (and multi-byte characters) split across reads are reassembled before
/// decoding. One parser serves exactly one session.
#[derive(Debug, Default)]
pub struct FrameParser {
    buffer: Vec<u8>,
}

impl FrameParser {
    /// Feed arbitrary bytes into the parser and drain complete frames in order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamFrame> {
        self.buffer.extend_from_slice(bytes);
        let mut frames = Vec::new();

        while let Some((end, boundary_len)) = find_record_boundary(&self.buffer) {
            let record: Vec<u8> = self.buffer.drain(..end + boundary_len).collect();
            let record = String::from_utf8_lossy(&record[..end]);

            let Some(payload) = extract_data_payload(&record) else {
                continue;
            };
            if payload == "[DONE]" {
                continue;
            }

            match serde_json::from_str::<Value>(&payload) {
                Ok(value) => {
                    if let Some(frame) = map_frame(value) {
                        frames.push(frame);
                    }
                }
                Err(error) => {
                    warn!(%error, payload_len = payload.len(), "dropping malformed stream frame");
                }
            }
        }

        frames
    }

    /// Parse a complete stream payload string in one shot.
    pub fn parse_frames(input: &str) -> Vec<StreamFrame> {
        let mut parser = Self::default();
        parser.feed(input.as_bytes())
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.iter().all(u8::is_ascii_whitespace)
    }

    /// Ends the parse, discarding any buffered partial record. Returns true
    /// when undelivered bytes were left behind.
    pub fn finish(&mut self) -> bool {
        let partial = !self.is_empty_buffer();
        if partial {
            debug!(
                buffered = self.buffer.len(),
                "stream ended with a partial record buffered"
            );
        }
        self.buffer.clear();
        partial
    }
}

/// Locates the first blank line. Returns the record length and the length of
/// the separator to consume (`\n\n` or `\n\r\n`).
fn find_record_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    buffer
        .iter()
        .enumerate()
        .filter(|(_, byte)| **byte == b'\n')
        .find_map(|(index, _)| match &buffer[index + 1..] {
            [b'\n', ..] => Some((index, 2)),
            [b'\r', b'\n', ..] => Some((index, 3)),
            _ => None,
        })
}

fn extract_data_payload(record: &str) -> Option<String> {
    let data_lines: Vec<&str> = record
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .collect();

    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}

fn map_frame(value: Value) -> Option<StreamFrame> {
    let Some(frame_type) = value.get("type").and_then(Value::as_str) else {
        debug!("ignoring stream record without a type tag");
        return None;
    };

    match frame_type {
        "reasoning" => Some(StreamFrame::Reasoning {
            step: text_field(&value).unwrap_or_default(),
        }),
        "answer" => Some(StreamFrame::Answer {
            payload: AnswerPayload::from_content(value.get("content"), value.get("sources")),
        }),
        "error" => Some(StreamFrame::Error {
            message: text_field(&value)
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| "unknown error".to_owned()),
        }),
        "done" | "complete" => Some(StreamFrame::Done),
        other => Some(StreamFrame::Unknown {
            frame_type: other.to_owned(),
            payload: value.clone(),
        }),
    }
}

/// Reads `content`, falling back to `message`, as display text.
fn text_field(value: &Value) -> Option<String> {
    ["content", "message"]
        .iter()
        .find_map(|key| value.get(*key))
        .and_then(|field| match field {
            Value::String(text) => Some(text.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
}
