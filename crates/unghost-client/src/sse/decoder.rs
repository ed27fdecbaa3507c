use futures::{Stream, StreamExt};
use std::pin::Pin;
use unghost_types::ChatEvent;

use super::buffering::CircularLineBuffer;
use crate::error::StreamError;

/// Stream of decoded chat events. Per-frame decode failures are yielded as
/// recoverable errors; a transport failure is the last item.
pub type ChatEventStream = Pin<Box<dyn Stream<Item = Result<ChatEvent, StreamError>> + Send>>;

const DEFAULT_EVENT: &str = "message";

/// One `event:`/`data:` block terminated by a blank line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

impl SseFrame {
    pub fn decode(&self) -> Result<ChatEvent, StreamError> {
        ChatEvent::from_sse(&self.event, &self.data).map_err(|source| StreamError::Decode {
            event: self.event.clone(),
            source,
        })
    }
}

/// Accumulates lines into frames.
#[derive(Debug, Default)]
pub struct SseFrameDecoder {
    event: Option<String>,
    data: Vec<String>,
}

impl SseFrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line (terminator already stripped). Returns a frame when the
    /// line closes one.
    pub fn push_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.take_frame();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            other => tracing::trace!(field = other, "Ignoring SSE field"),
        }
        None
    }

    /// Flush a frame left open when the stream ended without a blank line.
    pub fn finish(&mut self) -> Option<SseFrame> {
        self.take_frame()
    }

    fn take_frame(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame {
            event: event.unwrap_or_else(|| DEFAULT_EVENT.to_string()),
            data,
        })
    }
}

/// Decode a byte stream of SSE frames into chat events.
pub fn parse_chat_event_stream<S, B, E>(bytes: S) -> ChatEventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(bytes);
        let mut buffer = CircularLineBuffer::with_capacity(8192);
        let mut decoder = SseFrameDecoder::new();
        let mut broken = false;

        while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(chunk) => {
                    buffer.extend(chunk.as_ref());

                    while let Some(line_result) = buffer.next_line() {
                        match line_result {
                            Ok(line) => {
                                if let Some(frame) = decoder.push_line(&line) {
                                    yield frame.decode();
                                }
                            }
                            Err(e) => yield Err(e),
                        }
                    }
                }
                Err(e) => {
                    yield Err(StreamError::Transport(e.to_string()));
                    broken = true;
                    break;
                }
            }
        }

        if !broken {
            if let Some(line_result) = buffer.take_remainder() {
                match line_result {
                    Ok(line) => {
                        if let Some(frame) = decoder.push_line(&line) {
                            yield frame.decode();
                        }
                    }
                    Err(e) => yield Err(e),
                }
            }
            if let Some(frame) = decoder.finish() {
                yield frame.decode();
            }
        }
    })
}
