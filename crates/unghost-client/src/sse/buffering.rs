use std::collections::VecDeque;

use crate::error::StreamError;

/// Circular buffer for line-based parsing of a byte stream.
///
/// Bytes are only decoded once a whole line is available, so a multi-byte
/// character split across network chunks is never decoded in halves.
pub struct CircularLineBuffer {
    buffer: VecDeque<u8>,
}

impl CircularLineBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract the next line without its `\n` or `\r\n` terminator.
    /// Returns None if no complete line is available.
    pub fn next_line(&mut self) -> Option<Result<String, StreamError>> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
        Some(decode_line(&line_bytes))
    }

    /// Take whatever is left once the stream has ended.
    pub fn take_remainder(&mut self) -> Option<Result<String, StreamError>> {
        if self.buffer.is_empty() {
            return None;
        }
        let line_bytes: Vec<u8> = self.buffer.drain(..).collect();
        Some(decode_line(&line_bytes))
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

fn decode_line(bytes: &[u8]) -> Result<String, StreamError> {
    let line = std::str::from_utf8(bytes)?;
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_and_crlf() {
        let mut buffer = CircularLineBuffer::with_capacity(64);

        buffer.extend(b"event: message_chunk\r\ndata: {}\n\n");

        assert_eq!(buffer.next_line().unwrap().unwrap(), "event: message_chunk");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "data: {}");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "");
        assert!(buffer.next_line().is_none());
    }

    #[test]
    fn test_partial_line() {
        let mut buffer = CircularLineBuffer::with_capacity(64);

        buffer.extend(b"data: par");
        assert!(buffer.next_line().is_none());

        buffer.extend(b"tial\n");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "data: partial");
    }

    #[test]
    fn test_split_multibyte_character() {
        let mut buffer = CircularLineBuffer::with_capacity(64);
        let text = "data: café\n".as_bytes();
        let split = text.len() - 2;

        buffer.extend(&text[..split]);
        assert!(buffer.next_line().is_none());
        buffer.extend(&text[split..]);
        assert_eq!(buffer.next_line().unwrap().unwrap(), "data: café");
    }

    #[test]
    fn test_remainder() {
        let mut buffer = CircularLineBuffer::with_capacity(64);
        buffer.extend(b"data: tail");
        assert!(buffer.next_line().is_none());
        assert_eq!(buffer.take_remainder().unwrap().unwrap(), "data: tail");
        assert!(buffer.take_remainder().is_none());
    }
}
