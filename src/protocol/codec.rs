//! CRLF line framing for protocol records.
//!
//! Lines are framed on raw bytes and decoded lossily, so a stray Latin-1
//! byte in one record does not take the connection down.

use std::fmt;
use std::io;

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, Decoder, Encoder};

use super::message::{Message, ParseError};

/// Longest inbound line accepted before the stream is considered corrupt.
/// Servers cap lines at 512 bytes; tagged lines can be much longer.
pub const MAX_LINE_LENGTH: usize = 8192;

#[derive(Debug)]
pub enum CodecError {
    Io(io::Error),
    LineTooLong,
    Parse(ParseError),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Io(e) => write!(f, "I/O error: {e}"),
            CodecError::LineTooLong => {
                write!(f, "line longer than {MAX_LINE_LENGTH} bytes")
            }
            CodecError::Parse(e) => write!(f, "malformed record: {e}"),
        }
    }
}

impl std::error::Error for CodecError {}

impl From<io::Error> for CodecError {
    fn from(e: io::Error) -> Self {
        CodecError::Io(e)
    }
}

impl From<AnyDelimiterCodecError> for CodecError {
    fn from(e: AnyDelimiterCodecError) -> Self {
        match e {
            AnyDelimiterCodecError::MaxChunkLengthExceeded => CodecError::LineTooLong,
            AnyDelimiterCodecError::Io(e) => CodecError::Io(e),
        }
    }
}

/// Decodes inbound lines into [`Message`]s and encodes outbound ones with a
/// CRLF terminator. Blank lines are skipped.
pub struct LineCodec {
    lines: AnyDelimiterCodec,
}

impl LineCodec {
    pub fn new() -> Self {
        Self {
            lines: AnyDelimiterCodec::new_with_max_length(
                b"\n".to_vec(),
                b"\r\n".to_vec(),
                MAX_LINE_LENGTH,
            ),
        }
    }

    /// Decodes one framed chunk. Invalid UTF-8 becomes U+FFFD.
    fn decode_text(chunk: &Bytes) -> String {
        let chunk = chunk.strip_suffix(b"\r").unwrap_or(&chunk[..]);
        String::from_utf8_lossy(chunk).into_owned()
    }

    fn parse(line: &str) -> Result<Option<Message>, CodecError> {
        Message::parse(line).map(Some).map_err(CodecError::Parse)
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = Message;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Keep going past blank lines, otherwise a buffered record would
        // wait for the next socket read.
        while let Some(chunk) = self.lines.decode(src)? {
            let line = Self::decode_text(&chunk);
            if !line.trim().is_empty() {
                return Self::parse(&line);
            }
        }
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while let Some(chunk) = self.lines.decode_eof(src)? {
            let line = Self::decode_text(&chunk);
            if !line.trim().is_empty() {
                return Self::parse(&line);
            }
        }
        Ok(None)
    }
}

impl Encoder<Message> for LineCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let line = item.to_string();
        dst.reserve(line.len() + 2);
        dst.put_slice(line.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}
