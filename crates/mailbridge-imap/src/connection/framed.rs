//! Framed I/O for IMAP protocol.
//!
//! IMAP responses are CRLF-terminated lines that may embed `{n}` literals.
//! A literal's payload is raw bytes and may contain CRLF itself, so it is
//! read by length rather than by line.

#![allow(clippy::missing_errors_doc)]

use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::{Error, Result};

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Maximum line length to prevent memory exhaustion.
const MAX_LINE_LENGTH: usize = 1024 * 1024; // 1 MB

/// Maximum literal size to prevent memory exhaustion.
const MAX_LITERAL_SIZE: usize = 100 * 1024 * 1024; // 100 MB

/// Framed connection for IMAP protocol.
///
/// Handles line-based reading with literal support and buffered writing.
pub struct FramedStream<S> {
    reader: BufReader<S>,
    write_buffer: BytesMut,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new framed stream.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream),
            write_buffer: BytesMut::with_capacity(DEFAULT_BUFFER_SIZE),
        }
    }

    /// Reads one complete response, including every embedded literal.
    pub async fn read_response(&mut self) -> Result<Vec<u8>> {
        let mut response = Vec::new();

        loop {
            let line = self.read_line().await?;
            response.extend_from_slice(&line);

            let Some(literal_len) = literal_length(&line) else {
                break;
            };
            if literal_len > MAX_LITERAL_SIZE {
                return Err(Error::Protocol(format!(
                    "literal too large: {literal_len} bytes (max {MAX_LITERAL_SIZE})"
                )));
            }

            let start = response.len();
            response.resize(start + literal_len, 0);
            self.reader.read_exact(&mut response[start..]).await?;
        }

        Ok(response)
    }

    /// Reads a single CRLF-terminated line, terminator included.
    async fn read_line(&mut self) -> Result<Vec<u8>> {
        let mut line = Vec::new();

        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed",
                )));
            }

            if let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                line.extend_from_slice(&buf[..=pos]);
                self.reader.consume(pos + 1);
                return Ok(line);
            }

            let len = buf.len();
            line.extend_from_slice(buf);
            self.reader.consume(len);

            if line.len() > MAX_LINE_LENGTH {
                return Err(Error::Protocol("line too long".to_string()));
            }
        }
    }

    /// Writes a serialized command and flushes it.
    pub async fn write_command(&mut self, data: &[u8]) -> Result<()> {
        self.write_buffer.clear();
        self.write_buffer.extend_from_slice(data);

        let stream = self.reader.get_mut();
        stream.write_all(&self.write_buffer).await?;
        stream.flush().await?;

        Ok(())
    }
}

/// Returns the announced size if `line` ends with `{n}` or `{n+}`.
fn literal_length(line: &[u8]) -> Option<usize> {
    let line = line.strip_suffix(b"\n")?;
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let line = line.strip_suffix(b"}")?;
    let line = line.strip_suffix(b"+").unwrap_or(line);

    let open = line.iter().rposition(|&b| b == b'{')?;
    let digits = &line[open + 1..];
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// Collects responses until the completion for one tag arrives.
pub struct ResponseAccumulator {
    tag: String,
    responses: Vec<Vec<u8>>,
}

impl ResponseAccumulator {
    /// Creates a new response accumulator for the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            responses: Vec::new(),
        }
    }

    /// Reads responses until a tagged response matching our tag is found.
    ///
    /// An untagged `BYE` that the server follows by closing the socket ends
    /// the read early with the responses gathered so far.
    pub async fn read_until_tagged<S>(
        &mut self,
        framed: &mut FramedStream<S>,
    ) -> Result<Vec<Vec<u8>>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        loop {
            let response = match framed.read_response().await {
                Ok(response) => response,
                Err(Error::Io(err))
                    if err.kind() == io::ErrorKind::UnexpectedEof && self.saw_bye() =>
                {
                    break;
                }
                Err(err) => return Err(err),
            };

            let is_tagged = response
                .strip_prefix(self.tag.as_bytes())
                .is_some_and(|rest| rest.first() == Some(&b' '));

            self.responses.push(response);

            if is_tagged {
                break;
            }
        }

        Ok(std::mem::take(&mut self.responses))
    }

    fn saw_bye(&self) -> bool {
        self.responses.iter().any(|r| {
            r.get(..6)
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(b"* BYE "))
        })
    }
}
