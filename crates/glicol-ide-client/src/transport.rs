//! Stdio transport with LSP header framing.
//!
//! The protocol frames each message with a header block:
//! ```text
//! Content-Length: <length>\r\n
//! \r\n
//! <payload>
//! ```

use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::process::{ChildStdin, ChildStdout};

use crate::errors::TransportError;

/// Reads and writes length-prefixed frames over a byte stream pair.
///
/// Generic over the underlying reader and writer so tests can drive the
/// framing logic with in-memory buffers; production sessions use the
/// [`StdioTransport`] alias over the child process pipes.
pub struct FramedTransport<R: Read, W: Write> {
    reader: BufReader<R>,
    writer: BufWriter<W>,
}

/// Transport over a spawned server's stdin/stdout.
pub type StdioTransport = FramedTransport<ChildStdout, ChildStdin>;

impl<R: Read, W: Write> FramedTransport<R, W> {
    /// Creates a transport from a reader/writer pair.
    #[must_use]
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer: BufWriter::new(writer),
        }
    }

    /// Sends one framed message and flushes the stream.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Io` if writing to the stream fails.
    pub fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let header = format!("Content-Length: {}\r\n\r\n", payload.len());
        self.writer.write_all(header.as_bytes())?;
        self.writer.write_all(payload)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Receives one framed message, blocking until it is complete.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::MissingContentLength` when the header block
    /// carries no Content-Length, `TransportError::InvalidHeader` when the
    /// length does not parse, and `TransportError::Io` on stream failures
    /// (including EOF inside the header block).
    pub fn receive(&mut self) -> Result<Vec<u8>, TransportError> {
        let content_length = self.read_headers()?;
        let mut payload = vec![0u8; content_length];
        self.reader.read_exact(&mut payload)?;
        Ok(payload)
    }

    /// Consumes the transport and returns the raw written bytes (tests only).
    #[cfg(test)]
    pub(crate) fn into_writer(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|_| panic!("writer extraction failed"))
    }

    fn read_headers(&mut self) -> Result<usize, TransportError> {
        let mut content_length: Option<usize> = None;

        loop {
            let mut line = String::new();
            let bytes_read = self.reader.read_line(&mut line)?;
            if bytes_read == 0 {
                return Err(TransportError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed while reading headers",
                )));
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                // Empty line marks the end of the header block.
                break;
            }

            if let Some(value) = trimmed.strip_prefix("Content-Length: ") {
                content_length = Some(value.parse().map_err(|_| TransportError::InvalidHeader)?);
            }
            // Other headers (e.g. Content-Type) are ignored.
        }

        content_length.ok_or(TransportError::MissingContentLength)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;

    use super::*;

    type MemoryTransport = FramedTransport<Cursor<Vec<u8>>, Vec<u8>>;

    fn reading(input: &[u8]) -> MemoryTransport {
        FramedTransport::new(Cursor::new(input.to_vec()), Vec::new())
    }

    fn writing() -> MemoryTransport {
        FramedTransport::new(Cursor::new(Vec::new()), Vec::new())
    }

    fn written(transport: MemoryTransport) -> Vec<u8> {
        transport.into_writer()
    }

    #[rstest]
    fn frames_outgoing_messages() {
        let mut transport = writing();

        transport.send(b"test payload").expect("send failed");

        let bytes = written(transport);
        let text = String::from_utf8(bytes).expect("invalid utf8");
        assert_eq!(text, "Content-Length: 12\r\n\r\ntest payload");
    }

    #[rstest]
    fn frames_empty_messages() {
        let mut transport = writing();

        transport.send(b"").expect("send failed");

        assert_eq!(written(transport), b"Content-Length: 0\r\n\r\n");
    }

    #[rstest]
    fn reads_framed_message() {
        let mut transport = reading(b"Content-Length: 5\r\n\r\nhello");

        assert_eq!(transport.receive().expect("receive failed"), b"hello");
    }

    #[rstest]
    fn skips_unknown_headers() {
        let input = b"Content-Length: 4\r\nContent-Type: application/json\r\n\r\ntest";
        let mut transport = reading(input);

        assert_eq!(transport.receive().expect("receive failed"), b"test");
    }

    #[rstest]
    fn reads_consecutive_frames() {
        let mut transport = reading(b"Content-Length: 3\r\n\r\noneContent-Length: 3\r\n\r\ntwo");

        assert_eq!(transport.receive().expect("first frame"), b"one");
        assert_eq!(transport.receive().expect("second frame"), b"two");
    }

    #[rstest]
    fn rejects_missing_content_length() {
        let mut transport = reading(b"Content-Type: application/json\r\n\r\ntest");

        assert!(matches!(
            transport.receive(),
            Err(TransportError::MissingContentLength)
        ));
    }

    #[rstest]
    fn rejects_unparseable_content_length() {
        let mut transport = reading(b"Content-Length: twelve\r\n\r\ntest");

        assert!(matches!(
            transport.receive(),
            Err(TransportError::InvalidHeader)
        ));
    }

    #[rstest]
    fn reports_eof_inside_headers() {
        let mut transport = reading(b"Content-Length: 10");

        assert!(matches!(transport.receive(), Err(TransportError::Io(_))));
    }

    #[rstest]
    fn round_trips_json_payload() {
        let payload = br#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#;
        let mut sender = writing();
        sender.send(payload).expect("send failed");

        let mut receiver = reading(&written(sender));

        assert_eq!(receiver.receive().expect("receive failed"), payload);
    }
}
