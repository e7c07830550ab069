use std::io::{self, Write};

use crate::publishing::domain::message_transport::{MessageTransport, TransportError};

/// Writes each event as one line. Stdout in production, any writer in tests.
pub struct StdoutTransport<W: Write + Send> {
    writer: W,
}

impl StdoutTransport<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> StdoutTransport<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> MessageTransport for StdoutTransport<W> {
    fn send(&mut self, body: &str) -> Result<(), TransportError> {
        writeln!(self.writer, "{body}")?;
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "stdout"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writes_one_line_per_message() {
        let mut transport = StdoutTransport::new(Vec::new());
        transport.send(r#"{"eye":0.3}"#).unwrap();
        transport.send("test").unwrap();
        let text = String::from_utf8(transport.into_inner()).unwrap();
        assert_eq!(text, "{\"eye\":0.3}\ntest\n");
    }

    #[test]
    fn test_write_error_is_io_error() {
        let mut transport = StdoutTransport::new(BrokenPipe);
        let err = transport.send("x").unwrap_err();
        assert!(matches!(err, TransportError::Io(_)));
    }
}
