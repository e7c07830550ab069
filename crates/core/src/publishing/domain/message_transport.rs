use thiserror::Error;

use crate::shared::headers::HeaderError;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid sink header: {0}")]
    Header(#[from] HeaderError),
    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },
    #[error("sink responded with HTTP {0}")]
    Status(u16),
}

/// Hands one serialized event to the downstream sink.
///
/// Owned and called only by the publisher thread, so implementations may
/// block. A returned error counts as a failed delivery; there are no retries.
pub trait MessageTransport: Send {
    fn send(&mut self, body: &str) -> Result<(), TransportError>;

    /// Short name for logs.
    fn name(&self) -> &str;
}
