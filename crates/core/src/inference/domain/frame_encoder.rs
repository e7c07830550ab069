use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("unsupported channel count {0}")]
    UnsupportedChannels(u8),
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Compresses a frame into the byte format uploaded to the endpoint.
pub trait FrameEncoder: Send {
    fn encode(&self, frame: &Frame) -> Result<Vec<u8>, EncodeError>;
}
