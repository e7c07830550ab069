use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
use image::ExtendedColorType;

use crate::inference::domain::frame_encoder::{EncodeError, FrameEncoder};
use crate::shared::constants::DEFAULT_JPEG_QUALITY;
use crate::shared::frame::Frame;

/// Encodes frames as baseline JPEG using the `image` crate.
pub struct JpegEncoder {
    quality: u8,
}

impl JpegEncoder {
    /// `quality` is clamped to `1..=100`.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl FrameEncoder for JpegEncoder {
    fn encode(&self, frame: &Frame) -> Result<Vec<u8>, EncodeError> {
        let color = match frame.channels() {
            3 => ExtendedColorType::Rgb8,
            1 => ExtendedColorType::L8,
            other => return Err(EncodeError::UnsupportedChannels(other)),
        };

        let mut bytes = Vec::with_capacity(frame.data().len() / 8);
        let mut encoder = ImageJpegEncoder::new_with_quality(&mut bytes, self.quality);
        encoder.encode(frame.data(), frame.width(), frame.height(), color)?;
        Ok(bytes)
    }
}
