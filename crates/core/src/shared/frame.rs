use std::time::{Duration, Instant};

/// A single captured frame: contiguous pixel bytes in row-major order.
///
/// `channels` is 3 for RGB24 (what the capture sources produce) or 1 for
/// grayscale. `index` increases by one for every frame the source decodes,
/// so a repeated index means the caller received a stale frame.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: u64,
    captured_at: Instant,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: u64) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
            captured_at: Instant::now(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    /// Time since the frame was decoded.
    pub fn age(&self) -> Duration {
        self.captured_at.elapsed()
    }
}
