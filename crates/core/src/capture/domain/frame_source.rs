use std::sync::Arc;

use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("failed to open video source '{source_name}': {reason}")]
    Open { source_name: String, reason: String },
    #[error("video source unavailable: {0}")]
    Unavailable(String),
    #[error("no frame captured yet")]
    NoFrame,
}

/// Pull-based access to the newest camera frame.
///
/// `read_frame` returns immediately with the most recent frame, which may be
/// the same one returned by the previous call when the caller outpaces the
/// camera. Frames the caller was too slow to see are dropped, never queued.
pub trait FrameSource: Send {
    fn read_frame(&mut self) -> Result<Arc<Frame>, CaptureError>;

    /// Human-readable name for logs.
    fn describe(&self) -> String;
}
