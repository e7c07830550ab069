use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::capture::domain::frame_source::{CaptureError, FrameSource};
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

/// Whether a video source names a still image rather than a stream.
pub fn is_still_image(source: &str) -> bool {
    Path::new(source)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Serves one decoded image on every read.
///
/// Lets the pipeline run against a live endpoint without a camera attached,
/// which is how deployments are smoke-tested.
pub struct StillImageSource {
    frame: Arc<Frame>,
    origin: Option<PathBuf>,
}

impl StillImageSource {
    pub fn open(path: &Path) -> Result<Self, CaptureError> {
        let img = image::open(path)
            .map_err(|e| CaptureError::Open {
                source_name: path.display().to_string(),
                reason: e.to_string(),
            })?
            .to_rgb8();
        let (width, height) = img.dimensions();
        log::debug!("Loaded still image {}x{} from {}", width, height, path.display());
        Ok(Self {
            frame: Arc::new(Frame::new(img.into_raw(), width, height, 3, 0)),
            origin: Some(path.to_path_buf()),
        })
    }

    pub fn from_frame(frame: Frame) -> Self {
        Self {
            frame: Arc::new(frame),
            origin: None,
        }
    }
}

impl FrameSource for StillImageSource {
    fn read_frame(&mut self) -> Result<Arc<Frame>, CaptureError> {
        Ok(self.frame.clone())
    }

    fn describe(&self) -> String {
        match &self.origin {
            Some(path) => format!("still image {}", path.display()),
            None => "in-memory frame".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 10) as u8, (y * 10) as u8, 77])
        });
        img.save(path).unwrap();
    }

    #[test]
    fn test_is_still_image() {
        assert!(is_still_image("/srv/bench/driver.JPG"));
        assert!(is_still_image("cab.png"));
        assert!(!is_still_image("/dev/video0"));
        assert!(!is_still_image("rtsp://cam/stream"));
        assert!(!is_still_image("/var/media/drive.mp4"));
    }

    #[test]
    fn test_open_decodes_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("driver.png");
        write_png(&path, 12, 8);

        let mut source = StillImageSource::open(&path).unwrap();
        let frame = source.read_frame().unwrap();
        assert_eq!(frame.width(), 12);
        assert_eq!(frame.height(), 8);
        assert_eq!(frame.channels(), 3);
        assert_eq!(&frame.data()[..3], &[0, 0, 77]);
    }

    #[test]
    fn test_every_read_returns_same_frame() {
        let mut source = StillImageSource::from_frame(Frame::new(vec![1; 3], 1, 1, 3, 0));
        let a = source.read_frame().unwrap();
        let b = source.read_frame().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_open_missing_file_is_open_error() {
        let result = StillImageSource::open(Path::new("/nonexistent/frame.jpg"));
        assert!(matches!(result, Err(CaptureError::Open { .. })));
    }

    #[test]
    fn test_describe_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cab.png");
        write_png(&path, 2, 2);
        let source = StillImageSource::open(&path).unwrap();
        assert!(source.describe().contains("cab.png"));
    }
}
