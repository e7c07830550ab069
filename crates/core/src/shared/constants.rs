use std::time::Duration;

/// Content type of the frame upload; the endpoint expects raw image bytes.
pub const INFERENCE_CONTENT_TYPE: &str = "application/octet-stream";

pub const DEFAULT_JPEG_QUALITY: u8 = 90;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Time allowed for the camera to deliver its first frame.
pub const DEFAULT_WARMUP: Duration = Duration::from_secs(2);

/// How long dropping a capture source waits for its thread before detaching it.
pub const CAPTURE_STOP_TIMEOUT: Duration = Duration::from_secs(2);

pub const DROWSINESS_ITERATION_DELAY: Duration = Duration::from_millis(250);
pub const CLASSIFICATION_ITERATION_DELAY: Duration = Duration::from_millis(10);

pub const DEFAULT_CONFIDENCE_FLOOR: f64 = 0.8;

/// Eye and pitch values reported when no face is found. Deliberately far
/// above any realistic threshold so the reading classifies as safe.
pub const NO_DETECTION_SENTINEL: f64 = 100.0;

/// Label reported when no prediction clears the confidence floor.
pub const NO_DETECTION_LABEL: &str = "none";

/// Body published by the legacy classification module in place of the
/// computed prediction.
pub const PLACEHOLDER_PAYLOAD: &str = "test";

/// Queued events older than this are dropped instead of sent.
pub const DEFAULT_MESSAGE_TIMEOUT: Duration = Duration::from_secs(10);

pub const PUBLISH_QUEUE_CAPACITY: usize = 64;

/// Sources with these extensions are served as a still image instead of a stream.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

pub const CONFIG_DIR_NAME: &str = "edgewatch";
pub const CONFIG_FILE_NAME: &str = "config.json";
