use thiserror::Error;

/// The endpoint answered with JSON that does not have the expected shape.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(&'static str),
    #[error("response does not match schema: {0}")]
    Schema(#[from] serde_json::Error),
    #[error("{0} eye has zero width")]
    DegenerateEye(&'static str),
}
