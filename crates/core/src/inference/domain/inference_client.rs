use thiserror::Error;

use crate::inference::domain::frame_encoder::EncodeError;
use crate::inference::domain::prediction_response::PredictionResponse;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("failed to encode frame: {0}")]
    Encode(#[from] EncodeError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("invalid request header: {0}")]
    Header(#[from] crate::shared::headers::HeaderError),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Sends one frame to the remote vision service and returns its parsed reply.
///
/// Each call is independent: a failure leaves nothing behind that could
/// affect the next call.
pub trait InferenceClient: Send {
    fn infer(&self, frame: &Frame) -> Result<PredictionResponse, InferenceError>;
}
