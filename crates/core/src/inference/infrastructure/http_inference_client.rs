use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

use crate::inference::domain::frame_encoder::FrameEncoder;
use crate::inference::domain::inference_client::{InferenceClient, InferenceError};
use crate::inference::domain::prediction_response::PredictionResponse;
use crate::shared::constants::INFERENCE_CONTENT_TYPE;
use crate::shared::frame::Frame;
use crate::shared::headers::header_map;

/// Longest error body kept in [`InferenceError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Posts encoded frames to a vision endpoint with a blocking `reqwest` client.
///
/// Configured headers are sent verbatim with every request; this is how
/// subscription keys reach the endpoint.
pub struct HttpInferenceClient {
    client: Client,
    endpoint: String,
    encoder: Box<dyn FrameEncoder>,
}

impl HttpInferenceClient {
    pub fn new(
        endpoint: &str,
        headers: &[(String, String)],
        timeout: Duration,
        encoder: Box<dyn FrameEncoder>,
    ) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .default_headers(header_map(headers)?)
            .timeout(timeout)
            .build()
            .map_err(InferenceError::Client)?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            encoder,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl InferenceClient for HttpInferenceClient {
    fn infer(&self, frame: &Frame) -> Result<PredictionResponse, InferenceError> {
        let body = self.encoder.encode(frame)?;
        log::trace!("Uploading frame {} ({} bytes)", frame.index(), body.len());

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, INFERENCE_CONTENT_TYPE)
            .body(body)
            .send()
            .map_err(|e| InferenceError::Request {
                url: self.endpoint.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            let mut text = response.text().unwrap_or_default();
            truncate_on_char_boundary(&mut text, MAX_ERROR_BODY);
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let bytes = response.bytes().map_err(InferenceError::Body)?;
        Ok(PredictionResponse::from_slice(&bytes)?)
    }
}

fn truncate_on_char_boundary(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::infrastructure::jpeg_encoder::JpegEncoder;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_frame() -> Frame {
        Frame::new(vec![90u8; 32 * 24 * 3], 32, 24, 3, 7)
    }

    fn infer_blocking(
        url: String,
        headers: Vec<(String, String)>,
        timeout: Duration,
    ) -> Result<PredictionResponse, InferenceError> {
        let client =
            HttpInferenceClient::new(&url, &headers, timeout, Box::new(JpegEncoder::default()))?;
        client.infer(&make_frame())
    }

    // reqwest's blocking client must not run on an async worker thread.
    async fn infer(
        url: String,
        headers: Vec<(String, String)>,
    ) -> Result<PredictionResponse, InferenceError> {
        tokio::task::spawn_blocking(move || infer_blocking(url, headers, Duration::from_secs(5)))
            .await
            .unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_posts_jpeg_as_octet_stream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/face/v1.0/detect"))
            .and(header("content-type", "application/octet-stream"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/face/v1.0/detect", server.uri());
        let response = infer(url, vec![]).await.unwrap();
        assert_eq!(response.body(), &json!([]));

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(&requests[0].body[..2], &[0xFF, 0xD8]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_passes_configured_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("Ocp-Apim-Subscription-Key", "k3y"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"predictions": []})))
            .expect(1)
            .mount(&server)
            .await;

        let headers = vec![("Ocp-Apim-Subscription-Key".to_string(), "k3y".to_string())];
        let response = infer(server.uri(), headers).await.unwrap();
        assert_eq!(response.body(), &json!({"predictions": []}));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Rate limit is exceeded."))
            .mount(&server)
            .await;

        let err = infer(server.uri(), vec![]).await.unwrap_err();
        match err {
            InferenceError::Status { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "Rate limit is exceeded.");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_malformed_body_is_json_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let err = infer(server.uri(), vec![]).await.unwrap_err();
        assert!(matches!(err, InferenceError::Json(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_slow_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let url = server.uri();
        let err = tokio::task::spawn_blocking(move || {
            infer_blocking(url, vec![], Duration::from_millis(50))
        })
        .await
        .unwrap()
        .unwrap_err();
        assert!(matches!(err, InferenceError::Request { .. }));
    }

    #[test]
    fn test_unreachable_endpoint_is_request_error() {
        let err = infer_blocking(
            "http://127.0.0.1:1/detect".to_string(),
            vec![],
            Duration::from_millis(500),
        )
        .unwrap_err();
        assert!(matches!(err, InferenceError::Request { .. }));
    }

    #[test]
    fn test_endpoint_is_kept_verbatim() {
        let client = HttpInferenceClient::new(
            "http://10.0.0.7:5000/face/v1.0/detect?returnFaceLandmarks=true",
            &[],
            Duration::from_secs(1),
            Box::new(JpegEncoder::default()),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "http://10.0.0.7:5000/face/v1.0/detect?returnFaceLandmarks=true"
        );
    }

    #[test]
    fn test_invalid_header_rejected_at_construction() {
        let result = HttpInferenceClient::new(
            "http://localhost/detect",
            &[("bad header".to_string(), "v".to_string())],
            Duration::from_secs(1),
            Box::new(JpegEncoder::default()),
        );
        assert!(matches!(result, Err(InferenceError::Header(_))));
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        let mut text = "ééé".to_string(); // 2 bytes per char
        truncate_on_char_boundary(&mut text, 3);
        assert_eq!(text, "é");
    }
}
