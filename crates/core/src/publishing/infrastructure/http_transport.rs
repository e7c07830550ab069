use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

use crate::publishing::domain::message_transport::{MessageTransport, TransportError};
use crate::shared::headers::header_map;

/// POSTs each event to an upstream hub or webhook.
pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    pub fn new(
        url: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .default_headers(header_map(headers)?)
            .timeout(timeout)
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl MessageTransport for HttpTransport {
    fn send(&mut self, body: &str) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .map_err(|e| TransportError::Request {
                url: self.url.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn send(
        url: String,
        headers: Vec<(String, String)>,
        body: &'static str,
    ) -> Result<(), TransportError> {
        tokio::task::spawn_blocking(move || {
            let mut transport = HttpTransport::new(&url, &headers, Duration::from_secs(5))?;
            transport.send(body)
        })
        .await
        .unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_posts_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/events"))
            .and(header("content-type", "application/json"))
            .and(body_string(r#"{"status":"safe"}"#))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/events", server.uri());
        send(url, vec![], r#"{"status":"safe"}"#).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_sends_configured_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "SharedAccessSignature sr=hub"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let headers = vec![(
            "Authorization".to_string(),
            "SharedAccessSignature sr=hub".to_string(),
        )];
        send(server.uri(), headers, "test").await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rejected_event_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = send(server.uri(), vec![], "{}").await.unwrap_err();
        assert!(matches!(err, TransportError::Status(503)));
    }

    #[test]
    fn test_unreachable_sink_is_request_error() {
        let mut transport =
            HttpTransport::new("http://127.0.0.1:1/events", &[], Duration::from_millis(500))
                .unwrap();
        let err = transport.send("{}").unwrap_err();
        assert!(matches!(err, TransportError::Request { .. }));
    }
}
