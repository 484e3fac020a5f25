//! JSON-over-HTTP backend shared by the retail tools
//!
//! Every shipped tool POSTs its validated arguments to a configured URL and
//! hands the JSON body back to the model.

use crate::error::{AssistantError, Result};
use serde_json::Value;
use std::time::Duration;

/// A single JSON POST endpoint
#[derive(Debug, Clone)]
pub struct JsonEndpoint {
    client: reqwest::Client,
    url: String,
}

impl JsonEndpoint {
    /// Create an endpoint client
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL requests are posted to
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("retail-assistant/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AssistantError::Tool(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Target URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `body` and return the parsed JSON response
    ///
    /// # Errors
    ///
    /// Returns `AssistantError::Tool` when the request fails, the status is
    /// not 2xx, or the body is not JSON
    pub async fn post(&self, body: &Value) -> Result<Value> {
        let response = self
            .client
            .post(&self.url)
            .json(body)
            .send()
            .await
            .map_err(|e| AssistantError::Tool(format!("Request to {} failed: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AssistantError::Tool(format!(
                "{} returned {}: {}",
                self.url, status, error_text
            ))
            .into());
        }

        response.json::<Value>().await.map_err(|e| {
            AssistantError::Tool(format!("Invalid JSON from {}: {}", self.url, e)).into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_post_returns_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(body_json(json!({"q": 1})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint =
            JsonEndpoint::new(format!("{}/echo", server.uri()), Duration::from_secs(5)).unwrap();
        let body = endpoint.post(&json!({"q": 1})).await.unwrap();
        assert_eq!(body, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_post_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let endpoint = JsonEndpoint::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = endpoint.post(&json!({})).await.unwrap_err();
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("maintenance"));
    }

    #[tokio::test]
    async fn test_post_invalid_json_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let endpoint = JsonEndpoint::new(server.uri(), Duration::from_secs(5)).unwrap();
        assert!(endpoint.post(&json!({})).await.is_err());
    }
}
