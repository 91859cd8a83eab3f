//! HTTP Client Abstraction
//!
//! Provides async HTTP operations with TLS, per-request timeouts, and
//! redirect tracking.

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// HTTP method types
///
/// The resolution core only issues read-style requests: `Get` for searches
/// and metadata documents, `Head` for cheap asset existence probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Head,
}

/// HTTP request builder
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            timeout: None,
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// HTTP response
///
/// `final_url` is the URL the response was ultimately served from, after any
/// redirects. Callers that probe redirecting asset hosts rely on it.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub final_url: String,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    /// Parse response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            BridgeError::OperationFailed(format!("JSON deserialization failed: {}", e))
        })
    }

    /// Get response body as UTF-8 string
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| BridgeError::OperationFailed(format!("Invalid UTF-8: {}", e)))
    }

    /// Check if response status is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if response status indicates a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if response status indicates a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// Async HTTP client trait
///
/// This trait abstracts HTTP operations to allow platform-specific
/// implementations. Implementations should handle:
/// - TLS certificate validation
/// - Connection pooling and keep-alive
/// - Redirect following, reporting the final URL on the response
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::{HttpClient, HttpRequest, HttpMethod};
///
/// async fn fetch_data(client: &dyn HttpClient) -> Result<String> {
///     let request = HttpRequest::new(HttpMethod::Get, "https://api.example.com/data");
///
///     let response = client.execute(request).await?;
///     response.text()
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Network connection fails
    /// - TLS validation fails
    /// - Request times out
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_request_builder() {
        let request = HttpRequest::new(HttpMethod::Get, "https://example.com")
            .header("User-Agent", "test")
            .timeout(Duration::from_secs(30));

        assert_eq!(request.url, "https://example.com");
        assert_eq!(request.headers.get("User-Agent"), Some(&"test".to_string()));
        assert_eq!(request.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_http_response_status_checks() {
        let response = HttpResponse {
            status: 200,
            final_url: "https://example.com".to_string(),
            headers: HashMap::new(),
            body: Bytes::from("test"),
        };

        assert!(response.is_success());
        assert!(!response.is_client_error());
        assert!(!response.is_server_error());
    }

    #[test]
    fn test_http_response_json() {
        let response = HttpResponse {
            status: 200,
            final_url: "https://example.com".to_string(),
            headers: HashMap::new(),
            body: Bytes::from(r#"{"count": 3}"#),
        };

        #[derive(serde::Deserialize)]
        struct Body {
            count: u32,
        }

        let body: Body = response.json().unwrap();
        assert_eq!(body.count, 3);
    }
}
