//! Request/response values and the transport seam

use crate::error::TransportError;
use async_trait::async_trait;
use indexmap::IndexMap;

/// One outgoing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub url: String,
    pub method: String,
    pub headers: IndexMap<String, String>,
    /// Omitted when `None` or empty
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            headers: IndexMap::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Response of a call, whatever its status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    /// Lowercase names; repeated headers joined with `, `
    pub headers: IndexMap<String, String>,
    pub body: String,
    pub duration_ms: u64,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Sends requests to one API
#[async_trait]
pub trait Transport: Send + Sync {
    /// Only failures to get any response are errors
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;

    /// Authentication descriptor recorded with captured requests
    fn auth_descriptor(&self) -> IndexMap<String, String> {
        IndexMap::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::new("POST", "http://host/api")
            .header("Content-Type", "application/json")
            .body("{}");
        assert_eq!(request.headers["Content-Type"], "application/json");
        assert_eq!(request.body.as_deref(), Some("{}"));
    }

    #[test]
    fn test_response_helpers() {
        let mut headers = IndexMap::new();
        headers.insert("content-type".to_string(), "text/xml".to_string());
        let response = ApiResponse {
            status: 500,
            headers,
            body: String::new(),
            duration_ms: 3,
        };
        assert!(!response.is_success());
        assert_eq!(response.header("Content-Type"), Some("text/xml"));
        assert_eq!(response.header("SOAPAction"), None);
    }
}
