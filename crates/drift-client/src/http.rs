//! reqwest based transport

use crate::auth::Authenticator;
use crate::error::TransportError;
use crate::transport::{ApiRequest, ApiResponse, Transport};
use async_trait::async_trait;
use drift_config::Authentication;
use indexmap::IndexMap;
use reqwest::{Client, Method, Response};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP transport for one API with its own credentials
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    auth: Authenticator,
}

impl HttpTransport {
    pub fn new(auth: Option<&Authentication>) -> Result<Self, TransportError> {
        Self::with_timeout(auth, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        auth: Option<&Authentication>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            auth: Authenticator::from_config(auth),
        })
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.auth
    }

    async fn parse_response(response: Response, started: Instant) -> Result<ApiResponse, TransportError> {
        let status = response.status().as_u16();
        let mut headers: IndexMap<String, String> = IndexMap::new();
        for (name, value) in response.headers() {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            headers
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert(value);
        }

        let body = response.text().await?;
        Ok(ApiResponse {
            status,
            headers,
            body,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let method = Method::from_bytes(request.method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| TransportError::InvalidMethod(request.method.clone()))?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = self.auth.apply(&self.client, builder).await?;
        if let Some(body) = request.body.as_ref().filter(|b| !b.is_empty()) {
            builder = builder.body(body.clone());
        }

        debug!("Executing request: {} {}", request.method, request.url);
        let started = Instant::now();
        let response = builder.send().await?;
        let response = Self::parse_response(response, started).await?;

        if response.status == 401 {
            // Next call fetches a fresh token
            self.auth.invalidate().await;
        }
        debug!(
            "{} {} -> {} in {}ms",
            request.method, request.url, response.status, response.duration_ms
        );
        Ok(response)
    }

    fn auth_descriptor(&self) -> IndexMap<String, String> {
        self.auth.describe()
    }
}
