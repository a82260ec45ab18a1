//! Transport errors

use thiserror::Error;

/// Failures that prevent a response from being obtained.
///
/// A response with a non-2xx status is not an error.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),

    #[error("failed to obtain access token from {url}: status {status}, body: {body}")]
    TokenRejected {
        url: String,
        status: u16,
        body: String,
    },

    #[error("token response from {url} has no access_token")]
    MissingAccessToken { url: String },
}
