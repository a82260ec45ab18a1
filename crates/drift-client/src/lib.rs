//! HTTP transport for apidrift
//!
//! [`Transport`] is the seam the runner calls through; [`HttpTransport`] is
//! the reqwest implementation. Each transport authenticates on its own,
//! either with basic auth or with an OAuth client-credentials token kept in
//! a per-client [`TokenHolder`].

mod auth;
mod error;
mod http;
mod transport;

pub use auth::{AccessToken, Authenticator, TokenHolder, DEFAULT_TOKEN_LIFETIME, REFRESH_MARGIN};
pub use error::TransportError;
pub use http::{HttpTransport, DEFAULT_TIMEOUT};
pub use transport::{ApiRequest, ApiResponse, Transport};
