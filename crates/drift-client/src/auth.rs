//! Request authentication
//!
//! Each [`HttpTransport`](crate::HttpTransport) owns its own [`Authenticator`];
//! nothing is shared between clients.

use crate::error::TransportError;
use drift_config::Authentication;
use indexmap::IndexMap;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Lifetime assumed when the token endpoint does not send `expires_in`
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Tokens are refreshed this long before they expire
pub const REFRESH_MARGIN: Duration = Duration::from_secs(30);

/// A bearer token and the instant it stops being valid
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: Instant,
}

/// Holds the current access token of one client
#[derive(Debug, Default)]
pub struct TokenHolder {
    token: Option<AccessToken>,
}

impl TokenHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when there is no token or it expires within [`REFRESH_MARGIN`]
    pub fn is_expired(&self, now: Instant) -> bool {
        match &self.token {
            None => true,
            Some(token) => now + REFRESH_MARGIN >= token.expires_at,
        }
    }

    /// The token if it is still usable at `now`
    pub fn current(&self, now: Instant) -> Option<&str> {
        if self.is_expired(now) {
            return None;
        }
        self.token.as_ref().map(|t| t.value.as_str())
    }

    pub fn store(&mut self, value: String, lifetime: Duration, now: Instant) {
        self.token = Some(AccessToken {
            value,
            expires_at: now + lifetime,
        });
    }

    pub fn clear(&mut self) {
        self.token = None;
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// How requests of one client are authenticated
#[derive(Debug)]
pub enum Authenticator {
    None,
    Basic {
        username: String,
        password: String,
    },
    OAuth {
        token_url: String,
        client_id: Option<String>,
        client_secret: Option<String>,
        holder: Mutex<TokenHolder>,
    },
}

impl Authenticator {
    /// OAuth when a token URL is set, basic auth when only credentials are
    pub fn from_config(auth: Option<&Authentication>) -> Self {
        let Some(auth) = auth else {
            return Authenticator::None;
        };

        match (&auth.token_url, &auth.client_id, &auth.client_secret) {
            (Some(token_url), client_id, client_secret) if !token_url.trim().is_empty() => {
                Authenticator::OAuth {
                    token_url: token_url.clone(),
                    client_id: client_id.clone(),
                    client_secret: client_secret.clone(),
                    holder: Mutex::new(TokenHolder::new()),
                }
            }
            (_, Some(username), Some(password)) => Authenticator::Basic {
                username: username.clone(),
                password: password.clone(),
            },
            _ => Authenticator::None,
        }
    }

    /// Descriptor recorded with captured requests, never includes the secret
    pub fn describe(&self) -> IndexMap<String, String> {
        let mut descriptor = IndexMap::new();
        match self {
            Authenticator::None => {}
            Authenticator::Basic { username, .. } => {
                descriptor.insert("type".to_string(), "basic".to_string());
                descriptor.insert("username".to_string(), username.clone());
            }
            Authenticator::OAuth { client_id, .. } => {
                descriptor.insert("type".to_string(), "oauth2".to_string());
                if let Some(client_id) = client_id {
                    descriptor.insert("username".to_string(), client_id.clone());
                }
            }
        }
        descriptor
    }

    /// Add credentials to a request, fetching a token first if needed
    pub async fn apply(
        &self,
        client: &Client,
        request: RequestBuilder,
    ) -> Result<RequestBuilder, TransportError> {
        match self {
            Authenticator::None => Ok(request),
            Authenticator::Basic { username, password } => {
                Ok(request.basic_auth(username, Some(password)))
            }
            Authenticator::OAuth {
                token_url,
                client_id,
                client_secret,
                holder,
            } => {
                // Held across the fetch so concurrent callers wait for one refresh
                let mut holder = holder.lock().await;
                if let Some(token) = holder.current(Instant::now()) {
                    return Ok(request.bearer_auth(token));
                }

                let (token, lifetime) = fetch_token(
                    client,
                    token_url,
                    client_id.as_deref(),
                    client_secret.as_deref(),
                )
                .await?;
                let request = request.bearer_auth(&token);
                holder.store(token, lifetime, Instant::now());
                Ok(request)
            }
        }
    }

    /// Drop a cached token, e.g. after the API answered 401
    pub async fn invalidate(&self) {
        if let Authenticator::OAuth { holder, .. } = self {
            holder.lock().await.clear();
        }
    }
}

async fn fetch_token(
    client: &Client,
    token_url: &str,
    client_id: Option<&str>,
    client_secret: Option<&str>,
) -> Result<(String, Duration), TransportError> {
    let mut form = vec![("grant_type", "client_credentials")];
    if let Some(id) = client_id {
        form.push(("client_id", id));
    }
    if let Some(secret) = client_secret {
        form.push(("client_secret", secret));
    }

    info!("Requesting new access token from {}", token_url);
    let response = client.post(token_url).form(&form).send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(TransportError::TokenRejected {
            url: token_url.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    let parsed: TokenResponse =
        serde_json::from_str(&body).map_err(|_| TransportError::MissingAccessToken {
            url: token_url.to_string(),
        })?;
    let token = parsed
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| TransportError::MissingAccessToken {
            url: token_url.to_string(),
        })?;
    let lifetime = parsed
        .expires_in
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TOKEN_LIFETIME);

    debug!("Obtained access token valid for {:?}", lifetime);
    Ok((token, lifetime))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(token_url: Option<&str>, id: Option<&str>, secret: Option<&str>) -> Authentication {
        Authentication {
            token_url: token_url.map(String::from),
            client_id: id.map(String::from),
            client_secret: secret.map(String::from),
        }
    }

    #[test]
    fn test_empty_holder_is_expired() {
        let holder = TokenHolder::new();
        assert!(holder.is_expired(Instant::now()));
        assert!(holder.current(Instant::now()).is_none());
    }

    #[test]
    fn test_token_refreshes_before_expiry() {
        let now = Instant::now();
        let mut holder = TokenHolder::new();
        holder.store("abc".to_string(), Duration::from_secs(3600), now);

        assert!(!holder.is_expired(now));
        assert_eq!(holder.current(now), Some("abc"));
        assert!(!holder.is_expired(now + Duration::from_secs(3569)));
        assert!(holder.is_expired(now + Duration::from_secs(3570)));
        assert!(holder.is_expired(now + Duration::from_secs(4000)));
    }

    #[test]
    fn test_short_lived_token_is_always_expired() {
        let now = Instant::now();
        let mut holder = TokenHolder::new();
        holder.store("abc".to_string(), Duration::from_secs(10), now);
        assert!(holder.is_expired(now));
    }

    #[test]
    fn test_authenticator_selection() {
        assert!(matches!(Authenticator::from_config(None), Authenticator::None));
        assert!(matches!(
            Authenticator::from_config(Some(&auth(None, Some("u"), Some("p")))),
            Authenticator::Basic { .. }
        ));
        assert!(matches!(
            Authenticator::from_config(Some(&auth(Some("http://t"), Some("u"), Some("p")))),
            Authenticator::OAuth { .. }
        ));
        assert!(matches!(
            Authenticator::from_config(Some(&auth(None, Some("u"), None))),
            Authenticator::None
        ));
        assert!(matches!(
            Authenticator::from_config(Some(&auth(Some(" "), Some("u"), Some("p")))),
            Authenticator::Basic { .. }
        ));
    }

    #[test]
    fn test_describe_never_contains_secret() {
        let basic = Authenticator::from_config(Some(&auth(None, Some("svc"), Some("hunter2"))));
        let descriptor = basic.describe();
        assert_eq!(descriptor["type"], "basic");
        assert_eq!(descriptor["username"], "svc");
        assert!(!descriptor.values().any(|v| v == "hunter2"));

        let oauth = Authenticator::from_config(Some(&auth(Some("http://t"), Some("svc"), Some("x"))));
        assert_eq!(oauth.describe()["type"], "oauth2");

        assert!(Authenticator::None.describe().is_empty());
    }
}
