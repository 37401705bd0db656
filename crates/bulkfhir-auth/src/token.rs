//! Bearer token acquisition and caching.
//!
//! [`BackendServicesAuth`] implements the full SMART Backend Services
//! exchange; [`StaticTokenProvider`] wraps a pre-acquired token for servers
//! where the caller handles auth out of band.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use url::Url;

use crate::config::BackendServicesConfig;
use crate::error::{AuthError, Result};

/// Produces a valid bearer token on demand.
///
/// Implementations are expected to be cheap to call repeatedly; the poller
/// asks for a token before every status request.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a bearer token valid for at least the near future.
    async fn bearer_token(&self) -> Result<String>;
}

/// A fixed, pre-acquired bearer token.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Wraps an existing token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// Claims of the signed client assertion.
#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    aud: &'a str,
    exp: u64,
}

/// Token endpoint response body.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// A cached token with its refresh deadline.
struct CachedToken {
    token: String,
    deadline: Instant,
}

/// Mutable provider state behind one lock: the discovered token endpoint
/// and the currently cached token.
#[derive(Default)]
struct AuthState {
    token_endpoint: Option<Url>,
    cached: Option<CachedToken>,
}

/// SMART Backend Services token provider.
///
/// Discovers the token endpoint from the server's
/// `.well-known/smart-configuration`, signs an RS384 client assertion with
/// the configured key, and exchanges it via the `client_credentials` grant.
/// Tokens are cached and refreshed proactively once they come within the
/// configured expiry margin of their deadline.
pub struct BackendServicesAuth {
    config: BackendServicesConfig,
    encoding_key: EncodingKey,
    http: reqwest::Client,
    state: Mutex<AuthState>,
}

impl BackendServicesAuth {
    /// Creates a provider, parsing the signing key eagerly so a bad key
    /// fails at construction rather than on the first poll.
    pub fn new(config: BackendServicesConfig) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(config.private_key_pem.as_bytes())
            .map_err(|e| AuthError::InvalidKey(e.to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AuthError::Network(e.to_string()))?;

        Ok(Self {
            config,
            encoding_key,
            http,
            state: Mutex::new(AuthState::default()),
        })
    }

    /// Resolves the token endpoint, discovering it on first use.
    async fn token_endpoint(&self, state: &mut AuthState) -> Result<Url> {
        if let Some(endpoint) = &self.config.token_endpoint {
            return Ok(endpoint.clone());
        }
        if let Some(endpoint) = &state.token_endpoint {
            return Ok(endpoint.clone());
        }

        // Url prints a root path as a trailing slash; trim it so the join
        // never produces "//".
        let url = format!(
            "{}/.well-known/smart-configuration",
            self.config.base_url.as_str().trim_end_matches('/')
        );
        tracing::debug!(url = %url, "Discovering SMART configuration");

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::Discovery(format!(
                "HTTP {} from {url}",
                response.status().as_u16()
            )));
        }

        let document: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AuthError::Discovery(e.to_string()))?;

        let endpoint = document
            .get("token_endpoint")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                AuthError::Discovery("smart-configuration has no token_endpoint".to_string())
            })?;

        let endpoint = Url::parse(endpoint)
            .map_err(|e| AuthError::Discovery(format!("invalid token_endpoint: {e}")))?;

        state.token_endpoint = Some(endpoint.clone());
        Ok(endpoint)
    }

    /// Builds and signs the client assertion JWT.
    fn sign_assertion(&self, audience: &str) -> Result<String> {
        let exp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AuthError::Assertion(e.to_string()))?
            .as_secs()
            + self.config.assertion_lifetime.as_secs();

        let claims = AssertionClaims {
            iss: &self.config.client_id,
            sub: &self.config.client_id,
            aud: audience,
            exp,
        };

        let mut header = Header::new(Algorithm::RS384);
        header.kid = Some(self.config.key_id.clone());

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| AuthError::Assertion(e.to_string()))
    }

    /// Requests a fresh token from the endpoint.
    async fn request_token(&self, endpoint: &Url) -> Result<TokenResponse> {
        let assertion = self.sign_assertion(endpoint.as_str())?;

        let response = self
            .http
            .post(endpoint.clone())
            .form(&[
                ("scope", self.config.scope.as_str()),
                ("grant_type", "client_credentials"),
                (
                    "client_assertion_type",
                    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer",
                ),
                ("client_assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AuthError::HttpStatus {
                status: status.as_u16(),
                detail,
            });
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl TokenProvider for BackendServicesAuth {
    async fn bearer_token(&self) -> Result<String> {
        let mut state = self.state.lock().await;

        if let Some(cached) = &state.cached {
            if Instant::now() + self.config.expiry_margin < cached.deadline {
                return Ok(cached.token.clone());
            }
        }

        let endpoint = self.token_endpoint(&mut state).await?;
        let response = self.request_token(&endpoint).await?;

        tracing::debug!(
            expires_in = response.expires_in,
            "Obtained fresh bearer token"
        );

        let deadline = Instant::now() + Duration::from_secs(response.expires_in);
        let token = response.access_token.clone();
        state.cached = Some(CachedToken {
            token: response.access_token,
            deadline,
        });

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // 2048-bit RSA key generated for tests only.
    const TEST_KEY_PEM: &str = include_str!("../testdata/test_signing_key.pem");

    fn test_config(server_uri: &str) -> BackendServicesConfig {
        BackendServicesConfig::new(server_uri, "test-client", TEST_KEY_PEM, "key-1").unwrap()
    }

    #[tokio::test]
    async fn test_static_provider_returns_fixed_token() {
        let provider = StaticTokenProvider::new("abc123");
        assert_eq!(provider.bearer_token().await.unwrap(), "abc123");
        assert_eq!(provider.bearer_token().await.unwrap(), "abc123");
    }

    #[test]
    fn test_invalid_key_fails_at_construction() {
        let config =
            BackendServicesConfig::new("https://bulk.example.com", "c", "not a key", "k").unwrap();
        let result = BackendServicesAuth::new(config);
        assert!(matches!(result, Err(AuthError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_discovery_and_token_exchange() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/.well-known/smart-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_endpoint": format!("{}/token", server.uri())
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_assertion="))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "token-1",
                "expires_in": 300
            })))
            .expect(1)
            .mount(&server)
            .await;

        let auth = BackendServicesAuth::new(test_config(&server.uri())).unwrap();

        // Second call must be served from cache: the token mock expects
        // exactly one hit.
        assert_eq!(auth.bearer_token().await.unwrap(), "token-1");
        assert_eq!(auth.bearer_token().await.unwrap(), "token-1");
    }

    #[tokio::test]
    async fn test_token_within_margin_is_refreshed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/.well-known/smart-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_endpoint": format!("{}/token", server.uri())
            })))
            .mount(&server)
            .await;

        // expires_in shorter than the expiry margin, so every call refreshes.
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "short-lived",
                "expires_in": 5
            })))
            .expect(2)
            .mount(&server)
            .await;

        let auth = BackendServicesAuth::new(test_config(&server.uri())).unwrap();
        auth.bearer_token().await.unwrap();
        auth.bearer_token().await.unwrap();
    }

    #[tokio::test]
    async fn test_token_endpoint_error_surfaces_detail() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/.well-known/smart-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_endpoint": format!("{}/token", server.uri())
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
            .mount(&server)
            .await;

        let auth = BackendServicesAuth::new(test_config(&server.uri())).unwrap();
        let err = auth.bearer_token().await.unwrap_err();
        match err {
            AuthError::HttpStatus { status, detail } => {
                assert_eq!(status, 401);
                assert_eq!(detail, "invalid_client");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_token_endpoint_in_discovery() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/.well-known/smart-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "authorization_endpoint": "https://elsewhere.example.com/authorize"
            })))
            .mount(&server)
            .await;

        let auth = BackendServicesAuth::new(test_config(&server.uri())).unwrap();
        let err = auth.bearer_token().await.unwrap_err();
        assert!(matches!(err, AuthError::Discovery(_)));
    }

    #[tokio::test]
    async fn test_explicit_token_endpoint_skips_discovery() {
        let server = MockServer::start().await;

        // No smart-configuration mock mounted: discovery would 404.
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "direct",
                "expires_in": 300
            })))
            .mount(&server)
            .await;

        let config = test_config(&server.uri())
            .with_token_endpoint(Url::parse(&format!("{}/token", server.uri())).unwrap());
        let auth = BackendServicesAuth::new(config).unwrap();
        assert_eq!(auth.bearer_token().await.unwrap(), "direct");
    }
}
