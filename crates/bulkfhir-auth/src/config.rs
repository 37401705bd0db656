//! Configuration for the SMART Backend Services flow.

use std::time::Duration;

use url::Url;

use crate::error::AuthError;

/// Configuration for [`crate::BackendServicesAuth`].
#[derive(Debug, Clone)]
pub struct BackendServicesConfig {
    /// FHIR server base URL; discovery reads
    /// `{base}/.well-known/smart-configuration`.
    pub base_url: Url,

    /// Registered client identifier, used as both `iss` and `sub`.
    pub client_id: String,

    /// RSA private key in PEM form for signing client assertions.
    pub private_key_pem: String,

    /// Key identifier placed in the assertion's `kid` header.
    pub key_id: String,

    /// OAuth scope to request (default: `system/*.read`).
    pub scope: String,

    /// Lifetime of each signed assertion (default: 5 minutes).
    pub assertion_lifetime: Duration,

    /// A cached token within this margin of its deadline is refreshed
    /// rather than reused (default: 60 seconds).
    pub expiry_margin: Duration,

    /// HTTP request timeout (default: 10 seconds).
    pub request_timeout: Duration,

    /// Explicit token endpoint, bypassing discovery.
    pub token_endpoint: Option<Url>,
}

impl BackendServicesConfig {
    /// Creates a configuration with default flow parameters.
    pub fn new(
        base_url: &str,
        client_id: impl Into<String>,
        private_key_pem: impl Into<String>,
        key_id: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| AuthError::Discovery(format!("invalid base URL: {e}")))?;

        Ok(Self {
            base_url,
            client_id: client_id.into(),
            private_key_pem: private_key_pem.into(),
            key_id: key_id.into(),
            scope: "system/*.read".to_string(),
            assertion_lifetime: Duration::from_secs(300),
            expiry_margin: Duration::from_secs(60),
            request_timeout: Duration::from_secs(10),
            token_endpoint: None,
        })
    }

    /// Sets the OAuth scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Sets the assertion lifetime.
    #[must_use]
    pub fn with_assertion_lifetime(mut self, lifetime: Duration) -> Self {
        self.assertion_lifetime = lifetime;
        self
    }

    /// Sets the token expiry margin.
    #[must_use]
    pub fn with_expiry_margin(mut self, margin: Duration) -> Self {
        self.expiry_margin = margin;
        self
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets an explicit token endpoint, skipping discovery.
    #[must_use]
    pub fn with_token_endpoint(mut self, endpoint: Url) -> Self {
        self.token_endpoint = Some(endpoint);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config =
            BackendServicesConfig::new("https://bulk.example.com/fhir", "client-1", "PEM", "key-1")
                .unwrap();
        assert_eq!(config.scope, "system/*.read");
        assert_eq!(config.assertion_lifetime, Duration::from_secs(300));
        assert_eq!(config.expiry_margin, Duration::from_secs(60));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(config.token_endpoint.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config =
            BackendServicesConfig::new("https://bulk.example.com/fhir", "client-1", "PEM", "key-1")
                .unwrap()
                .with_scope("system/Patient.read")
                .with_assertion_lifetime(Duration::from_secs(120))
                .with_expiry_margin(Duration::from_secs(30))
                .with_request_timeout(Duration::from_secs(5));

        assert_eq!(config.scope, "system/Patient.read");
        assert_eq!(config.assertion_lifetime, Duration::from_secs(120));
        assert_eq!(config.expiry_margin, Duration::from_secs(30));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config =
            BackendServicesConfig::new("https://bulk.example.com/fhir/", "c", "PEM", "k").unwrap();
        assert_eq!(config.base_url.as_str(), "https://bulk.example.com/fhir");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = BackendServicesConfig::new("not a url", "c", "PEM", "k");
        assert!(matches!(result, Err(AuthError::Discovery(_))));
    }
}
