//! Fetcher configuration.

use std::time::Duration;

use url::Url;

use crate::error::{FetchError, Result};

/// Configuration for a bulk export fetch session.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Base URL of the FHIR server, without a trailing slash.
    pub base_url: Url,

    /// The export endpoint segment, e.g. `Patient` for a patient-level
    /// export or `Group/123` for a group export.
    pub export_endpoint: String,

    /// Delay to use when a 202 response carries no `Retry-After` header.
    pub default_retry_after: Duration,

    /// Lower bound applied to server-directed delays.
    pub min_retry_after: Duration,

    /// Upper bound applied to server-directed delays.
    pub max_retry_after: Duration,

    /// Per-request timeout. Raise this when the server produces large
    /// NDJSON files.
    pub request_timeout: Duration,
}

impl FetchConfig {
    /// Creates a configuration for the given server base URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| FetchError::Request(format!("invalid base URL: {e}")))?;

        Ok(Self {
            base_url,
            export_endpoint: "Patient".to_string(),
            default_retry_after: Duration::from_secs(2),
            min_retry_after: Duration::from_secs(1),
            max_retry_after: Duration::from_secs(120),
            request_timeout: Duration::from_secs(30),
        })
    }

    /// Sets the export endpoint segment.
    #[must_use]
    pub fn with_export_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.export_endpoint = endpoint.into();
        self
    }

    /// Sets the delay used when the server sends no `Retry-After`.
    #[must_use]
    pub fn with_default_retry_after(mut self, delay: Duration) -> Self {
        self.default_retry_after = delay;
        self
    }

    /// Sets the bounds applied to server-directed delays.
    #[must_use]
    pub fn with_retry_after_bounds(mut self, min: Duration, max: Duration) -> Self {
        self.min_retry_after = min;
        self.max_retry_after = max;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Clamps a server-directed delay to the configured bounds.
    pub(crate) fn clamp_retry_after(&self, delay: Duration) -> Duration {
        delay.clamp(self.min_retry_after, self.max_retry_after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FetchConfig::new("https://bulk.example.com/fhir/").unwrap();
        assert_eq!(config.base_url.as_str(), "https://bulk.example.com/fhir");
        assert_eq!(config.export_endpoint, "Patient");
        assert_eq!(config.default_retry_after, Duration::from_secs(2));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(FetchConfig::new("not a url").is_err());
    }

    #[test]
    fn test_retry_after_clamping() {
        let config = FetchConfig::new("https://bulk.example.com")
            .unwrap()
            .with_retry_after_bounds(Duration::from_secs(1), Duration::from_secs(10));

        assert_eq!(
            config.clamp_retry_after(Duration::ZERO),
            Duration::from_secs(1)
        );
        assert_eq!(
            config.clamp_retry_after(Duration::from_secs(3600)),
            Duration::from_secs(10)
        );
        assert_eq!(
            config.clamp_retry_after(Duration::from_secs(5)),
            Duration::from_secs(5)
        );
    }
}
