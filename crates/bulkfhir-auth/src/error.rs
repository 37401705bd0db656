use thiserror::Error;

/// Errors that can occur while acquiring a bearer token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A network error occurred while talking to the authorization server.
    #[error("Network error: {0}")]
    Network(String),

    /// The authorization server returned a non-success status.
    #[error("Token request failed (HTTP {status}): {detail}")]
    HttpStatus { status: u16, detail: String },

    /// The SMART configuration document was missing or unusable.
    #[error("SMART configuration discovery failed: {0}")]
    Discovery(String),

    /// The client assertion could not be signed.
    #[error("Failed to sign client assertion: {0}")]
    Assertion(String),

    /// The private key could not be parsed.
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    /// The token response body did not have the expected shape.
    #[error("Malformed token response: {0}")]
    MalformedResponse(String),
}

/// Convenience result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;
