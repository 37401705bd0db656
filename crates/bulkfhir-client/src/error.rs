use bulkfhir_auth::AuthError;
use bulkfhir_core::CoreError;
use thiserror::Error;

/// Errors that can occur while fetching bulk export data.
#[derive(Debug, Error)]
pub enum FetchError {
    /// A bearer token could not be obtained.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A transport-level failure while talking to the export server.
    #[error("Request failed: {0}")]
    Request(String),

    /// The server ended the export with a status other than 200 or 202.
    /// Terminal; the job is not polled again.
    #[error("Export failed (HTTP {status}): {detail}")]
    ExportFailed { status: u16, detail: String },

    /// The kickoff response was a 202 without a `Content-Location` header.
    #[error("Export accepted but no Content-Location header was returned")]
    MissingContentLocation,

    /// The completion manifest did not have the expected shape.
    #[error("Malformed export manifest: {0}")]
    MalformedManifest(String),

    /// A downloaded NDJSON body failed to decode.
    #[error(transparent)]
    Decode(#[from] CoreError),

    /// An error reading a local NDJSON file.
    #[error("Failed to read {path}: {detail}")]
    LocalFile { path: String, detail: String },
}

impl FetchError {
    pub(crate) fn request(e: reqwest::Error) -> Self {
        Self::Request(e.to_string())
    }
}

/// Convenience result type for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;
