//! SMART Backend Services authentication for BulkFHIR.
//!
//! Bulk export servers authorize clients through the SMART Backend Services
//! flow: the client signs a short-lived JWT assertion with its registered
//! key, exchanges it at the server's token endpoint for a bearer token, and
//! presents that token on every export request.
//!
//! The rest of the toolkit only sees the [`TokenProvider`] trait ("get me a
//! valid bearer token"), so the signing scheme never leaks into the fetch
//! or reshape layers.
//!
//! # Example
//!
//! ```ignore
//! use bulkfhir_auth::{BackendServicesAuth, BackendServicesConfig, TokenProvider};
//!
//! let config = BackendServicesConfig::new(
//!     "https://bulk.example.com/fhir",
//!     "my-client-id",
//!     private_key_pem,
//!     "key-1",
//! )?;
//! let auth = BackendServicesAuth::new(config)?;
//! let token = auth.bearer_token().await?;
//! ```

pub mod config;
pub mod error;
pub mod token;

pub use config::BackendServicesConfig;
pub use error::AuthError;
pub use token::{BackendServicesAuth, StaticTokenProvider, TokenProvider};
