//! Bulk export client for BulkFHIR.
//!
//! Implements the asynchronous bulk-data export protocol end to end:
//! kickoff, server-paced status polling, NDJSON downloads, and the
//! [`BulkDataFetcher`] facade that ties the pipeline to the reshape layer.
//!
//! # Example
//!
//! ```ignore
//! use bulkfhir_client::{BulkDataFetcher, FetchConfig};
//!
//! let config = FetchConfig::new("https://bulk.example.com/fhir")?;
//! let mut fetcher = BulkDataFetcher::new(config, evaluator)?
//!     .with_token_provider(auth);
//!
//! let report = fetcher.fetch(&types, &rules).await?;
//! let again = fetcher.reprocess(&other_rules).await;
//! ```

pub mod config;
pub mod download;
pub mod error;
pub mod fetcher;
pub mod local;
pub mod poller;

pub use config::FetchConfig;
pub use download::OutputDownloader;
pub use error::{FetchError, Result};
pub use fetcher::BulkDataFetcher;
pub use local::NdjsonLoader;
pub use poller::{DownloadDescriptor, ExportOutcome, ExportPoller, JobHandle};
