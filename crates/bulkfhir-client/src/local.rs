//! Loading records from a local NDJSON dump instead of a server.
//!
//! Useful with synthetic data sets (e.g. Synthea exports) when no bulk
//! export server is available.

use std::path::{Path, PathBuf};

use bulkfhir_core::RawRecordStore;

use crate::download::ingest_ndjson;
use crate::error::{FetchError, Result};

/// Builds a record store from an NDJSON file on disk.
pub struct NdjsonLoader {
    path: PathBuf,
}

impl NdjsonLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this loader reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and decodes the file into a fresh store, bucketing each record
    /// by its own declared resource type.
    pub async fn load(&self) -> Result<RawRecordStore> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FetchError::LocalFile {
                path: self.path.display().to_string(),
                detail: e.to_string(),
            })?;

        let mut store = RawRecordStore::new();
        ingest_ndjson(&body, &mut store)?;

        tracing::info!(
            path = %self.path.display(),
            types = ?store.types(),
            records = store.len(),
            "Loaded local NDJSON dump"
        );
        Ok(store)
    }
}
