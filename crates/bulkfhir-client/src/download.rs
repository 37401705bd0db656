//! NDJSON file downloads into the raw record store.

use std::sync::Arc;

use bulkfhir_auth::TokenProvider;
use bulkfhir_core::{CoreError, RawRecordStore, declared_resource_type, parse_ndjson};

use crate::error::{FetchError, Result};
use crate::poller::{DownloadDescriptor, FHIR_JSON};

/// Downloads advertised export files and ingests their records.
///
/// Files are fetched sequentially, in manifest order; a failed download or
/// an undecodable body aborts the whole fetch so the caller never sees a
/// partially filled store.
pub struct OutputDownloader {
    http: reqwest::Client,
    token: Option<Arc<dyn TokenProvider>>,
}

impl OutputDownloader {
    pub fn new(http: reqwest::Client, token: Option<Arc<dyn TokenProvider>>) -> Self {
        Self { http, token }
    }

    /// Downloads every descriptor into `store`.
    pub async fn download_into(
        &self,
        descriptors: &[DownloadDescriptor],
        store: &mut RawRecordStore,
    ) -> Result<()> {
        for descriptor in descriptors {
            self.download_one(descriptor, store).await?;
        }
        Ok(())
    }

    async fn download_one(
        &self,
        descriptor: &DownloadDescriptor,
        store: &mut RawRecordStore,
    ) -> Result<()> {
        tracing::info!(
            url = %descriptor.url,
            resource_type = %descriptor.resource_type,
            "Downloading export file"
        );

        let mut request = self
            .http
            .get(descriptor.url.clone())
            .header("Accept", FHIR_JSON);
        if let Some(provider) = &self.token {
            request = request.bearer_auth(provider.bearer_token().await?);
        }

        let response = request.send().await.map_err(FetchError::request)?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(FetchError::ExportFailed {
                status: status.as_u16(),
                detail,
            });
        }

        let body = response.text().await.map_err(FetchError::request)?;
        ingest_ndjson(&body, store)?;
        Ok(())
    }
}

/// Decodes an NDJSON body and buckets every record by its own declared
/// resource type. The manifest's advertised type is never consulted.
pub(crate) fn ingest_ndjson(body: &str, store: &mut RawRecordStore) -> Result<()> {
    let records = parse_ndjson(body)?;

    for (idx, record) in records.into_iter().enumerate() {
        let resource_type = declared_resource_type(&record)
            .ok_or_else(|| CoreError::missing_resource_type(idx + 1))?
            .to_string();
        store.ingest(&resource_type, record);
    }

    Ok(())
}
