//! Kickoff and status polling for asynchronous bulk exports.
//!
//! The protocol: a kickoff `GET .../$export` is answered with 202 and a
//! `Content-Location` status URL. Polling that URL yields 202 with a
//! `Retry-After` delay while the server prepares files, then 200 with a
//! manifest listing one NDJSON file per resource type. Any other status is
//! terminal.

use std::sync::Arc;
use std::time::Duration;

use bulkfhir_auth::TokenProvider;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::FetchConfig;
use crate::error::{FetchError, Result};

pub(crate) const FHIR_JSON: &str = "application/fhir+json";

/// Handle to a running export job: the status URL to poll.
#[derive(Debug, Clone)]
pub struct JobHandle {
    pub status_url: Url,
}

/// One file advertised by the completion manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DownloadDescriptor {
    /// Where to download the NDJSON file from.
    pub url: Url,

    /// The resource type the server says the file contains. Informational;
    /// ingestion trusts each record's own `resourceType` instead.
    #[serde(rename = "type")]
    pub resource_type: String,
}

/// Completion manifest body. Only `output` matters here.
#[derive(Debug, Deserialize)]
struct ExportManifest {
    #[serde(default)]
    output: Vec<DownloadDescriptor>,
}

/// The result of a single status poll.
#[derive(Debug)]
pub enum ExportOutcome {
    /// Server still preparing files; poll again after the given delay.
    InProgress { retry_after: Duration },
    /// All files are ready.
    Complete(Vec<DownloadDescriptor>),
}

/// Drives one export job from kickoff to completion.
pub struct ExportPoller {
    http: reqwest::Client,
    config: FetchConfig,
    token: Option<Arc<dyn TokenProvider>>,
}

impl ExportPoller {
    pub fn new(
        http: reqwest::Client,
        config: FetchConfig,
        token: Option<Arc<dyn TokenProvider>>,
    ) -> Self {
        Self {
            http,
            config,
            token,
        }
    }

    /// A fresh bearer token, when a provider is configured. Called before
    /// every request so long-running jobs survive token expiry.
    async fn bearer(&self) -> Result<Option<String>> {
        match &self.token {
            Some(provider) => Ok(Some(provider.bearer_token().await?)),
            None => Ok(None),
        }
    }

    /// Starts an export for the given resource types.
    pub async fn start_export(&self, types: &[String]) -> Result<JobHandle> {
        // Url prints a root path as a trailing slash; trim it so the join
        // never produces "//".
        let url = format!(
            "{}/{}/$export",
            self.config.base_url.as_str().trim_end_matches('/'),
            self.config.export_endpoint
        );

        let mut request = self
            .http
            .get(&url)
            .header("Accept", FHIR_JSON)
            .header("Prefer", "respond-async");

        if !types.is_empty() {
            request = request.query(&[("_type", types.join(","))]);
        }
        if let Some(token) = self.bearer().await? {
            request = request.bearer_auth(token);
        }

        tracing::info!(url = %url, types = ?types, "Starting bulk export");

        let response = request.send().await.map_err(FetchError::request)?;
        let status = response.status();

        if status.as_u16() != 202 {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::ExportFailed {
                status: status.as_u16(),
                detail: operation_outcome_detail(&body),
            });
        }

        let status_url = response
            .headers()
            .get("Content-Location")
            .and_then(|v| v.to_str().ok())
            .ok_or(FetchError::MissingContentLocation)?;

        let status_url = Url::parse(status_url)
            .map_err(|e| FetchError::Request(format!("invalid Content-Location: {e}")))?;

        tracing::debug!(status_url = %status_url, "Export accepted");
        Ok(JobHandle { status_url })
    }

    /// Polls the job status once.
    pub async fn poll(&self, handle: &JobHandle) -> Result<ExportOutcome> {
        let mut request = self
            .http
            .get(handle.status_url.clone())
            .header("Accept", FHIR_JSON);
        if let Some(token) = self.bearer().await? {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(FetchError::request)?;
        let status = response.status();

        match status.as_u16() {
            202 => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(self.config.default_retry_after);

                Ok(ExportOutcome::InProgress {
                    retry_after: self.config.clamp_retry_after(retry_after),
                })
            }
            200 => {
                let manifest: ExportManifest = response
                    .json()
                    .await
                    .map_err(|e| FetchError::MalformedManifest(e.to_string()))?;
                Ok(ExportOutcome::Complete(manifest.output))
            }
            code => {
                let body = response.text().await.unwrap_or_default();
                Err(FetchError::ExportFailed {
                    status: code,
                    detail: operation_outcome_detail(&body),
                })
            }
        }
    }

    /// Polls until the export completes, sleeping the server-directed delay
    /// between attempts. There is no retry cap: the server owns the pace,
    /// and any non-200/202 status ends the loop as an error.
    pub async fn wait_until_complete(&self, handle: &JobHandle) -> Result<Vec<DownloadDescriptor>> {
        loop {
            match self.poll(handle).await? {
                ExportOutcome::InProgress { retry_after } => {
                    tracing::info!(delay_secs = retry_after.as_secs(), "Export in progress");
                    tokio::time::sleep(retry_after).await;
                }
                ExportOutcome::Complete(outputs) => {
                    tracing::info!(files = outputs.len(), "Export complete");
                    return Ok(outputs);
                }
            }
        }
    }
}

/// Pulls diagnostics out of an OperationOutcome body, falling back to the
/// raw body when it is anything else.
fn operation_outcome_detail(body: &str) -> String {
    if let Ok(doc) = serde_json::from_str::<Value>(body) {
        if doc.get("resourceType").and_then(Value::as_str) == Some("OperationOutcome") {
            let diagnostics: Vec<&str> = doc
                .get("issue")
                .and_then(Value::as_array)
                .map(|issues| {
                    issues
                        .iter()
                        .filter_map(|i| i.get("diagnostics").and_then(Value::as_str))
                        .collect()
                })
                .unwrap_or_default();

            if !diagnostics.is_empty() {
                return diagnostics.join("; ");
            }
        }
    }
    body.to_string()
}
