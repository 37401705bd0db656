use std::sync::Arc;

use anyhow::Context;
use bulkfhir_auth::{BackendServicesAuth, BackendServicesConfig, StaticTokenProvider, TokenProvider};
use bulkfhir_client::{BulkDataFetcher, FetchConfig};

use crate::cli::FetchArgs;
use crate::output::write_report;
use crate::{engine, rules_file};

pub async fn run(args: &FetchArgs) -> anyhow::Result<()> {
    let evaluator = engine::build_evaluator().await?;
    let rules = rules_file::load_rules(args.rules.as_deref(), evaluator.as_ref())?;

    let config =
        FetchConfig::new(&args.server)?.with_export_endpoint(args.endpoint.clone());
    let mut fetcher = BulkDataFetcher::new(config, evaluator)?;

    if let Some(provider) = token_provider(args)? {
        fetcher = fetcher.with_token_provider(provider);
    }

    let report = fetcher.fetch(&args.types, &rules).await?;
    write_report(&report, args.out.as_deref())
}

/// Picks the credential source from the auth flags: a fixed `--token`, a
/// SMART Backend Services key, or nothing for open servers.
fn token_provider(args: &FetchArgs) -> anyhow::Result<Option<Arc<dyn TokenProvider>>> {
    if let Some(token) = &args.token {
        return Ok(Some(Arc::new(StaticTokenProvider::new(token.clone()))));
    }

    let (Some(client_id), Some(key_file), Some(kid)) =
        (&args.client_id, &args.key_file, &args.kid)
    else {
        return Ok(None);
    };

    let pem = std::fs::read_to_string(key_file)
        .with_context(|| format!("Failed to read key file {}", key_file.display()))?;
    let config = BackendServicesConfig::new(&args.server, client_id.as_str(), pem, kid.as_str())?;
    Ok(Some(Arc::new(BackendServicesAuth::new(config)?)))
}
