use bulkfhir_client::NdjsonLoader;
use bulkfhir_reshape::ReshapeEngine;

use crate::cli::LocalArgs;
use crate::output::write_report;
use crate::{engine, rules_file};

pub async fn run(args: &LocalArgs) -> anyhow::Result<()> {
    let evaluator = engine::build_evaluator().await?;
    let rules = rules_file::load_rules(args.rules.as_deref(), evaluator.as_ref())?;

    let store = NdjsonLoader::new(&args.file).load().await?;

    let reshaper = ReshapeEngine::new(evaluator);
    let report = reshaper.apply(&store, &rules).await;
    write_report(&report, args.out.as_deref())
}
