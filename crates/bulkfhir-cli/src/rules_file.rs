//! Extraction rules file parsing.
//!
//! The file maps resource types to rules:
//!
//! ```json
//! {
//!   "Patient": [
//!     {"name": "id", "path": "id"},
//!     {"name": "marital_status", "path": "maritalStatus.coding[0].code"}
//!   ]
//! }
//! ```

use std::path::Path;

use anyhow::Context;
use bulkfhir_reshape::{ExtractionRuleSet, PathEvaluator};
use indexmap::IndexMap;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RuleEntry {
    name: String,
    path: String,
}

/// Loads and compiles a rules file. `None` yields an empty set, which makes
/// the reshape engine deep-flatten every type.
pub fn load_rules(
    path: Option<&Path>,
    evaluator: &dyn PathEvaluator,
) -> anyhow::Result<ExtractionRuleSet> {
    let mut rules = ExtractionRuleSet::new();
    let Some(path) = path else {
        return Ok(rules);
    };

    let body = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read rules file {}", path.display()))?;

    let parsed: IndexMap<String, Vec<RuleEntry>> = serde_json::from_str(&body)
        .with_context(|| format!("Invalid rules file {}", path.display()))?;

    for (resource_type, entries) in parsed {
        rules.compile(
            evaluator,
            &resource_type,
            entries.into_iter().map(|e| (e.name, e.path)),
        )?;
    }

    Ok(rules)
}
