//! Reshaping of raw FHIR records into tabular data.
//!
//! This crate turns the per-type buckets of a
//! [`bulkfhir_core::RawRecordStore`] into flat tables, either through
//! user-supplied extraction rules (compiled FHIRPath expressions) or through
//! full deep flattening when no rules are registered for a type.
//!
//! # Components
//!
//! - [`PathEvaluator`] - Trait seam over the path-expression engine
//! - [`FhirPathEvaluator`] - Default evaluator backed by `octofhir-fhirpath`
//! - [`ExtractionRuleSet`] - Compiled rules, keyed by resource type
//! - [`ReshapeEngine`] - Applies a rule set to a store, producing [`Table`]s
//!
//! # Example
//!
//! ```ignore
//! use bulkfhir_reshape::{ExtractionRuleSet, FhirPathEvaluator, ReshapeEngine};
//!
//! let evaluator = Arc::new(FhirPathEvaluator::new(engine));
//! let mut rules = ExtractionRuleSet::new();
//! rules.compile(evaluator.as_ref(), "Patient", [
//!     ("id", "identifier[0].value"),
//!     ("marital_status", "maritalStatus.coding[0].code"),
//! ])?;
//!
//! let engine = ReshapeEngine::new(evaluator);
//! let report = engine.apply(&store, &rules).await;
//! ```
//!
//! Reprocessing is the same `apply` call with a different rule set; the
//! store is never mutated.

mod engine;
mod evaluator;
mod rules;
mod table;

pub use engine::{ReshapeEngine, ReshapeReport, TypeFailure};
pub use evaluator::{FhirPathEvaluator, PathEvaluator};
pub use rules::{ExtractionRule, ExtractionRuleSet};
pub use table::Table;

use thiserror::Error;

/// Errors that can occur during rule compilation or reshaping.
#[derive(Debug, Error)]
pub enum Error {
    /// An extraction rule's path expression failed to compile.
    #[error(
        "Invalid extraction rule for {resource_type}.{field} (`{expression}`): {detail}"
    )]
    RuleCompile {
        resource_type: String,
        field: String,
        expression: String,
        detail: String,
    },

    /// A path expression failed while being evaluated against a record.
    #[error("Path evaluation failed for {resource_type}.{field}: {detail}")]
    Evaluation {
        resource_type: String,
        field: String,
        detail: String,
    },

    /// An error occurred while writing tabular output.
    #[error("CSV output error: {0}")]
    Csv(#[from] csv::Error),

    /// An I/O error occurred while writing tabular output.
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
