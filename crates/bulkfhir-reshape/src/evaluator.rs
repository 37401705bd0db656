//! The path-expression seam.
//!
//! The reshape engine never interprets path expressions itself; it goes
//! through [`PathEvaluator`]. The default implementation wraps the
//! `octofhir-fhirpath` engine.

use std::sync::Arc;

use async_trait::async_trait;
use octofhir_fhirpath::{Collection, EvaluationContext, FhirPathEngine};
use serde_json::Value;

/// A compiled, side-effect-free query capability over single records.
///
/// `compile` is called once per expression when a rule set is registered;
/// `evaluate` is called once per (expression, record) pair. Expressions are
/// pure: evaluating one must not observe or mutate anything outside the
/// record it is given.
#[async_trait]
pub trait PathEvaluator: Send + Sync {
    /// Parse-checks an expression. Errors abort rule registration.
    fn compile(&self, expression: &str) -> std::result::Result<(), String>;

    /// Evaluates an expression against one record, returning zero or more
    /// values.
    async fn evaluate(
        &self,
        expression: &str,
        record: &Value,
    ) -> std::result::Result<Vec<Value>, String>;
}

/// [`PathEvaluator`] backed by an `octofhir-fhirpath` engine.
pub struct FhirPathEvaluator {
    engine: Arc<FhirPathEngine>,
}

impl FhirPathEvaluator {
    /// Wraps an existing FHIRPath engine.
    pub fn new(engine: Arc<FhirPathEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl PathEvaluator for FhirPathEvaluator {
    fn compile(&self, expression: &str) -> std::result::Result<(), String> {
        octofhir_fhirpath::parse(expression)
            .into_result()
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    async fn evaluate(
        &self,
        expression: &str,
        record: &Value,
    ) -> std::result::Result<Vec<Value>, String> {
        let provider = self.engine.get_model_provider();
        let collection = Collection::from_json_resource(record.clone(), Some(provider.clone()))
            .await
            .map_err(|e| format!("failed to create evaluation context: {e}"))?;

        let context = EvaluationContext::new(collection, provider, None, None, None);

        let result = self
            .engine
            .evaluate(expression, &context)
            .await
            .map_err(|e| e.to_string())?;

        Ok(result.value.iter().map(|v| v.to_json_value()).collect())
    }
}
