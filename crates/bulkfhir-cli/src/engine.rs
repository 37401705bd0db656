//! FHIRPath engine wiring.

use std::sync::Arc;

use bulkfhir_reshape::{FhirPathEvaluator, PathEvaluator};
use octofhir_fhirpath::FhirPathEngine;
use octofhir_fhirschema::EmbeddedSchemaProvider;

/// Builds the default evaluator: a FHIRPath engine over the embedded FHIR
/// R4 model.
pub async fn build_evaluator() -> anyhow::Result<Arc<dyn PathEvaluator>> {
    let provider = Arc::new(EmbeddedSchemaProvider::r4());

    let registry = Arc::new(octofhir_fhirpath::create_function_registry());
    let engine = FhirPathEngine::new(registry, provider)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create FHIRPath engine: {e}"))?;

    Ok(Arc::new(FhirPathEvaluator::new(Arc::new(engine))))
}
