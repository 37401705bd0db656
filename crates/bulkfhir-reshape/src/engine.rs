//! The reshape engine: applies a rule set to a raw record store.

use std::sync::Arc;

use bulkfhir_core::{FlatRecord, RawRecordStore, deep_flatten};
use indexmap::IndexMap;
use serde_json::Value;

use crate::evaluator::PathEvaluator;
use crate::rules::ExtractionRuleSet;
use crate::table::Table;
use crate::Error;

/// A resource type whose reshape failed, with the failure detail.
///
/// One type failing never aborts the others; failed types are reported here
/// instead of appearing in `tables`.
#[derive(Debug)]
pub struct TypeFailure {
    pub resource_type: String,
    pub error: Error,
}

/// The outcome of one `apply` pass: a table per successfully reshaped
/// resource type, plus any per-type failures.
#[derive(Debug, Default)]
pub struct ReshapeReport {
    /// Tables keyed by resource type, in store order.
    pub tables: IndexMap<String, Table>,
    /// Types that failed to reshape.
    pub failures: Vec<TypeFailure>,
}

impl ReshapeReport {
    /// The table for a resource type, if it reshaped successfully.
    pub fn table(&self, resource_type: &str) -> Option<&Table> {
        self.tables.get(resource_type)
    }
}

/// Applies extraction rules (or the deep-flatten fallback) to every bucket
/// of a [`RawRecordStore`].
///
/// `apply` is a pure read of the store: reprocessing with a new rule set is
/// just another `apply` call, and the store is bitwise identical afterwards.
/// Output is deterministic: row order follows ingestion order, column order
/// follows rule declaration order (or document order for the fallback).
pub struct ReshapeEngine {
    evaluator: Arc<dyn PathEvaluator>,
}

impl ReshapeEngine {
    /// Creates an engine over the given path evaluator.
    pub fn new(evaluator: Arc<dyn PathEvaluator>) -> Self {
        Self { evaluator }
    }

    /// Reshapes every resource type in the store.
    pub async fn apply(&self, store: &RawRecordStore, rules: &ExtractionRuleSet) -> ReshapeReport {
        let mut report = ReshapeReport::default();

        for (resource_type, records) in store.iter() {
            match self.reshape_type(resource_type, records, rules).await {
                Ok(table) => {
                    report.tables.insert(resource_type.to_string(), table);
                }
                Err(error) => {
                    tracing::warn!(
                        resource_type = %resource_type,
                        error = %error,
                        "Failed to reshape resource type"
                    );
                    report.failures.push(TypeFailure {
                        resource_type: resource_type.to_string(),
                        error,
                    });
                }
            }
        }

        report
    }

    async fn reshape_type(
        &self,
        resource_type: &str,
        records: &[Value],
        rules: &ExtractionRuleSet,
    ) -> crate::Result<Table> {
        let Some(type_rules) = rules.rules_for(resource_type) else {
            // No rules registered: fall back to full deep flattening.
            let flat: Vec<FlatRecord> = records.iter().map(deep_flatten).collect();
            return Ok(Table::from_flat_records(&[], &flat));
        };

        let seed: Vec<String> = type_rules.iter().map(|r| r.field.clone()).collect();
        let mut flat_records = Vec::with_capacity(records.len());

        for record in records {
            let mut flat = FlatRecord::new();

            for rule in type_rules {
                let mut values = self
                    .evaluator
                    .evaluate(&rule.path, record)
                    .await
                    .map_err(|detail| Error::Evaluation {
                        resource_type: resource_type.to_string(),
                        field: rule.field.clone(),
                        detail,
                    })?;

                let cell = match values.len() {
                    // Zero results: the field is absent, not an error.
                    0 => None,
                    // A single-element sequence collapses to its element.
                    1 => values.pop(),
                    // Multi-element sequences are preserved as-is.
                    _ => Some(Value::Array(values)),
                };
                if let Some(cell) = cell {
                    flat.insert(rule.field.clone(), cell);
                }
            }

            flat_records.push(flat);
        }

        Ok(Table::from_flat_records(&seed, &flat_records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    /// Test evaluator: expressions are dot-separated key paths. Arrays met
    /// along the way fan out, so a path can yield zero, one, or many
    /// values. `!bad …` fails compilation, `!boom` fails evaluation.
    struct DotPathEvaluator;

    fn collect(value: &Value, segments: &[&str], out: &mut Vec<Value>) {
        match (value, segments) {
            (Value::Array(items), _) => {
                for item in items {
                    collect(item, segments, out);
                }
            }
            (_, []) => out.push(value.clone()),
            (Value::Object(map), [head, rest @ ..]) => {
                if let Some(child) = map.get(*head) {
                    collect(child, rest, out);
                }
            }
            _ => {}
        }
    }

    #[async_trait]
    impl PathEvaluator for DotPathEvaluator {
        fn compile(&self, expression: &str) -> std::result::Result<(), String> {
            if expression.starts_with("!bad") {
                Err("unexpected token".to_string())
            } else {
                Ok(())
            }
        }

        async fn evaluate(
            &self,
            expression: &str,
            record: &Value,
        ) -> std::result::Result<Vec<Value>, String> {
            if expression == "!boom" {
                return Err("evaluator exploded".to_string());
            }
            let segments: Vec<&str> = expression.split('.').collect();
            let mut out = Vec::new();
            collect(record, &segments, &mut out);
            Ok(out)
        }
    }

    fn evaluator() -> Arc<dyn PathEvaluator> {
        Arc::new(DotPathEvaluator)
    }

    fn patient_store() -> RawRecordStore {
        let mut store = RawRecordStore::new();
        store.ingest(
            "Patient",
            json!({
                "resourceType": "Patient",
                "id": "p1",
                "name": [{"given": ["Ada", "Augusta"], "family": "Lovelace"}],
                "gender": "female"
            }),
        );
        store.ingest(
            "Patient",
            json!({
                "resourceType": "Patient",
                "id": "p2",
                "name": [{"family": "Babbage"}],
                "gender": "male"
            }),
        );
        store
    }

    #[tokio::test]
    async fn test_singleton_result_collapses_to_scalar() {
        let mut rules = ExtractionRuleSet::new();
        rules
            .compile(
                evaluator().as_ref(),
                "Patient",
                [("family", "name.family")],
            )
            .unwrap();

        let engine = ReshapeEngine::new(evaluator());
        let report = engine.apply(&patient_store(), &rules).await;

        let table = report.table("Patient").unwrap();
        assert_eq!(table.rows()[0][0], json!("Lovelace"));
        assert_eq!(table.rows()[1][0], json!("Babbage"));
    }

    #[tokio::test]
    async fn test_multi_element_result_is_preserved() {
        let mut rules = ExtractionRuleSet::new();
        rules
            .compile(evaluator().as_ref(), "Patient", [("given", "name.given")])
            .unwrap();

        let engine = ReshapeEngine::new(evaluator());
        let report = engine.apply(&patient_store(), &rules).await;

        let table = report.table("Patient").unwrap();
        assert_eq!(table.rows()[0][0], json!(["Ada", "Augusta"]));
    }

    #[tokio::test]
    async fn test_zero_results_leave_field_missing() {
        let mut rules = ExtractionRuleSet::new();
        rules
            .compile(
                evaluator().as_ref(),
                "Patient",
                [("id", "id"), ("given", "name.given")],
            )
            .unwrap();

        let engine = ReshapeEngine::new(evaluator());
        let report = engine.apply(&patient_store(), &rules).await;

        // p2 has no given names: null gap, not an error or a default.
        let table = report.table("Patient").unwrap();
        assert_eq!(table.columns(), ["id", "given"]);
        assert_eq!(table.rows()[1], vec![json!("p2"), Value::Null]);
    }

    #[tokio::test]
    async fn test_deep_flatten_fallback_for_unruled_type() {
        let mut store = RawRecordStore::new();
        store.ingest("Observation", json!({"a": {"b": [1, 2]}}));

        let engine = ReshapeEngine::new(evaluator());
        let report = engine.apply(&store, &ExtractionRuleSet::new()).await;

        let table = report.table("Observation").unwrap();
        assert_eq!(table.columns(), ["a.b.0", "a.b.1"]);
        assert_eq!(table.rows()[0], vec![json!(1), json!(2)]);
    }

    #[tokio::test]
    async fn test_apply_is_deterministic() {
        let mut rules = ExtractionRuleSet::new();
        rules
            .compile(
                evaluator().as_ref(),
                "Patient",
                [("id", "id"), ("gender", "gender"), ("given", "name.given")],
            )
            .unwrap();

        let store = patient_store();
        let engine = ReshapeEngine::new(evaluator());

        let first = engine.apply(&store, &rules).await;
        let second = engine.apply(&store, &rules).await;

        assert_eq!(first.tables, second.tables);
        assert_eq!(
            first.table("Patient").unwrap().to_csv_string().unwrap(),
            second.table("Patient").unwrap().to_csv_string().unwrap()
        );
    }

    #[tokio::test]
    async fn test_apply_does_not_mutate_store() {
        let store = patient_store();
        let snapshot = store.clone();

        let mut rules = ExtractionRuleSet::new();
        rules
            .compile(evaluator().as_ref(), "Patient", [("id", "id")])
            .unwrap();

        let engine = ReshapeEngine::new(evaluator());
        let _ = engine.apply(&store, &rules).await;

        assert_eq!(store, snapshot);
    }

    #[tokio::test]
    async fn test_one_failing_type_does_not_abort_others() {
        let mut store = patient_store();
        store.ingest(
            "Observation",
            json!({"resourceType": "Observation", "id": "o1"}),
        );

        let mut rules = ExtractionRuleSet::new();
        rules
            .compile(evaluator().as_ref(), "Patient", [("id", "id")])
            .unwrap();
        rules
            .compile(evaluator().as_ref(), "Observation", [("val", "!boom")])
            .unwrap();

        let engine = ReshapeEngine::new(evaluator());
        let report = engine.apply(&store, &rules).await;

        assert!(report.table("Patient").is_some());
        assert!(report.table("Observation").is_none());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].resource_type, "Observation");
        assert!(matches!(
            report.failures[0].error,
            Error::Evaluation { .. }
        ));
    }

    #[tokio::test]
    async fn test_tables_follow_store_order() {
        let mut store = RawRecordStore::new();
        store.ingest("Observation", json!({"id": "o1"}));
        store.ingest("Patient", json!({"id": "p1"}));

        let engine = ReshapeEngine::new(evaluator());
        let report = engine.apply(&store, &ExtractionRuleSet::new()).await;

        let order: Vec<_> = report.tables.keys().cloned().collect();
        assert_eq!(order, vec!["Observation", "Patient"]);
    }
}
