//! Extraction rule sets: named fields backed by compiled path expressions.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::evaluator::PathEvaluator;
use crate::{Error, Result};

/// A single extraction rule: an output field name and the path expression
/// that produces its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRule {
    /// The field name in the output table.
    pub field: String,

    /// The path expression, e.g. `maritalStatus.coding[0].code`.
    pub path: String,
}

impl ExtractionRule {
    /// Creates a new rule.
    pub fn new(field: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            path: path.into(),
        }
    }
}

/// A mapping from resource type to an ordered list of extraction rules.
///
/// Rules are parse-checked through the evaluator when registered.
/// Registration is all-or-nothing per resource type: one bad expression
/// installs zero rules for that type and leaves other types untouched.
#[derive(Debug, Default)]
pub struct ExtractionRuleSet {
    rules: IndexMap<String, Vec<ExtractionRule>>,
}

impl ExtractionRuleSet {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles and registers the rules for one resource type.
    ///
    /// Every expression is checked before any rule is installed. On failure
    /// the error names the offending field and expression, and any rules
    /// previously registered for this type remain in place.
    pub fn compile<I, F, P>(
        &mut self,
        evaluator: &dyn PathEvaluator,
        resource_type: &str,
        rules: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = (F, P)>,
        F: Into<String>,
        P: Into<String>,
    {
        let mut compiled = Vec::new();

        for (field, path) in rules {
            let rule = ExtractionRule::new(field, path);
            evaluator
                .compile(&rule.path)
                .map_err(|detail| Error::RuleCompile {
                    resource_type: resource_type.to_string(),
                    field: rule.field.clone(),
                    expression: rule.path.clone(),
                    detail,
                })?;
            compiled.push(rule);
        }

        tracing::debug!(
            resource_type = %resource_type,
            rules = compiled.len(),
            "Registered extraction rules"
        );
        self.rules.insert(resource_type.to_string(), compiled);
        Ok(())
    }

    /// The rules registered for a resource type, in declaration order.
    pub fn rules_for(&self, resource_type: &str) -> Option<&[ExtractionRule]> {
        self.rules.get(resource_type).map(Vec::as_slice)
    }

    /// Returns true if rules are registered for the type.
    pub fn contains(&self, resource_type: &str) -> bool {
        self.rules.contains_key(resource_type)
    }

    /// Resource types with registered rules, in registration order.
    pub fn types(&self) -> Vec<String> {
        self.rules.keys().cloned().collect()
    }

    /// Returns true if no rules are registered at all.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
