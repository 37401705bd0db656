//! The raw record store: per-type buckets of decoded resource instances.
//!
//! The store is the single source of truth for a fetch session. It is filled
//! once by a fetch (or a local NDJSON load) and then read any number of times
//! by the reshape layer; reshaping never mutates it.

use indexmap::IndexMap;
use serde_json::Value;

/// Result of a record lookup in the [`RawRecordStore`].
///
/// Lookup misses are ordinary, reportable results rather than errors: callers
/// probing for an example record get back enough context to correct the
/// request without tracing.
#[derive(Debug, PartialEq)]
pub enum RecordLookup<'a> {
    /// The record was found.
    Found(&'a Value),
    /// No bucket exists for the requested resource type.
    UnknownType {
        requested: String,
        /// Resource types that are present in the store.
        available: Vec<String>,
    },
    /// The bucket exists but holds no record with the requested id.
    UnknownId { resource_type: String, id: String },
}

impl<'a> RecordLookup<'a> {
    /// Returns the record if the lookup succeeded.
    pub fn found(&self) -> Option<&'a Value> {
        match self {
            Self::Found(record) => Some(record),
            _ => None,
        }
    }

    /// Returns true if the lookup succeeded.
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Human-readable description of a miss, or `None` for a hit.
    pub fn describe_miss(&self) -> Option<String> {
        match self {
            Self::Found(_) => None,
            Self::UnknownType {
                requested,
                available,
            } => Some(format!(
                "{requested} is not available. Try one of: {}",
                available.join(", ")
            )),
            Self::UnknownId { resource_type, id } => {
                Some(format!("No {resource_type} with id={id} was found"))
            }
        }
    }
}

/// In-memory mapping from resource type to an ordered sequence of raw records.
///
/// Buckets are created on first ingest and keep ingestion order. A fresh
/// fetch builds a new store and swaps it in whole, so callers never observe
/// a mix of old and new data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecordStore {
    buckets: IndexMap<String, Vec<Value>>,
}

impl RawRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all buckets.
    pub fn reset(&mut self) {
        self.buckets.clear();
    }

    /// Appends a record to the bucket for `resource_type`, creating the
    /// bucket on first use.
    ///
    /// The caller is responsible for passing the record's own declared type;
    /// see [`crate::ndjson::declared_resource_type`].
    pub fn ingest(&mut self, resource_type: &str, record: Value) {
        self.buckets
            .entry(resource_type.to_string())
            .or_default()
            .push(record);
    }

    /// Resource types present in the store, in first-ingested order.
    pub fn types(&self) -> Vec<String> {
        self.buckets.keys().cloned().collect()
    }

    /// All records of a type, in ingestion order.
    pub fn records(&self, resource_type: &str) -> Option<&[Value]> {
        self.buckets.get(resource_type).map(Vec::as_slice)
    }

    /// Iterates over `(resource_type, records)` pairs in first-ingested order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.buckets
            .iter()
            .map(|(t, records)| (t.as_str(), records.as_slice()))
    }

    /// The first record of a type, as a convenience for inspecting
    /// one example instance, not "all records".
    pub fn first(&self, resource_type: &str) -> RecordLookup<'_> {
        match self.buckets.get(resource_type).and_then(|b| b.first()) {
            Some(record) => RecordLookup::Found(record),
            None => RecordLookup::UnknownType {
                requested: resource_type.to_string(),
                available: self.types(),
            },
        }
    }

    /// Finds a record of a type by exact `id` match (linear scan).
    pub fn find(&self, resource_type: &str, id: &str) -> RecordLookup<'_> {
        let Some(bucket) = self.buckets.get(resource_type) else {
            return RecordLookup::UnknownType {
                requested: resource_type.to_string(),
                available: self.types(),
            };
        };

        bucket
            .iter()
            .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
            .map(RecordLookup::Found)
            .unwrap_or_else(|| RecordLookup::UnknownId {
                resource_type: resource_type.to_string(),
                id: id.to_string(),
            })
    }

    /// Total number of records across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Returns true if no records have been ingested.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
