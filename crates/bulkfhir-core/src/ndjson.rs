//! Newline-delimited JSON decoding for bulk export files.

use serde_json::Value;

use crate::error::{CoreError, Result};

/// Decodes a newline-delimited JSON body into records.
///
/// Blank lines are skipped. A malformed line fails the whole decode with an
/// error naming the 1-based line number, so a truncated download is caught
/// rather than silently shortened.
pub fn parse_ndjson(body: &str) -> Result<Vec<Value>> {
    let mut records = Vec::new();

    for (idx, line) in body.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record: Value = serde_json::from_str(line)
            .map_err(|e| CoreError::invalid_ndjson(idx + 1, e.to_string()))?;

        if !record.is_object() {
            return Err(CoreError::invalid_ndjson(
                idx + 1,
                "expected a JSON object per line",
            ));
        }

        records.push(record);
    }

    Ok(records)
}

/// The resource type a record declares for itself, if any.
///
/// Bucketing always follows this declared type, never the type that was
/// requested or advertised by the server.
pub fn declared_resource_type(record: &Value) -> Option<&str> {
    record.get("resourceType").and_then(Value::as_str)
}
