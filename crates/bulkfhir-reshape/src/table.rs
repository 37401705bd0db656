//! Tabular rendering of flat records.

use std::io::Write;

use bulkfhir_core::FlatRecord;
use serde_json::Value;

use crate::Result;

/// A uniform table built from a sequence of flat records.
///
/// Columns are the union of all record keys. Rows keep the input record
/// order; a row that does not define a column gets a JSON null, never a
/// fabricated default.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Builds a table from flat records.
    ///
    /// `seed_columns` fixes the leading column order (extraction rules pass
    /// their declared field order here); keys not present in any record are
    /// dropped, and keys outside the seed are appended in first-seen order.
    pub fn from_flat_records(seed_columns: &[String], records: &[FlatRecord]) -> Self {
        let mut columns: Vec<String> = seed_columns
            .iter()
            .filter(|c| records.iter().any(|r| r.contains_key(c.as_str())))
            .cloned()
            .collect();

        for record in records {
            for key in record.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| record.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// Column names, in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows, each with one value per column.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Writes the table as CSV with a header row.
    pub fn write_csv<W: Write>(&self, out: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new().from_writer(out);

        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(csv_cell))?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Renders the table as a CSV string.
    pub fn to_csv_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Convert a JSON value to a CSV-appropriate string.
fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(arr) => {
            // For arrays, join with semicolons
            arr.iter().map(csv_cell).collect::<Vec<_>>().join(";")
        }
        Value::Object(_) => {
            // For objects, serialize as JSON
            serde_json::to_string(value).unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flat(pairs: &[(&str, Value)]) -> FlatRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_columns_union_with_null_gaps() {
        let records = vec![
            flat(&[("id", json!("p1")), ("gender", json!("female"))]),
            flat(&[("id", json!("p2")), ("city", json!("Boston"))]),
        ];
        let table = Table::from_flat_records(&[], &records);

        assert_eq!(table.columns(), ["id", "gender", "city"]);
        assert_eq!(table.rows()[0], vec![json!("p1"), json!("female"), Value::Null]);
        assert_eq!(table.rows()[1], vec![json!("p2"), Value::Null, json!("Boston")]);
    }

    #[test]
    fn test_seed_columns_fix_leading_order() {
        let seed = vec!["gender".to_string(), "id".to_string()];
        let records = vec![flat(&[("id", json!("p1")), ("gender", json!("other"))])];
        let table = Table::from_flat_records(&seed, &records);
        assert_eq!(table.columns(), ["gender", "id"]);
    }

    #[test]
    fn test_seed_column_absent_everywhere_is_dropped() {
        let seed = vec!["id".to_string(), "never_set".to_string()];
        let records = vec![flat(&[("id", json!("p1"))])];
        let table = Table::from_flat_records(&seed, &records);
        assert_eq!(table.columns(), ["id"]);
    }

    #[test]
    fn test_csv_rendering() {
        let records = vec![
            flat(&[("id", json!("p1")), ("codes", json!(["a", "b"]))]),
            flat(&[("id", json!("p2"))]),
        ];
        let table = Table::from_flat_records(&[], &records);
        let csv = table.to_csv_string().unwrap();
        assert_eq!(csv, "id,codes\np1,a;b\np2,\n");
    }

    #[test]
    fn test_csv_quotes_embedded_commas() {
        let records = vec![flat(&[("name", json!("Doe, Jane"))])];
        let table = Table::from_flat_records(&[], &records);
        let csv = table.to_csv_string().unwrap();
        assert_eq!(csv, "name\n\"Doe, Jane\"\n");
    }

    #[test]
    fn test_empty_records_produce_empty_table() {
        let table = Table::from_flat_records(&[], &[]);
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
    }
}
