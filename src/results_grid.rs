use crate::core::db::RowRecord;
use crate::core::{CrudError, Result};
use rusqlite::types::Value;
use std::collections::BTreeMap;

/// Results Grid Module for TUICRUD
///
/// The displayed row set of one table tab: the primary key column followed
/// by the declared columns. A refresh replaces it wholesale; nothing edits
/// it in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsGrid {
    pub headers: Vec<String>,
    pub rows: Vec<RowRecord>,
}

impl ResultsGrid {
    /// Creates an empty grid with the given headers.
    pub fn new(headers: Vec<String>) -> Self {
        ResultsGrid {
            headers,
            rows: Vec::new(),
        }
    }

    /// Swaps in a freshly queried row set.
    pub fn replace_rows(&mut self, rows: Vec<RowRecord>) {
        self.rows = rows;
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&RowRecord> {
        self.rows.get(index)
    }

    /// Rows rendered as display strings.
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(display_value).collect())
            .collect()
    }

    /// Exports the grid data to a specified format.
    /// Supported formats: CSV, JSON, Markdown.
    pub fn export(&self, format: &str) -> Result<String> {
        match format.to_lowercase().as_str() {
            "csv" => Ok(self.export_to_csv()),
            "json" => self.export_to_json(),
            "markdown" | "md" => Ok(self.export_to_markdown()),
            _ => Err(CrudError::Ui(format!(
                "Unsupported export format: '{}'. Supported formats: csv, json, markdown",
                format
            ))),
        }
    }

    fn export_to_csv(&self) -> String {
        let mut output = String::new();
        let header: Vec<String> = self.headers.iter().map(|h| csv_field(h)).collect();
        output.push_str(&header.join(","));
        output.push('\n');
        for row in self.display_rows() {
            let fields: Vec<String> = row.iter().map(|f| csv_field(f)).collect();
            output.push_str(&fields.join(","));
            output.push('\n');
        }
        output
    }

    fn export_to_json(&self) -> Result<String> {
        let rows: Vec<BTreeMap<&str, serde_json::Value>> = self
            .rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .zip(row.iter())
                    .map(|(header, value)| (header.as_str(), json_value(value)))
                    .collect()
            })
            .collect();
        Ok(serde_json::to_string(&rows)?)
    }

    fn export_to_markdown(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("| {} |\n", self.headers.join(" | ")));
        let underline: Vec<&str> = self.headers.iter().map(|_| "---").collect();
        output.push_str(&format!("| {} |\n", underline.join(" | ")));
        for row in self.display_rows() {
            let cells: Vec<String> = row.iter().map(|c| c.replace('|', "\\|")).collect();
            output.push_str(&format!("| {} |\n", cells.join(" | ")));
        }
        output
    }
}

/// Formats a SQLite value for display. NULL shows as an empty cell.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(t) => t.clone(),
        Value::Blob(b) => format!("<BLOB: {} bytes>", b.len()),
    }
}

fn json_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Real(f) => serde_json::Value::from(*f),
        Value::Text(t) => serde_json::Value::from(t.as_str()),
        Value::Blob(b) => serde_json::Value::from(format!("<BLOB: {} bytes>", b.len())),
    }
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
