//! Comma-separated export.
//!
//! Header is the union of every row's columns in first-seen order, so a set
//! mixing report shapes still lines up. Missing and null values render as
//! empty fields.

use serde_json::{Map, Value as JsonValue};

/// A row that can be written as CSV.
pub trait CsvRow {
    fn columns(&self) -> Vec<&str>;
    fn cell(&self, column: &str) -> Option<String>;
}

impl CsvRow for Map<String, JsonValue> {
    fn columns(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect()
    }

    fn cell(&self, column: &str) -> Option<String> {
        match self.get(column)? {
            JsonValue::Null => None,
            JsonValue::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

pub fn to_csv<R: CsvRow>(rows: &[R]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut headers: Vec<&str> = Vec::new();
    for row in rows {
        for column in row.columns() {
            if !headers.contains(&column) {
                headers.push(column);
            }
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(headers.iter().map(|h| escape(h)).collect::<Vec<_>>().join(","));
    for row in rows {
        let fields: Vec<String> = headers
            .iter()
            .map(|h| row.cell(h).map(|v| escape(&v)).unwrap_or_default())
            .collect();
        lines.push(fields.join(","));
    }
    lines.join("\n")
}

pub fn escape(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(map) => map,
            other => panic!("not an object: {}", other),
        }
    }

    #[test]
    fn test_empty_rows_yield_empty_string() {
        let rows: Vec<Map<String, JsonValue>> = Vec::new();
        assert_eq!(to_csv(&rows), "");
    }

    #[test]
    fn test_comma_field_is_quoted() {
        let rows = vec![object(json!({"id": 1, "nombre": "A,B"}))];
        assert_eq!(to_csv(&rows), "id,nombre\n1,\"A,B\"");
    }

    #[test]
    fn test_quotes_and_newlines() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("di \"hola\""), "\"di \"\"hola\"\"\"");
        assert_eq!(escape("a\nb"), "\"a\nb\"");
        assert_eq!(escape(""), "");
    }

    #[test]
    fn test_null_and_missing_values_are_empty() {
        let rows = vec![
            object(json!({"id": 1, "stock": null})),
            object(json!({"id": 2})),
        ];
        assert_eq!(to_csv(&rows), "id,stock\n1,\n2,");
    }

    #[test]
    fn test_later_columns_are_appended() {
        let rows = vec![
            object(json!({"id": 1})),
            object(json!({"id": 2, "nota": "x", "precio": 9.5})),
        ];
        assert_eq!(to_csv(&rows), "id,nota,precio\n1,,\n2,x,9.5");
    }
}
