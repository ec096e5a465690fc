// Shared column normalization for every spreadsheet source.
//
// Each source is described by a `Schema`: which headers to keep, the
// canonical name each one maps to, whether it is numeric and whether the
// pass can run without it. Headers are compared after trimming.
use crate::error::{ReportError, Result};
use crate::util::parse_f64_safe;
use std::collections::HashMap;

/// A sheet as read from disk: one header row followed by string cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Number,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub source: &'static str,
    pub canonical: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
}

impl ColumnSpec {
    pub const fn text(source: &'static str, canonical: &'static str) -> Self {
        Self { source, canonical, kind: ColumnKind::Text, required: true }
    }

    pub const fn number(source: &'static str, canonical: &'static str) -> Self {
        Self { source, canonical, kind: ColumnKind::Number, required: true }
    }

    pub const fn optional(self) -> Self {
        Self { required: false, ..self }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub name: &'static str,
    pub columns: &'static [ColumnSpec],
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    /// `None` is the missing marker for cells that did not parse.
    Number(Option<f64>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRow {
    values: HashMap<&'static str, Value>,
}

impl NormalizedRow {
    /// Trimmed text of a column; `None` when absent or blank.
    pub fn text(&self, column: &str) -> Option<&str> {
        match self.values.get(column) {
            Some(Value::Text(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// Text of a column, or an empty string when absent.
    pub fn text_or_empty(&self, column: &str) -> String {
        self.text(column).unwrap_or_default().to_string()
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        match self.values.get(column) {
            Some(Value::Number(n)) => *n,
            _ => None,
        }
    }
}

/// Rename and coerce `table` according to `schema`.
///
/// Columns not named in the schema are dropped. A required column that is
/// not present in the headers fails the whole table.
pub fn normalize(table: &RawTable, schema: &Schema) -> Result<Vec<NormalizedRow>> {
    let headers: Vec<&str> = table.headers.iter().map(|h| h.trim()).collect();

    let mut positions: Vec<(usize, &ColumnSpec)> = Vec::with_capacity(schema.columns.len());
    for spec in schema.columns {
        match headers.iter().position(|h| *h == spec.source) {
            Some(idx) => positions.push((idx, spec)),
            None if spec.required => {
                return Err(ReportError::MissingColumn {
                    source_name: schema.name,
                    column: spec.source,
                })
            }
            None => {}
        }
    }

    let rows = table
        .rows
        .iter()
        .map(|cells| {
            let mut values = HashMap::with_capacity(positions.len());
            for (idx, spec) in &positions {
                let cell = cells.get(*idx).map(|c| c.trim());
                let value = match spec.kind {
                    ColumnKind::Text => Value::Text(cell.unwrap_or_default().to_string()),
                    ColumnKind::Number => Value::Number(parse_f64_safe(cell)),
                };
                values.insert(spec.canonical, value);
            }
            NormalizedRow { values }
        })
        .collect();
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: Schema = Schema {
        name: "test",
        columns: &[
            ColumnSpec::text("Cultivo", "crop"),
            ColumnSpec::number("Total", "total"),
            ColumnSpec::text("Campo", "field").optional(),
        ],
    };

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn padded_headers_are_renamed() {
        let t = table(&["  Cultivo ", "Total  ", "Extra"], &[&["Maize", "1,500", "x"]]);
        let rows = normalize(&t, &SCHEMA).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("crop"), Some("Maize"));
        assert_eq!(rows[0].number("total"), Some(1500.0));
        assert_eq!(rows[0].text("Extra"), None);
        assert_eq!(rows[0].text("field"), None);
    }

    #[test]
    fn unparseable_numbers_become_missing() {
        let t = table(&["Cultivo", "Total"], &[&["Maize", "pending"], &["Soy", ""]]);
        let rows = normalize(&t, &SCHEMA).unwrap();
        assert_eq!(rows[0].number("total"), None);
        assert_eq!(rows[1].number("total"), None);
    }

    #[test]
    fn short_rows_read_as_missing() {
        let t = table(&["Cultivo", "Total"], &[&["Maize"]]);
        let rows = normalize(&t, &SCHEMA).unwrap();
        assert_eq!(rows[0].number("total"), None);
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let t = table(&["Cultivo", "Campo"], &[&["Maize", "North"]]);
        match normalize(&t, &SCHEMA) {
            Err(ReportError::MissingColumn { source_name, column }) => {
                assert_eq!(source_name, "test");
                assert_eq!(column, "Total");
            }
            other => panic!("expected missing column, got {:?}", other),
        }
    }
}
