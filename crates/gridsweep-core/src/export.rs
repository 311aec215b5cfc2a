//! CSV projection of a result table.
//!
//! A pure, stateless projection: fields comma-joined, values containing
//! comma, quote, or newline wrapped in quotes with internal quotes
//! doubled. Absent fields render as empty cells.

use std::io::Write;

use chrono::SecondsFormat;
use serde_json::Value;

use crate::error::CoreError;
use crate::table::ResultTable;

/// Render the table as delimited text. An empty table renders as an
/// empty string, header included.
pub fn to_csv(table: &ResultTable) -> String {
    if table.is_empty() {
        return String::new();
    }
    let columns = table.columns();
    let mut lines = Vec::with_capacity(table.len() + 1);
    lines.push(
        columns
            .iter()
            .map(|c| escape(c))
            .collect::<Vec<_>>()
            .join(","),
    );
    for row in table.rows() {
        let mut cells = Vec::with_capacity(columns.len());
        cells.push(escape(
            &row.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        ));
        cells.push(escape(&row.index.to_string()));
        for key in &columns[2..] {
            let value = row.fields.get(key).unwrap_or(&Value::Null);
            cells.push(escape(&render(value)));
        }
        lines.push(cells.join(","));
    }
    lines.join("\n")
}

/// Write the CSV rendering into a sink.
pub fn write_csv<W: Write>(table: &ResultTable, mut sink: W) -> Result<(), CoreError> {
    sink.write_all(to_csv(table).as_bytes())?;
    Ok(())
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
