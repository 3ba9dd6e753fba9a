//! Rendering of headers and rows as a table or as JSON

use anyhow::{Context, Result};
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use serde_json::{Map, Value};

/// Render `rows` as a table with uppercased `headers`
pub fn format_as_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| Cell::new(h.to_uppercase())));

    for row in rows {
        table.add_row(row.iter().map(Cell::new));
    }

    table.to_string()
}

/// Render `rows` as a JSON array of objects keyed by `headers`.
///
/// Cells beyond the last header are dropped; missing cells become empty strings.
pub fn format_as_json(headers: &[String], rows: &[Vec<String>]) -> Result<String> {
    let objects: Vec<Value> = rows
        .iter()
        .map(|row| {
            let object: Map<String, Value> = headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let cell = row.get(i).cloned().unwrap_or_default();
                    (header.clone(), Value::String(cell))
                })
                .collect();
            Value::Object(object)
        })
        .collect();

    serde_json::to_string_pretty(&objects).context("failed to serialize output as JSON")
}
