//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Tables are built
//! from each entity's descriptor columns, structured formats use serde,
//! plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use owo_colors::OwoColorize;
use tabled::{builder::Builder, settings::Style};

use fleetops_core::{EntityDescriptor, Record};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled on `stream`.
pub fn should_color(mode: &ColorMode, stream: &impl IsTerminal) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => stream.is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Status values that read as good, bad, or in-between.
fn paint_status(value: &str, color: bool) -> String {
    if !color {
        return value.to_owned();
    }
    match value {
        "operational" | "completed" | "compliant" | "low" => value.green().to_string(),
        "maintenance" | "in_progress" | "pending" | "medium" | "due_soon" => {
            value.yellow().to_string()
        }
        "grounded" | "non_compliant" | "overdue" | "high" | "critical" | "cancelled" => {
            value.red().to_string()
        }
        _ => value.to_owned(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render records in the chosen format.
///
/// - `table`: one column per descriptor column, in backend order
/// - `json` / `json-compact` / `yaml`: the rows as the backend returned them
/// - `plain`: one record id per line
pub fn render_records(
    format: &OutputFormat,
    descriptor: &EntityDescriptor,
    records: &[Arc<Record>],
    color: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(descriptor.columns.iter().map(|c| c.header.to_owned()));
            for record in records {
                builder.push_record(descriptor.columns.iter().map(|c| {
                    let value = record.display(c.path);
                    if is_status_column(c.path) {
                        paint_status(&value, color)
                    } else {
                        value
                    }
                }));
            }
            Ok(finish(builder))
        }
        OutputFormat::Plain => Ok(records
            .iter()
            .map(|r| r.id().to_string())
            .collect::<Vec<_>>()
            .join("\n")),
        structured => render_structured(structured, records),
    }
}

/// Render one item as `label: value` lines (table) or via serde.
///
/// `plain` prints `id` only.
pub fn render_details<T: serde::Serialize + ?Sized>(
    format: &OutputFormat,
    data: &T,
    lines: &[(String, String)],
    id: &str,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(render_pairs(lines)),
        OutputFormat::Plain => Ok(id.to_owned()),
        structured => render_structured(structured, data),
    }
}

/// Aligned `label: value` lines.
pub fn render_pairs<K: AsRef<str>, V: AsRef<str>>(lines: &[(K, V)]) -> String {
    let width = lines
        .iter()
        .map(|(k, _)| k.as_ref().chars().count())
        .max()
        .unwrap_or(0);
    lines
        .iter()
        .map(|(k, v)| {
            let value = v.as_ref();
            format!(
                "{:<width$}  {}",
                format!("{}:", k.as_ref()),
                if value.is_empty() { "-" } else { value },
                width = width + 1
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serialize `data` as JSON or YAML. Table and plain fall back to
/// pretty JSON.
pub fn render_structured<T: serde::Serialize + ?Sized>(
    format: &OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    let rendered = match format {
        OutputFormat::JsonCompact => serde_json::to_string(data).map_err(render_error)?,
        OutputFormat::Yaml => serde_yaml::to_string(data).map_err(render_error)?,
        _ => serde_json::to_string_pretty(data).map_err(render_error)?,
    };
    Ok(rendered)
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Helpers ──────────────────────────────────────────────────────────

fn finish(builder: Builder) -> String {
    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

fn is_status_column(path: &str) -> bool {
    matches!(path, "status" | "severity" | "priority")
}

fn render_error(err: impl std::fmt::Display) -> CliError {
    CliError::Render(err.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fleetops_core::EntityKind;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Arc<Record> {
        let serde_json::Value::Object(row) = value else {
            panic!("row must be an object");
        };
        Arc::new(Record::from_row(row).unwrap())
    }

    #[test]
    fn table_uses_descriptor_headers_and_join_paths() {
        let descriptor = EntityKind::WorkOrders.descriptor();
        let rows = vec![record(json!({
            "id": "w1",
            "title": "Replace brake pads",
            "status": "pending",
            "priority": "high",
            "aircraft": { "tail_number": "N512FO" }
        }))];
        let out = render_records(&OutputFormat::Table, descriptor, &rows, false).unwrap();
        for column in descriptor.columns {
            assert!(out.contains(column.header), "missing header {}", column.header);
        }
        assert!(out.contains("Replace brake pads"));
        assert!(out.contains("N512FO"));
    }

    #[test]
    fn plain_lists_ids_in_order() {
        let rows = vec![record(json!({ "id": "a2" })), record(json!({ "id": "a1" }))];
        let out = render_records(
            &OutputFormat::Plain,
            EntityKind::Aircraft.descriptor(),
            &rows,
            false,
        )
        .unwrap();
        assert_eq!(out, "a2\na1");
    }

    #[test]
    fn compact_json_keeps_backend_rows() {
        let rows = vec![record(json!({ "id": "p1", "quantity_available": 4 }))];
        let out = render_records(
            &OutputFormat::JsonCompact,
            EntityKind::Inventory.descriptor(),
            &rows,
            false,
        )
        .unwrap();
        assert_eq!(out, r#"[{"id":"p1","quantity_available":4}]"#);
    }

    #[test]
    fn pairs_align_and_mark_empty_values() {
        let out = render_pairs(&[("Tail", "N1"), ("Manufacturer", "")]);
        assert_eq!(out, "Tail:          N1\nManufacturer:  -");
    }
}
