//! Output formatting: JSON, YAML, table, plain.
//!
//! REST responses are arbitrary JSON, so rendering works on
//! `serde_json::Value`. Table output uses `tabled` with the scalar fields
//! of each item as columns; plain emits one id (or value) per line.

use std::io::{self, Write};

use serde_json::Value;
use tabled::{builder::Builder, settings::Style};

use crate::cli::OutputFormat;

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a REST response body in the chosen format.
pub fn render_value(format: OutputFormat, data: &Value) -> String {
    match format {
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Table => render_table(data),
        OutputFormat::Plain => render_plain(data),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`; plain uses `id_fn`.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    if compact {
        serde_json::to_string(data).expect("serialization should not fail")
    } else {
        serde_json::to_string_pretty(data).expect("serialization should not fail")
    }
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).expect("serialization should not fail")
}

/// `{"rendered": "..."}` objects (titles, content) flatten to their text.
fn cell(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("rendered").and_then(Value::as_str).map(str::to_owned),
        Value::Array(_) => None,
    }
}

fn render_table(data: &Value) -> String {
    let items: Vec<&Value> = match data {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    let Some(Value::Object(first)) = items.first() else {
        return render_plain(data);
    };
    let columns: Vec<&String> = first
        .iter()
        .filter(|(_, v)| cell(v).is_some())
        .map(|(k, _)| k)
        .collect();

    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| c.to_uppercase()));
    for item in &items {
        builder.push_record(
            columns
                .iter()
                .map(|c| item.get(c.as_str()).and_then(cell).unwrap_or_default()),
        );
    }
    builder.build().with(Style::rounded()).to_string()
}

fn render_plain(data: &Value) -> String {
    match data {
        Value::Array(items) => items.iter().map(plain_line).collect::<Vec<_>>().join("\n"),
        other => plain_line(other),
    }
}

fn plain_line(value: &Value) -> String {
    match value {
        Value::Object(map) => map
            .get("id")
            .and_then(cell)
            .unwrap_or_else(|| render_json(value, true)),
        other => cell(other).unwrap_or_else(|| render_json(other, true)),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn plain_lists_ids() {
        let data = json!([{ "id": 1, "slug": "a" }, { "id": 2, "slug": "b" }]);
        assert_eq!(render_value(OutputFormat::Plain, &data), "1\n2");
    }

    #[test]
    fn plain_scalar_and_idless_object() {
        assert_eq!(render_value(OutputFormat::Plain, &json!("abc123")), "abc123");
        assert_eq!(
            render_value(OutputFormat::Plain, &json!({ "deleted": true })),
            r#"{"deleted":true}"#
        );
    }

    #[test]
    fn table_flattens_rendered_fields() {
        let data = json!([
            { "id": 7, "title": { "rendered": "Hello" }, "tags": [1, 2] }
        ]);
        let table = render_value(OutputFormat::Table, &data);
        assert!(table.contains("ID"));
        assert!(table.contains("TITLE"));
        assert!(table.contains("Hello"));
        assert!(!table.contains("TAGS"));
    }

    #[test]
    fn compact_json_is_single_line() {
        let out = render_value(OutputFormat::JsonCompact, &json!({ "a": [1, 2] }));
        assert_eq!(out, r#"{"a":[1,2]}"#);
    }

    #[test]
    fn yaml_output() {
        let out = render_value(OutputFormat::Yaml, &json!({ "name": "Site" }));
        assert_eq!(out.trim(), "name: Site");
    }
}
