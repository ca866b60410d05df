use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;

pub mod table;

pub use table::TableOptions;

/// Render a serializable response in the requested format.
///
/// Table output for arbitrary values is generic: arrays of objects become one
/// row per element, objects become key/value rows. Commands with a better
/// tabular view build their own rows with [`table::render_table`].
pub fn render<T: Serialize>(
    value: &T,
    format: OutputFormat,
    options: TableOptions,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
        OutputFormat::Table => Ok(render_value_table(serde_json::to_value(value)?, options)),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format, TableOptions::from_env())?;
    println!("{rendered}");
    Ok(())
}

fn render_value_table(value: Value, options: TableOptions) -> String {
    match value {
        Value::Array(items) => render_array_table(&items, options),
        Value::Object(map) => {
            let rows = map
                .into_iter()
                .map(|(key, value)| vec![key, cell(&value)])
                .collect::<Vec<_>>();
            table::render_table(&["key", "value"], &rows, options)
        }
        scalar => table::render_table(&["value"], &[vec![cell(&scalar)]], options),
    }
}

fn render_array_table(items: &[Value], options: TableOptions) -> String {
    if items.is_empty() {
        return String::from("(no rows)");
    }
    if !items.iter().all(Value::is_object) {
        let rows = items.iter().map(|item| vec![cell(item)]).collect::<Vec<_>>();
        return table::render_table(&["value"], &rows, options);
    }

    // Column order follows first appearance.
    let mut headers = Vec::<String>::new();
    for map in items.iter().filter_map(Value::as_object) {
        for key in map.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let header_refs = headers.iter().map(String::as_str).collect::<Vec<_>>();
    let rows = items
        .iter()
        .filter_map(Value::as_object)
        .map(|map| {
            headers
                .iter()
                .map(|header| map.get(header).map_or_else(|| String::from("-"), cell))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    table::render_table(&header_refs, &rows, options)
}

pub fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("-"),
        Value::Bool(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => v.clone(),
        other => other.to_string(),
    }
}
