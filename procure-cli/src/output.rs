//! Rendering tables and facets for the terminal

use procure_lib::model::FacetValue;
use procure_lib::model::Record;
use procure_lib::table::TableModel;
use procure_lib::table::TableState;
use serde_json::Value;
use serde_json::json;

use crate::error::CliError;

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Renders rows as a left-aligned text table with a header line.
pub fn render_table(fields: &[String], rows: &[Record]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| fields.iter().map(|f| cell(row.get(f))).collect())
        .collect();

    let widths: Vec<usize> = fields
        .iter()
        .enumerate()
        .map(|(i, f)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(f.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: &[String]| {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<width$}", v, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = line(fields);
    out.push('\n');
    for row in &cells {
        out.push_str(&line(row));
        out.push('\n');
    }
    out
}

/// Renders the page, paging position and shareable query string as JSON.
pub fn render_json(model: &TableModel, state: &TableState, query: &str) -> Result<String, CliError> {
    let value = json!({
        "rows": model.rows,
        "total_count": model.total_count,
        "page": state.page_index + 1,
        "page_size": state.page_size,
        "url": query,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Renders facet values, one `value<TAB>count` per line.
pub fn render_facets(values: &[FacetValue]) -> String {
    values
        .iter()
        .map(|v| format!("{}\t{}\n", v.label(), v.count))
        .collect()
}
