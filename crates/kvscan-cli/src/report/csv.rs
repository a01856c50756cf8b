use anyhow::Result;

use super::ExportView;

const HEADER: [&str; 6] = [
    "source_table",
    "category",
    "sensitivity",
    "matched_keywords",
    "matched_patterns",
    "data",
];

/// One row per match; list columns are `;`-joined and `data` is compact JSON
pub fn render(view: &ExportView<'_>) -> Result<String> {
    let mut out = String::new();
    push_row(&mut out, HEADER.iter().map(|h| h.to_string()));

    for m in view.matches() {
        let data: serde_json::Map<String, serde_json::Value> = m.data.iter().cloned().collect();
        push_row(
            &mut out,
            [
                m.source_table.clone(),
                m.category.clone(),
                m.sensitivity.to_string(),
                m.matched_keywords.join(";"),
                m.matched_patterns.join(";"),
                serde_json::to_string(&data)?,
            ],
        );
    }

    Ok(out)
}

fn push_row(out: &mut String, cells: impl IntoIterator<Item = String>) {
    let line: Vec<String> = cells.into_iter().map(|c| escape(&c)).collect();
    out.push_str(&line.join(","));
    out.push_str("\r\n");
}

fn escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
