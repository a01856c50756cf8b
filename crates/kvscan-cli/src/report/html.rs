use std::fmt::Write;

use kvscan_core::Tier;

use super::ExportView;

const STYLE: &str = "body{font-family:sans-serif;margin:2em;color:#222}\
table{border-collapse:collapse;margin-bottom:1.5em}\
td,th{border:1px solid #ccc;padding:4px 8px;text-align:left;vertical-align:top}\
th{background:#f0f0f0}\
pre{margin:0;white-space:pre-wrap;word-break:break-all;max-width:60em}\
.high{color:#b00020;font-weight:bold}.medium{color:#b36b00}.low{color:#2e7d32}\
.notice{background:#fff3cd;padding:6px 10px;margin:4px 0}";

pub fn render(view: &ExportView<'_>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_page(&mut out, view);
    out
}

fn write_page(out: &mut String, view: &ExportView<'_>) -> std::fmt::Result {
    let report = view.report;
    let info = &report.info;
    let aggregate = &report.aggregate;

    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html lang=\"en\"><head><meta charset=\"utf-8\">")?;
    writeln!(out, "<title>kvscan report {}</title>", escape(&info.run_id))?;
    writeln!(out, "<style>{}</style></head><body>", STYLE)?;
    writeln!(out, "<h1>kvscan report</h1>")?;

    writeln!(out, "<table>")?;
    row(out, "Database", &info.database)?;
    if let Some(size) = info.database_size {
        row(out, "Size", &format!("{} bytes", size))?;
    }
    if let Some(hash) = &info.database_hash {
        row(out, "BLAKE3", hash)?;
    }
    row(out, "Run", &info.run_id)?;
    row(out, "Analyzed at", &info.analyzed_at.to_string())?;
    row(out, "Rows scanned", &info.rows_scanned.to_string())?;
    row(out, "Total matches", &aggregate.total.to_string())?;
    if report.truncated {
        row(out, "Truncated", "stopped early at the result cap")?;
    }
    if !view.include_sensitive {
        row(out, "Masked fields", &view.redactions.len().to_string())?;
    }
    writeln!(out, "</table>")?;

    for notice in &report.notices {
        writeln!(out, "<div class=\"notice\">{}</div>", escape(notice))?;
    }

    writeln!(out, "<h2>Sensitivity</h2><table><tr><th>Tier</th><th>Count</th><th>%</th></tr>")?;
    for tier in Tier::ALL {
        writeln!(
            out,
            "<tr><td class=\"{0}\">{0}</td><td>{1}</td><td>{2:.1}</td></tr>",
            tier.as_str(),
            aggregate.by_sensitivity.get(tier),
            aggregate.sensitivity_percent.get(tier)
        )?;
    }
    writeln!(out, "</table>")?;

    writeln!(
        out,
        "<h2>Categories</h2><table><tr><th>Category</th><th>Count</th><th>%</th>\
         <th>High</th><th>Medium</th><th>Low</th></tr>"
    )?;
    for (name, count) in &aggregate.by_category {
        let tiers = aggregate
            .category_sensitivity
            .get(name)
            .copied()
            .unwrap_or_default();
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{:.1}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(name),
            count,
            aggregate.category_percent.get(name).copied().unwrap_or(0.0),
            tiers.high,
            tiers.medium,
            tiers.low
        )?;
    }
    writeln!(out, "</table>")?;

    if !aggregate.top_keywords.is_empty() {
        writeln!(out, "<h2>Top keywords</h2><table><tr><th>Keyword</th><th>Count</th></tr>")?;
        for entry in &aggregate.top_keywords {
            writeln!(
                out,
                "<tr><td>{}</td><td>{}</td></tr>",
                escape(&entry.keyword),
                entry.count
            )?;
        }
        writeln!(out, "</table>")?;
    }

    for category in view.categories.iter().filter(|c| !c.matches.is_empty()) {
        writeln!(out, "<h2>{} ({})</h2>", escape(&category.name), category.matches.len())?;
        writeln!(
            out,
            "<table><tr><th>Table</th><th>Sensitivity</th><th>Keywords</th><th>Data</th></tr>"
        )?;
        for m in &category.matches {
            let data: serde_json::Map<String, serde_json::Value> =
                m.data.iter().cloned().collect();
            let data = serde_json::to_string_pretty(&data).unwrap_or_default();
            writeln!(
                out,
                "<tr><td>{}</td><td class=\"{}\">{}</td><td>{}</td><td><pre>{}</pre></td></tr>",
                escape(&m.source_table),
                m.sensitivity.as_str(),
                m.sensitivity.as_str(),
                escape(&m.matched_keywords.join(", ")),
                escape(&data)
            )?;
        }
        writeln!(out, "</table>")?;
    }

    if !report.warnings.is_empty() {
        writeln!(out, "<h2>Warnings</h2><ul>")?;
        for warning in &report.warnings {
            let table = warning.table.as_deref().unwrap_or("-");
            writeln!(
                out,
                "<li>[{}] {}</li>",
                escape(table),
                escape(&warning.message)
            )?;
        }
        writeln!(out, "</ul>")?;
    }

    writeln!(out, "</body></html>")
}

fn row(out: &mut String, label: &str, value: &str) -> std::fmt::Result {
    writeln!(out, "<tr><th>{}</th><td>{}</td></tr>", label, escape(value))
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
