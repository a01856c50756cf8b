use std::fmt::Write;

use kvscan_core::{CredentialKind, Tier};

use super::ExportView;

/// Human summary, also printed to stdout after a scan
pub fn render(view: &ExportView<'_>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_summary(&mut out, view);
    out
}

fn write_summary(out: &mut String, view: &ExportView<'_>) -> std::fmt::Result {
    let report = view.report;
    let info = &report.info;
    let aggregate = &report.aggregate;

    writeln!(out, "kvscan report")?;
    writeln!(out, "=============")?;
    writeln!(out, "Database:    {}", info.database)?;
    if let Some(size) = info.database_size {
        writeln!(out, "Size:        {} bytes", size)?;
    }
    if let Some(hash) = &info.database_hash {
        writeln!(out, "BLAKE3:      {}", hash)?;
    }
    writeln!(out, "Run:         {}", info.run_id)?;
    writeln!(out, "Analyzed at: {}", info.analyzed_at)?;
    writeln!(
        out,
        "Mode:        {:?} (batch size {}{})",
        info.mode,
        info.batch_size,
        info.max_results
            .map(|n| format!(", cap {}", n))
            .unwrap_or_default()
    )?;
    writeln!(
        out,
        "Scanned:     {} rows in {} tables, {} ms",
        info.rows_scanned,
        info.tables_scanned.len(),
        info.elapsed_ms
    )?;
    writeln!(
        out,
        "Sensitive:   {}",
        if view.include_sensitive {
            "included".to_string()
        } else {
            format!("masked ({} fields)", view.redactions.len())
        }
    )?;

    writeln!(out)?;
    writeln!(out, "Total matches: {}", aggregate.total)?;
    if report.truncated {
        writeln!(out, "  (stopped early at the result cap)")?;
    }

    if !aggregate.by_category.is_empty() {
        writeln!(out)?;
        writeln!(out, "By category:")?;
        for (name, count) in &aggregate.by_category {
            let percent = aggregate.category_percent.get(name).copied().unwrap_or(0.0);
            let tiers = aggregate
                .category_sensitivity
                .get(name)
                .copied()
                .unwrap_or_default();
            writeln!(
                out,
                "  {:<20} {:>6} ({:>5.1}%)  high {}, medium {}, low {}",
                name, count, percent, tiers.high, tiers.medium, tiers.low
            )?;
        }
    }

    writeln!(out)?;
    writeln!(out, "By sensitivity:")?;
    for tier in Tier::ALL {
        writeln!(
            out,
            "  {:<8} {:>6} ({:>5.1}%)",
            tier.as_str(),
            aggregate.by_sensitivity.get(tier),
            aggregate.sensitivity_percent.get(tier)
        )?;
    }

    if !aggregate.top_keywords.is_empty() {
        writeln!(out)?;
        writeln!(out, "Top keywords:")?;
        for entry in &aggregate.top_keywords {
            writeln!(out, "  {:<20} {}", entry.keyword, entry.count)?;
        }
    }

    if !aggregate.pattern_hits.is_empty() {
        writeln!(out)?;
        writeln!(out, "Pattern hits:")?;
        for (category, hits) in &aggregate.pattern_hits {
            for (pattern, count) in hits {
                writeln!(out, "  {:<20} {:<24} {}", category, pattern, count)?;
            }
        }
    }

    if !report.credentials.is_empty() {
        writeln!(out)?;
        writeln!(out, "Credential-like keys:")?;
        for kind in CredentialKind::ALL {
            let count = report.credentials.iter().filter(|c| c.kind == kind).count();
            if count > 0 {
                writeln!(out, "  {:<16} {}", kind.as_str(), count)?;
            }
        }
    }

    if !report.notices.is_empty() {
        writeln!(out)?;
        writeln!(out, "Notices:")?;
        for notice in &report.notices {
            writeln!(out, "  ! {}", notice)?;
        }
    }

    if !report.warnings.is_empty() {
        writeln!(out)?;
        writeln!(out, "Warnings ({}):", report.warnings.len())?;
        for warning in &report.warnings {
            match &warning.table {
                Some(table) => writeln!(out, "  [{}] {}", table, warning.message)?,
                None => writeln!(out, "  {}", warning.message)?,
            }
        }
    }

    Ok(())
}
