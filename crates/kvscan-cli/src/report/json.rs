use std::collections::BTreeMap;

use anyhow::Result;
use kvscan_core::{AggregateSnapshot, AnalysisInfo, Credential, ScanWarning};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use super::{ExportCategory, ExportView};

#[derive(Serialize)]
struct JsonReport<'a> {
    analysis_info: JsonInfo<'a>,
    aggregate: &'a AggregateSnapshot,
    #[serde(serialize_with = "serialize_categories")]
    categories: &'a [ExportCategory],
    /// Grouped by credential type
    credentials: BTreeMap<&'static str, Vec<&'a Credential>>,
    warnings: &'a [ScanWarning],
    notices: &'a [String],
    truncated: bool,
}

#[derive(Serialize)]
struct JsonInfo<'a> {
    #[serde(flatten)]
    info: &'a AnalysisInfo,
    include_sensitive: bool,
    redacted_fields: usize,
}

fn serialize_categories<S: Serializer>(
    categories: &[ExportCategory],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(categories.len()))?;
    for category in categories {
        map.serialize_entry(&category.name, &category.matches)?;
    }
    map.end()
}

/// Full-fidelity report
pub fn render(view: &ExportView<'_>) -> Result<String> {
    let report = view.report;

    let mut credentials: BTreeMap<&'static str, Vec<&Credential>> = BTreeMap::new();
    for credential in &view.credentials {
        credentials
            .entry(credential.kind.as_str())
            .or_default()
            .push(credential);
    }

    let json = JsonReport {
        analysis_info: JsonInfo {
            info: &report.info,
            include_sensitive: view.include_sensitive,
            redacted_fields: view.redactions.len(),
        },
        aggregate: &report.aggregate,
        categories: &view.categories,
        credentials,
        warnings: &report.warnings,
        notices: &report.notices,
        truncated: report.truncated,
    };

    Ok(serde_json::to_string_pretty(&json)?)
}
