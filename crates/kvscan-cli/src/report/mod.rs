//! Report artifacts written after a scan
//!
//! Every renderer works on an [`ExportView`], which carries the matches and
//! credentials as they may leave the process: sensitive columns and
//! credential previews masked unless the caller opted in. The aggregate is always taken from the unredacted
//! report.

pub mod csv;
pub mod html;
pub mod json;
pub mod text;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kvscan_core::{AnalysisInfo, Credential, Field, Match, ScanReport, Tier};
use kvscan_security::{RedactionInfo, Redactor};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    Json,
    Csv,
    Txt,
    Html,
}

impl Format {
    pub const ALL: [Format; 4] = [Format::Json, Format::Csv, Format::Txt, Format::Html];

    pub fn file_name(&self) -> &'static str {
        match self {
            Format::Json => "report.json",
            Format::Csv => "matches.csv",
            Format::Txt => "summary.txt",
            Format::Html => "report.html",
        }
    }

    /// Parse the names used in the config file. Unknown names are dropped
    /// with a warning.
    pub fn from_names(names: &[String]) -> Vec<Format> {
        names
            .iter()
            .filter_map(|name| match <Format as clap::ValueEnum>::from_str(name, true) {
                Ok(format) => Some(format),
                Err(_) => {
                    tracing::warn!("Ignoring unknown report format '{}'", name);
                    None
                }
            })
            .collect()
    }
}

/// A match prepared for export
#[derive(Debug, Clone, Serialize)]
pub struct ExportMatch {
    pub source_table: String,
    pub category: String,
    pub matched_keywords: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matched_patterns: Vec<String>,
    pub sensitivity: Tier,
    #[serde(serialize_with = "serialize_data")]
    pub data: Vec<(String, serde_json::Value)>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub redacted: bool,
}

fn serialize_data<S: Serializer>(
    data: &[(String, serde_json::Value)],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(data.len()))?;
    for (name, value) in data {
        map.serialize_entry(name, value)?;
    }
    map.end()
}

#[derive(Debug, Clone)]
pub struct ExportCategory {
    pub name: String,
    pub matches: Vec<ExportMatch>,
}

pub struct ExportView<'a> {
    pub report: &'a ScanReport,
    pub categories: Vec<ExportCategory>,
    pub credentials: Vec<Credential>,
    pub redactions: Vec<RedactionInfo>,
    pub include_sensitive: bool,
}

impl<'a> ExportView<'a> {
    pub fn new(report: &'a ScanReport, redactor: &Redactor, include_sensitive: bool) -> Self {
        let mut redactions = Vec::new();

        let categories = report
            .categories
            .iter()
            .map(|category| ExportCategory {
                name: category.name.clone(),
                matches: category
                    .matches
                    .iter()
                    .map(|m| export_match(m, redactor, include_sensitive, &mut redactions))
                    .collect(),
            })
            .collect();

        let credentials = report
            .credentials
            .iter()
            .map(|credential| {
                let mut credential = credential.clone();
                if !include_sensitive {
                    credential.value_preview = Redactor::mask(&credential.value_preview);
                }
                credential
            })
            .collect();

        Self {
            report,
            categories,
            credentials,
            redactions,
            include_sensitive,
        }
    }

    pub fn info(&self) -> &AnalysisInfo {
        &self.report.info
    }

    pub fn matches(&self) -> impl Iterator<Item = &ExportMatch> {
        self.categories.iter().flat_map(|c| c.matches.iter())
    }
}

fn export_match(
    m: &Match,
    redactor: &Redactor,
    include_sensitive: bool,
    redactions: &mut Vec<RedactionInfo>,
) -> ExportMatch {
    let fields = if include_sensitive {
        m.record.fields.clone()
    } else {
        let (fields, masked) = redactor.redact(&m.record);
        redactions.extend(masked);
        fields
    };
    let redacted = fields != m.record.fields;

    ExportMatch {
        source_table: m.table.clone(),
        category: m.category.clone(),
        matched_keywords: m.matched_keywords.clone(),
        matched_patterns: m.matched_patterns.clone(),
        sensitivity: m.sensitivity,
        data: fields.iter().map(embed).collect(),
        redacted,
    }
}

/// JSON-looking text is embedded as a document, anything else as a scalar
fn embed(field: &Field) -> (String, serde_json::Value) {
    let value = field
        .value
        .as_structured()
        .or_else(|| serde_json::to_value(&field.value).ok())
        .unwrap_or(serde_json::Value::Null);
    (field.name.clone(), value)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactStatus {
    Written,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct Artifact {
    pub format: Format,
    pub path: PathBuf,
    pub status: ArtifactStatus,
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub dir: PathBuf,
    pub artifacts: Vec<Artifact>,
    pub redacted_fields: usize,
}

impl ExportSummary {
    pub fn failed(&self) -> usize {
        self.artifacts
            .iter()
            .filter(|a| a.status != ArtifactStatus::Written)
            .count()
    }
}

/// Writes the selected formats into a fresh run directory
pub struct ReportWriter {
    output_dir: PathBuf,
    formats: Vec<Format>,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>, formats: Vec<Format>) -> Self {
        Self {
            output_dir: output_dir.into(),
            formats,
        }
    }

    /// Failing to create the run directory is an error; a failing artifact
    /// is recorded and the remaining ones are still written.
    pub fn write(&self, view: &ExportView<'_>) -> Result<ExportSummary> {
        let dir = self.output_dir.join(run_dir_name(view.info()));
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;

        let artifacts = self
            .formats
            .iter()
            .map(|format| {
                let path = dir.join(format.file_name());
                let status = match write_artifact(*format, view, &path) {
                    Ok(()) => {
                        tracing::info!("Wrote {}", path.display());
                        ArtifactStatus::Written
                    }
                    Err(e) => {
                        tracing::warn!("Failed to write {}: {:#}", path.display(), e);
                        ArtifactStatus::Failed(format!("{:#}", e))
                    }
                };
                Artifact {
                    format: *format,
                    path,
                    status,
                }
            })
            .collect();

        Ok(ExportSummary {
            dir,
            artifacts,
            redacted_fields: view.redactions.len(),
        })
    }
}

fn write_artifact(format: Format, view: &ExportView<'_>, path: &Path) -> Result<()> {
    let content = match format {
        Format::Json => json::render(view)?,
        Format::Csv => csv::render(view)?,
        Format::Txt => text::render(view),
        Format::Html => html::render(view),
    };
    std::fs::write(path, content)?;
    Ok(())
}

fn run_dir_name(info: &AnalysisInfo) -> String {
    let format = time::macros::format_description!("[year][month][day]_[hour][minute][second]");
    let short_id = info.run_id.get(..8).unwrap_or(&info.run_id);
    match info.analyzed_at.format(&format) {
        Ok(stamp) => format!("scan_{}_{}", stamp, short_id),
        Err(_) => format!("scan_{}", info.run_id),
    }
}

#[cfg(test)]
pub(crate) mod fixture {
    use kvscan_core::{
        AggregateSnapshot, AnalysisInfo, CategoryMatches, Credential, CredentialKind, Field,
        Match, Record, ScanMode, ScanReport, Tier, TierCounts,
    };

    fn matched(
        category: &str,
        keyword: &str,
        columns: [(&str, &str); 2],
        tier: Tier,
    ) -> Match {
        Match {
            table: "ItemTable".to_string(),
            category: category.to_string(),
            matched_keywords: vec![keyword.to_string()],
            matched_patterns: Vec::new(),
            sensitivity: tier,
            record: Record {
                table: "ItemTable".to_string(),
                fields: columns
                    .iter()
                    .map(|(name, value)| Field::new(*name, *value))
                    .collect(),
            },
        }
    }

    /// One high and one low match, with counts filled in by hand
    pub fn report() -> ScanReport {
        let high = matched(
            "authentication",
            "token",
            [
                ("key", "auth_token"),
                ("token_value", "Bearer abc123xyz789secretvalue"),
            ],
            Tier::High,
        );
        let low = matched(
            "subscription",
            "plan",
            [("name", "plan_type"), ("value", r#"{"plan":"pro","seats":2}"#)],
            Tier::Low,
        );

        let mut aggregate = AggregateSnapshot {
            total: 2,
            by_sensitivity: TierCounts {
                high: 1,
                medium: 0,
                low: 1,
            },
            ..Default::default()
        };
        aggregate.by_category.insert("authentication".to_string(), 1);
        aggregate.by_category.insert("subscription".to_string(), 1);
        aggregate.category_percent.insert("authentication".to_string(), 50.0);
        aggregate.category_percent.insert("subscription".to_string(), 50.0);

        ScanReport {
            info: AnalysisInfo {
                run_id: "0f8fad5b-d9cb-469f-a165-70867728950e".to_string(),
                database: "state.vscdb".to_string(),
                database_size: Some(8192),
                database_hash: None,
                analyzed_at: time::macros::datetime!(2024-05-01 12:30:00 UTC),
                mode: ScanMode::Full,
                batch_size: 500,
                max_results: None,
                tables_scanned: vec!["ItemTable".to_string()],
                rows_scanned: 2,
                elapsed_ms: 3,
            },
            categories: vec![
                CategoryMatches {
                    name: "authentication".to_string(),
                    matches: vec![high],
                },
                CategoryMatches {
                    name: "subscription".to_string(),
                    matches: vec![low],
                },
            ],
            aggregate,
            credentials: vec![Credential {
                key: "accessToken".to_string(),
                value_preview: "eyJhbGciOiJIUzI1NiJ9.payload".to_string(),
                table: "ItemTable".to_string(),
                kind: CredentialKind::Token,
            }],
            warnings: Vec::new(),
            notices: vec!["1 high-sensitivity matches found".to_string()],
            truncated: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_matches_are_redacted_by_default() {
        let report = fixture::report();
        let view = ExportView::new(&report, &Redactor::default(), false);

        let auth = &view.categories[0].matches[0];
        assert!(auth.redacted);
        // "key" is itself a high keyword, so both columns are masked
        assert_eq!(auth.data[0].1, serde_json::json!("***[CENSORED]***"));
        assert_eq!(
            auth.data[1].1,
            serde_json::json!("Bearer abc***[SENSITIVE DATA CENSORED]***value")
        );
        assert_eq!(view.redactions.len(), 2);

        // Low tier passes through and its JSON value is embedded
        let sub = &view.categories[1].matches[0];
        assert!(!sub.redacted);
        assert_eq!(sub.data[1].1["plan"], "pro");

        // The aggregate still sees the real counts
        assert_eq!(view.report.aggregate.by_sensitivity.high, 1);
    }

    #[test]
    fn test_sensitive_column_masked_in_low_tier_match() {
        let mut report = fixture::report();
        let login = &mut report.categories[1].matches[0];
        login.record.table = "accounts".to_string();
        login.record.fields = vec![
            Field::new("login_name", "login-bob"),
            Field::new("password", "hunter2hunter2xyz"),
        ];
        let view = ExportView::new(&report, &Redactor::default(), false);

        let low = &view.categories[1].matches[0];
        assert_eq!(low.sensitivity, Tier::Low);
        assert!(low.redacted);
        assert_eq!(low.data[0].1, serde_json::json!("login-bob"));
        assert_eq!(low.data[1].1, serde_json::json!("hunte***[CENSORED]***"));
        assert!(view.redactions.iter().any(|r| r.column == "password"));
    }

    #[test]
    fn test_credential_previews_masked_by_default() {
        let report = fixture::report();

        let view = ExportView::new(&report, &Redactor::default(), false);
        assert_eq!(
            view.credentials[0].value_preview,
            "eyJhbGciOi***[SENSITIVE DATA CENSORED]***yload"
        );

        let view = ExportView::new(&report, &Redactor::default(), true);
        assert_eq!(
            view.credentials[0].value_preview,
            "eyJhbGciOiJIUzI1NiJ9.payload"
        );
    }

    #[test]
    fn test_include_sensitive_keeps_values() {
        let report = fixture::report();
        let view = ExportView::new(&report, &Redactor::default(), true);

        assert!(view.redactions.is_empty());
        assert_eq!(
            view.categories[0].matches[0].data[1].1,
            serde_json::json!("Bearer abc123xyz789secretvalue")
        );
    }

    #[test]
    fn test_writer_creates_run_dir_with_all_formats() {
        let dir = tempfile::tempdir().unwrap();
        let report = fixture::report();
        let view = ExportView::new(&report, &Redactor::default(), false);

        let summary = ReportWriter::new(dir.path(), Format::ALL.to_vec())
            .write(&view)
            .unwrap();

        assert_eq!(summary.failed(), 0);
        assert_eq!(summary.redacted_fields, 2);
        assert!(summary.dir.ends_with("scan_20240501_123000_0f8fad5b"));
        for artifact in &summary.artifacts {
            assert!(artifact.path.is_file(), "{} missing", artifact.path.display());
        }
    }

    #[test]
    fn test_failed_artifact_does_not_stop_others() {
        let dir = tempfile::tempdir().unwrap();
        let report = fixture::report();
        let view = ExportView::new(&report, &Redactor::default(), false);

        // A directory where the JSON file should go makes that write fail
        let run_dir = dir.path().join(run_dir_name(view.info()));
        std::fs::create_dir_all(run_dir.join("report.json")).unwrap();

        let summary = ReportWriter::new(dir.path(), vec![Format::Json, Format::Txt])
            .write(&view)
            .unwrap();

        assert!(matches!(summary.artifacts[0].status, ArtifactStatus::Failed(_)));
        assert_eq!(summary.artifacts[1].status, ArtifactStatus::Written);
        assert_eq!(summary.failed(), 1);
    }

    #[test]
    fn test_format_names_from_config() {
        let names = vec!["JSON".to_string(), "pdf".to_string(), "csv".to_string()];
        assert_eq!(Format::from_names(&names), vec![Format::Json, Format::Csv]);
    }
}
