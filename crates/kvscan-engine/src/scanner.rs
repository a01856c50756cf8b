use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use kvscan_core::{
    AggregateSnapshot, AnalysisInfo, Credential, Record, RowOutcome, ScanMode, ScanReport,
    ScanWarning, Taxonomy,
};
use kvscan_sources::{RecordSource, TableScan};
use time::OffsetDateTime;

use crate::{Aggregator, Classifier, CredentialExtractor};

/// High-tier count above which the cleanup notice is added
const MANY_HIGH_MATCHES: usize = 10;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Rows per page
    pub batch_size: usize,
    /// Upper bound on accepted matches, `None` for unlimited
    pub max_results: Option<usize>,
    pub mode: ScanMode,
    pub top_keywords: usize,
    pub analyze_patterns: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            batch_size: 500,
            max_results: None,
            mode: ScanMode::Full,
            top_keywords: 10,
            analyze_patterns: true,
        }
    }
}

/// Drives one classification pass over a record source.
///
/// Tables are read strictly in order, page by page. Only a failure to
/// list tables aborts the scan; schema and page errors skip the table and
/// undecodable rows are skipped individually, each leaving a warning in the
/// report.
pub struct Scanner {
    taxonomy: Arc<Taxonomy>,
    classifier: Classifier,
    options: ScanOptions,
}

impl Scanner {
    pub fn new(taxonomy: Arc<Taxonomy>, options: ScanOptions) -> Self {
        let classifier =
            Classifier::new(taxonomy.clone()).with_patterns(options.analyze_patterns);
        Self {
            taxonomy,
            classifier,
            options,
        }
    }

    pub async fn scan<S: RecordSource + ?Sized>(&self, source: &S) -> Result<ScanReport> {
        let started = Instant::now();
        let analyzed_at = OffsetDateTime::now_utc();
        let source_info = source.info();

        let tables = source
            .list_tables()
            .await
            .with_context(|| format!("failed to list tables in {}", source_info.location))?;

        let mut aggregator = Aggregator::new(&self.taxonomy, self.options.top_keywords);
        let mut credentials: Vec<Credential> = Vec::new();
        let mut warnings: Vec<ScanWarning> = Vec::new();
        let mut tables_scanned = Vec::new();
        let mut rows_scanned = 0usize;
        let mut truncated = false;

        'tables: for table in &tables {
            let columns = match source.list_columns(table).await {
                Ok(columns) => columns,
                Err(e) => {
                    tracing::warn!("Skipping table {}: {:#}", table, e);
                    warnings.push(ScanWarning::table(
                        table,
                        format!("schema unreadable: {:#}", e),
                    ));
                    continue;
                }
            };

            // Only used for progress output
            let total_rows = source.count_rows(table).await.ok();
            tracing::info!(
                "Scanning table {} ({} rows)",
                table,
                total_rows.map_or_else(|| "?".to_string(), |n| n.to_string())
            );
            tables_scanned.push(table.clone());

            let mut scan = TableScan::new(source, table.as_str(), self.options.batch_size);
            loop {
                let batch = match scan.next_batch().await {
                    Ok(Some(batch)) => batch,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!("Stopping table {} after read error: {:#}", table, e);
                        warnings.push(ScanWarning::table(
                            table,
                            format!("read failed at row {}: {:#}", scan.rows_read(), e),
                        ));
                        break;
                    }
                };

                let first_row = scan.rows_read() - batch.len();
                for (i, outcome) in batch.into_iter().enumerate() {
                    let values = match outcome {
                        RowOutcome::Row(values) => values,
                        RowOutcome::Skipped(reason) => {
                            tracing::warn!(
                                "Skipping row {} of {}: {}",
                                first_row + i,
                                table,
                                reason
                            );
                            warnings.push(ScanWarning::table(
                                table,
                                format!("row {} skipped: {}", first_row + i, reason),
                            ));
                            continue;
                        }
                    };

                    rows_scanned += 1;
                    let record = Record::new(table.as_str(), &columns, values);

                    let mut accepted = false;
                    for m in self.classifier.classify(&record) {
                        if self.cap_reached(aggregator.total()) {
                            truncated = true;
                            break;
                        }
                        aggregator.record(m);
                        accepted = true;
                    }
                    if accepted {
                        credentials.extend(CredentialExtractor::extract(&record));
                    }
                    if truncated {
                        tracing::info!(
                            "Result cap of {} reached, stopping scan",
                            aggregator.total()
                        );
                        break 'tables;
                    }
                }

                progress(table, scan.rows_read(), total_rows, aggregator.total());
            }
        }

        let aggregate = aggregator.snapshot();
        let notices = notices(&aggregate, &aggregator);
        credentials.sort_by_key(|c| c.kind);

        let info = AnalysisInfo {
            run_id: uuid::Uuid::new_v4().to_string(),
            database: source_info.location,
            database_size: source_info.size_bytes,
            database_hash: source_info.fingerprint,
            analyzed_at,
            mode: self.options.mode,
            batch_size: self.options.batch_size,
            max_results: self.options.max_results,
            tables_scanned,
            rows_scanned,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        tracing::info!(
            "Scan finished: {} matches in {} rows across {} tables ({} warnings)",
            aggregate.total,
            info.rows_scanned,
            info.tables_scanned.len(),
            warnings.len()
        );

        Ok(ScanReport {
            info,
            categories: aggregator.into_categories(),
            aggregate,
            credentials,
            warnings,
            notices,
            truncated,
        })
    }

    fn cap_reached(&self, accepted: usize) -> bool {
        self.options.max_results.is_some_and(|max| accepted >= max)
    }
}

fn progress(table: &str, processed: usize, total: Option<u64>, matches: usize) {
    match total {
        Some(total) if total > 0 => tracing::debug!(
            "{}: {}/{} ({:.1}%), {} matches so far",
            table,
            processed,
            total,
            processed as f64 * 100.0 / total as f64,
            matches
        ),
        _ => tracing::debug!("{}: {} rows, {} matches so far", table, processed, matches),
    }
}

fn notices(aggregate: &AggregateSnapshot, aggregator: &Aggregator) -> Vec<String> {
    let mut notices = Vec::new();
    let high = aggregate.by_sensitivity.high;

    if high > 0 {
        notices.push(format!(
            "{} high-sensitivity matches found; keep exported reports private",
            high
        ));
    }
    if high > MANY_HIGH_MATCHES {
        notices.push(
            "Large amount of sensitive data stored; consider signing out to clear cached sessions"
                .to_string(),
        );
    }
    if aggregator.has_keyword("token") {
        notices.push(
            "Authentication tokens present; never share this store or unredacted reports"
                .to_string(),
        );
    }

    notices
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvscan_config::Config;
    use kvscan_core::{Tier, Value};
    use kvscan_sources::MemorySource;

    fn taxonomy() -> Arc<Taxonomy> {
        Arc::new(Config::default().taxonomy().unwrap())
    }

    fn item_table(rows: &[(&str, &str)]) -> MemorySource {
        MemorySource::new().with_table(
            "ItemTable",
            ["key", "value"],
            rows.iter()
                .map(|(k, v)| vec![Value::from(*k), Value::from(*v)])
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_scan_two_rows() {
        let source = item_table(&[
            ("auth_token", "Bearer abc123xyz789secretvalue"),
            ("plan_type", "pro_trial"),
        ]);
        let report = Scanner::new(taxonomy(), ScanOptions::default())
            .scan(&source)
            .await
            .unwrap();

        assert_eq!(report.aggregate.total, 2);
        assert_eq!(report.aggregate.by_category.len(), 2);
        assert_eq!(report.aggregate.by_category["authentication"], 1);
        assert_eq!(report.aggregate.by_category["subscription"], 1);

        let auth = &report.category("authentication").unwrap().matches[0];
        assert_eq!(auth.sensitivity, Tier::High);
        let sub = &report.category("subscription").unwrap().matches[0];
        assert_eq!(sub.sensitivity, Tier::Low);

        assert_eq!(report.info.rows_scanned, 2);
        assert_eq!(report.info.tables_scanned, vec!["ItemTable"]);
        assert!(!report.truncated);
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_empty_source() {
        let report = Scanner::new(taxonomy(), ScanOptions::default())
            .scan(&MemorySource::new())
            .await
            .unwrap();

        assert!(report.is_empty());
        assert_eq!(report.aggregate.sensitivity_percent.high, 0.0);
        assert!(report.notices.is_empty());
    }

    #[tokio::test]
    async fn test_cap_truncates() {
        let rows: Vec<(&str, &str)> = vec![("token", "a"); 5];
        let options = ScanOptions {
            max_results: Some(3),
            ..Default::default()
        };
        let report = Scanner::new(taxonomy(), options)
            .scan(&item_table(&rows))
            .await
            .unwrap();

        assert_eq!(report.aggregate.total, 3);
        assert!(report.truncated);
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_cap_not_hit_exactly() {
        let rows: Vec<(&str, &str)> = vec![("token", "a"); 3];
        let options = ScanOptions {
            max_results: Some(3),
            ..Default::default()
        };
        let report = Scanner::new(taxonomy(), options)
            .scan(&item_table(&rows))
            .await
            .unwrap();

        assert_eq!(report.aggregate.total, 3);
        assert!(!report.truncated);
    }

    #[tokio::test]
    async fn test_broken_table_and_skipped_row_become_warnings() {
        let source = MemorySource::new()
            .with_broken_table("Broken", "malformed schema")
            .with_outcomes(
                "ItemTable",
                ["key", "value"],
                vec![
                    RowOutcome::Skipped("invalid utf-8".to_string()),
                    RowOutcome::Row(vec![Value::from("session"), Value::from("x")]),
                ],
            );

        let report = Scanner::new(taxonomy(), ScanOptions::default())
            .scan(&source)
            .await
            .unwrap();

        assert_eq!(report.warnings.len(), 2);
        assert_eq!(report.warnings[0].table.as_deref(), Some("Broken"));
        assert!(report.warnings[1].message.contains("row 0 skipped"));
        assert_eq!(report.aggregate.by_category["authentication"], 1);
        assert_eq!(report.info.tables_scanned, vec!["ItemTable"]);
    }

    #[tokio::test]
    async fn test_notices() {
        let rows: Vec<(&str, &str)> = vec![("accessToken", "x"); 11];
        let report = Scanner::new(taxonomy(), ScanOptions::default())
            .scan(&item_table(&rows))
            .await
            .unwrap();

        assert_eq!(report.notices.len(), 3);
        assert!(report.notices[0].starts_with("11 high-sensitivity"));
    }

    #[tokio::test]
    async fn test_credentials_extracted_once_per_record() {
        let source = item_table(&[(
            "cursorAuth/session",
            r#"{"accessToken":"abc","status":"active"}"#,
        )]);
        let report = Scanner::new(taxonomy(), ScanOptions::default())
            .scan(&source)
            .await
            .unwrap();

        // authentication and account_status both match the record
        assert!(report.aggregate.total >= 2);
        assert_eq!(report.credentials.len(), 2);
        assert_eq!(report.credentials[0].key, "accessToken");
    }
}
