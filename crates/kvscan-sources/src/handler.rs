//! Record source trait

use async_trait::async_trait;
use kvscan_core::RowOutcome;

/// Descriptive facts about an opened source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceInfo {
    pub location: String,
    pub size_bytes: Option<u64>,
    pub fingerprint: Option<String>,
}

/// A tabular store read row by row.
///
/// Rows are aligned with `list_columns(table)`. Implementations must page
/// through large tables instead of loading them whole.
#[async_trait]
pub trait RecordSource: Send + Sync {
    fn info(&self) -> SourceInfo;

    /// Table names in a stable order
    async fn list_tables(&self) -> anyhow::Result<Vec<String>>;

    /// Column names in declaration order
    async fn list_columns(&self, table: &str) -> anyhow::Result<Vec<String>>;

    /// Total rows, used only for progress reporting
    async fn count_rows(&self, table: &str) -> anyhow::Result<u64>;

    /// Fetch at most `limit` rows starting at `offset`
    async fn fetch_page(
        &self,
        table: &str,
        offset: usize,
        limit: usize,
    ) -> anyhow::Result<Vec<RowOutcome>>;
}
