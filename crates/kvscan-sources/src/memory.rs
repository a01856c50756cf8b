use async_trait::async_trait;
use kvscan_core::{RowOutcome, Value};

use crate::handler::{RecordSource, SourceInfo};

struct MemoryTable {
    name: String,
    columns: Result<Vec<String>, String>,
    rows: Vec<RowOutcome>,
}

/// In-memory source for fixtures and ad-hoc data
#[derive(Default)]
pub struct MemorySource {
    tables: Vec<MemoryTable>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table<C>(self, name: impl Into<String>, columns: C, rows: Vec<Vec<Value>>) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let rows = rows.into_iter().map(RowOutcome::Row).collect();
        self.with_outcomes(name, columns, rows)
    }

    /// Add a table whose rows may include undecodable entries
    pub fn with_outcomes<C>(
        mut self,
        name: impl Into<String>,
        columns: C,
        rows: Vec<RowOutcome>,
    ) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
    {
        self.tables.push(MemoryTable {
            name: name.into(),
            columns: Ok(columns.into_iter().map(Into::into).collect()),
            rows,
        });
        self
    }

    /// Add a table whose schema cannot be read
    pub fn with_broken_table(mut self, name: impl Into<String>, reason: impl Into<String>) -> Self {
        self.tables.push(MemoryTable {
            name: name.into(),
            columns: Err(reason.into()),
            rows: Vec::new(),
        });
        self
    }

    fn table(&self, name: &str) -> anyhow::Result<&MemoryTable> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| anyhow::anyhow!("no such table: {}", name))
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    fn info(&self) -> SourceInfo {
        SourceInfo {
            location: "memory".to_string(),
            size_bytes: None,
            fingerprint: None,
        }
    }

    async fn list_tables(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn list_columns(&self, table: &str) -> anyhow::Result<Vec<String>> {
        match &self.table(table)?.columns {
            Ok(columns) => Ok(columns.clone()),
            Err(reason) => Err(anyhow::anyhow!("{}", reason)),
        }
    }

    async fn count_rows(&self, table: &str) -> anyhow::Result<u64> {
        Ok(self.table(table)?.rows.len() as u64)
    }

    async fn fetch_page(
        &self,
        table: &str,
        offset: usize,
        limit: usize,
    ) -> anyhow::Result<Vec<RowOutcome>> {
        let rows = &self.table(table)?.rows;
        Ok(rows.iter().skip(offset).take(limit).cloned().collect())
    }
}
