use kvscan_core::RowOutcome;

use crate::RecordSource;

/// Lazy paged iteration over one table
pub struct TableScan<'a, S: RecordSource + ?Sized> {
    source: &'a S,
    table: String,
    batch_size: usize,
    offset: usize,
    done: bool,
}

impl<'a, S: RecordSource + ?Sized> TableScan<'a, S> {
    pub fn new(source: &'a S, table: impl Into<String>, batch_size: usize) -> Self {
        Self {
            source,
            table: table.into(),
            batch_size: batch_size.max(1),
            offset: 0,
            done: false,
        }
    }

    /// Next page of rows, or `None` once the table is exhausted
    pub async fn next_batch(&mut self) -> anyhow::Result<Option<Vec<RowOutcome>>> {
        if self.done {
            return Ok(None);
        }

        let rows = self
            .source
            .fetch_page(&self.table, self.offset, self.batch_size)
            .await?;

        if rows.len() < self.batch_size {
            self.done = true;
        }
        if rows.is_empty() {
            return Ok(None);
        }

        self.offset += rows.len();
        Ok(Some(rows))
    }

    /// Rows handed out so far
    pub fn rows_read(&self) -> usize {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemorySource;
    use kvscan_core::Value;

    fn source(rows: usize) -> MemorySource {
        MemorySource::new().with_table(
            "t",
            vec!["key"],
            (0..rows).map(|i| vec![Value::from(i as i64)]).collect(),
        )
    }

    #[tokio::test]
    async fn test_pages_cover_all_rows() {
        let src = source(7);
        let mut scan = TableScan::new(&src, "t", 3);

        let mut sizes = Vec::new();
        while let Some(batch) = scan.next_batch().await.unwrap() {
            sizes.push(batch.len());
        }

        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(scan.rows_read(), 7);
    }

    #[tokio::test]
    async fn test_exact_multiple_ends_cleanly() {
        let src = source(4);
        let mut scan = TableScan::new(&src, "t", 2);

        assert_eq!(scan.next_batch().await.unwrap().map(|b| b.len()), Some(2));
        assert_eq!(scan.next_batch().await.unwrap().map(|b| b.len()), Some(2));
        assert!(scan.next_batch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_zero_batch_size_is_clamped() {
        let src = source(2);
        let mut scan = TableScan::new(&src, "t", 0);
        assert_eq!(scan.next_batch().await.unwrap().map(|b| b.len()), Some(1));
    }
}
