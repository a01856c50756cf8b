//! Read-only SQLite record source

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use kvscan_core::{RowOutcome, Value};
use kvscan_sources::{RecordSource, SourceInfo};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, TypeInfo, ValueRef};

use crate::{Result, StorageError};

/// A SQLite file opened read-only
pub struct SqliteSource {
    pool: SqlitePool,
    path: PathBuf,
    size_bytes: u64,
    fingerprint: String,
}

impl SqliteSource {
    /// Open an existing store. A missing or unreadable file is fatal.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(StorageError::NotFound(path));
        }

        let size_bytes = tokio::fs::metadata(&path).await?.len();
        let hashed = path.clone();
        let fingerprint = tokio::task::spawn_blocking(move || fingerprint(&hashed))
            .await
            .map_err(|e| anyhow::anyhow!("fingerprint task failed: {}", e))??;

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        // Fails early with "file is not a database" for non-SQLite files
        sqlx::query("SELECT COUNT(*) FROM sqlite_master")
            .fetch_one(&pool)
            .await?;

        tracing::info!(
            "Opened store {} ({} bytes)",
            path.display(),
            size_bytes
        );

        Ok(Self {
            pool,
            path,
            size_bytes,
            fingerprint,
        })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

fn fingerprint(path: &Path) -> Result<String> {
    let file = std::fs::File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    hasher.update_reader(file)?;
    Ok(hasher.finalize().to_hex().to_string())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn decode_row(row: &SqliteRow) -> RowOutcome {
    match (0..row.len())
        .map(|i| decode_value(row, i))
        .collect::<std::result::Result<Vec<_>, String>>()
    {
        Ok(values) => RowOutcome::Row(values),
        Err(reason) => RowOutcome::Skipped(reason),
    }
}

fn decode_value(row: &SqliteRow, index: usize) -> std::result::Result<Value, String> {
    let raw = row.try_get_raw(index).map_err(|e| e.to_string())?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let decoded = match type_name.as_str() {
        "INTEGER" | "INT8" | "BOOLEAN" => row.try_get_unchecked::<i64, _>(index).map(Value::from),
        "REAL" => row.try_get_unchecked::<f64, _>(index).map(Value::from_f64),
        "BLOB" => row.try_get_unchecked::<Vec<u8>, _>(index).map(Value::Bytes),
        _ => row.try_get_unchecked::<String, _>(index).map(Value::Text),
    };

    decoded.map_err(|e| format!("column {} ({}): {}", index, type_name, e))
}

#[async_trait]
impl RecordSource for SqliteSource {
    fn info(&self) -> SourceInfo {
        SourceInfo {
            location: self.path.display().to_string(),
            size_bytes: Some(self.size_bytes),
            fingerprint: Some(self.fingerprint.clone()),
        }
    }

    async fn list_tables(&self) -> anyhow::Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| r.try_get::<String, _>("name").map_err(Into::into))
            .collect()
    }

    async fn list_columns(&self, table: &str) -> anyhow::Result<Vec<String>> {
        let sql = format!("PRAGMA table_info({})", quote_ident(table));
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let columns = rows
            .iter()
            .map(|r| r.try_get::<String, _>("name"))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if columns.is_empty() {
            anyhow::bail!("table '{}' has no readable columns", table);
        }
        Ok(columns)
    }

    async fn count_rows(&self, table: &str) -> anyhow::Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }

    async fn fetch_page(
        &self,
        table: &str,
        offset: usize,
        limit: usize,
    ) -> anyhow::Result<Vec<RowOutcome>> {
        let sql = format!("SELECT * FROM {} LIMIT ? OFFSET ?", quote_ident(table));
        let rows = sqlx::query(&sql)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(decode_row).collect())
    }
}
