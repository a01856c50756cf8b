use std::path::PathBuf;

use anyhow::Result;
use kvscan_sources::RecordSource;
use kvscan_storage::{SqliteSource, StorageError};

pub async fn handle(store: Option<PathBuf>) -> Result<()> {
    let Some(path) = super::find_store(store) else {
        super::print_store_not_found();
        return Ok(());
    };

    let source = match SqliteSource::open(&path).await {
        Ok(source) => source,
        Err(StorageError::NotFound(path)) => {
            println!("Store not found: {}", path.display());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let tables = source.list_tables().await?;
    println!("{} ({} tables)", path.display(), tables.len());

    for table in tables {
        match source.list_columns(&table).await {
            Ok(columns) => {
                let rows = source
                    .count_rows(&table)
                    .await
                    .map_or_else(|_| "?".to_string(), |n| n.to_string());
                println!("  {} ({} rows)", table, rows);
                println!("    Columns: {}", columns.join(", "));
            }
            Err(e) => {
                tracing::warn!("Cannot read schema of {}: {:#}", table, e);
                println!("  {} (unreadable)", table);
            }
        }
    }

    source.close().await;
    Ok(())
}
