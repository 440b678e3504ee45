//! Dump command implementation.

use super::{open, CliResult};
use docudb_storage::StorageHandler;
use std::path::Path;

/// Runs the dump command.
pub async fn run(path: &Path, limit: Option<usize>) -> CliResult<()> {
    let handler = open(path).await?;
    let (records, total) = dump(&handler, limit).await?;

    for (index, record) in records.iter().enumerate() {
        println!("[{index}] {record}");
    }
    if records.len() < total {
        println!("... {} more", total - records.len());
    }

    Ok(())
}

/// Returns up to `limit` decoded records in file order, with the total count.
pub async fn dump(handler: &StorageHandler, limit: Option<usize>) -> CliResult<(Vec<String>, usize)> {
    let mut records = handler.load_records().await?;
    let total = records.len();
    if let Some(limit) = limit {
        records.truncate(limit);
    }
    Ok((records, total))
}
