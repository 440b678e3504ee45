//! Compact command implementation.
//!
//! Compaction reads and rewrites the store under two separate locks, so it
//! must not run while another process writes to the same file.

use super::{open, CliResult};
use crate::analysis::Analysis;
use docudb_codec::{encode_record, join_records};
use docudb_storage::StorageHandler;
use std::path::Path;
use tracing::info;

/// Compaction statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactStats {
    /// Input records.
    pub input_records: usize,
    /// Output records.
    pub output_records: usize,
    /// Records dropped for not being objects with a string `_id`.
    pub invalid_removed: usize,
    /// Older copies of an id dropped.
    pub superseded_removed: usize,
    /// Bytes before compaction.
    pub bytes_before: u64,
    /// Bytes after compaction.
    pub bytes_after: u64,
}

impl CompactStats {
    fn needed(&self) -> bool {
        self.output_records < self.input_records
    }
}

/// Runs the compact command.
pub async fn run(path: &Path, dry_run: bool) -> CliResult<()> {
    println!("Compacting store at {}", path.display());
    if dry_run {
        println!("(dry run - no changes will be made)");
    }
    println!();

    let handler = open(path).await?;
    let stats = compact(&handler, dry_run).await?;

    println!("Compaction Analysis:");
    println!("  Input records:      {}", stats.input_records);
    println!("  Output records:     {}", stats.output_records);
    println!("  Invalid records:    {}", stats.invalid_removed);
    println!("  Superseded copies:  {}", stats.superseded_removed);
    println!();
    println!("  Size before: {} bytes", stats.bytes_before);
    println!("  Size after:  {} bytes", stats.bytes_after);

    if !dry_run {
        println!();
        if stats.needed() {
            println!("✓ Compaction complete");
        } else {
            println!("No compaction needed - store is already compact");
        }
    }

    Ok(())
}

/// Keeps the last copy of every valid record, in file order.
///
/// The store is only rewritten when something is dropped and `dry_run` is
/// false.
pub async fn compact(handler: &StorageHandler, dry_run: bool) -> CliResult<CompactStats> {
    let bytes_before = handler.size().await?;
    let records = handler.load_records().await?;
    let analysis = Analysis::of(&records);

    let kept: Vec<&str> = analysis
        .survivors()
        .into_iter()
        .map(|index| records[index].as_str())
        .collect();

    let valid = analysis.valid();
    let mut stats = CompactStats {
        input_records: records.len(),
        output_records: kept.len(),
        invalid_removed: records.len() - valid,
        superseded_removed: valid - kept.len(),
        bytes_before,
        bytes_after: bytes_before,
    };

    if !stats.needed() {
        return Ok(stats);
    }

    if dry_run {
        let encoded = kept
            .iter()
            .map(|record| encode_record(record))
            .collect::<Result<Vec<_>, _>>()?;
        stats.bytes_after = join_records(&encoded).len() as u64;
    } else {
        handler.overwrite(&kept).await?;
        stats.bytes_after = handler.size().await?;
        info!(
            removed = stats.input_records - stats.output_records,
            "compacted store"
        );
    }

    Ok(stats)
}
