//! Inspect command implementation.

use super::{open, read_frame, CliResult, FrameShape};
use crate::analysis::Analysis;
use crate::Format;
use docudb_storage::StorageHandler;
use serde::Serialize;
use std::path::Path;

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store path.
    pub path: String,
    /// File size in bytes.
    pub size: u64,
    /// Frame shape: empty, bare, populated or malformed.
    pub frame: &'static str,
    /// Why the frame is malformed, if it is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_error: Option<String>,
    /// Record statistics, unless the frame is malformed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<RecordStats>,
}

/// Statistics over the stored records.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RecordStats {
    /// Number of stored records.
    pub total: usize,
    /// Records that are JSON objects with a string `_id`.
    pub valid: usize,
    /// Distinct ids among valid records.
    pub distinct_ids: usize,
    /// Ids stored more than once.
    pub duplicated_ids: usize,
}

/// Runs the inspect command.
pub async fn run(path: &Path, format: Format) -> CliResult<()> {
    let handler = open(path).await?;
    let result = inspect(&handler).await?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        Format::Text => print_text_output(&result),
    }

    Ok(())
}

/// Collects statistics about the connected store.
pub async fn inspect(handler: &StorageHandler) -> CliResult<InspectResult> {
    let size = handler.size().await?;
    let frame = read_frame(handler).await?;

    let records = match frame {
        FrameShape::Malformed(_) => None,
        _ => {
            let analysis = Analysis::of(&handler.load_records().await?);
            Some(RecordStats {
                total: analysis.total(),
                valid: analysis.valid(),
                distinct_ids: analysis.distinct_ids(),
                duplicated_ids: analysis.duplicate_ids().len(),
            })
        }
    };

    Ok(InspectResult {
        path: handler
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        size,
        frame: frame.name(),
        frame_error: match frame {
            FrameShape::Malformed(message) => Some(message),
            _ => None,
        },
        records,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("DocuDB Store Inspection");
    println!("=======================");
    println!();
    println!("Path: {}", result.path);
    println!("Size: {}", format_size(result.size));
    println!();
    match &result.frame_error {
        Some(error) => println!("Frame: {} ({error})", result.frame),
        None => println!("Frame: {}", result.frame),
    }

    if let Some(records) = &result.records {
        println!();
        println!("Records:");
        println!("  Total:          {}", records.total);
        println!("  Valid:          {}", records.valid);
        println!("  Distinct ids:   {}", records.distinct_ids);
        println!("  Duplicated ids: {}", records.duplicated_ids);
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} bytes")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
