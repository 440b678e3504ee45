//! Verify command implementation.

use super::{open, read_frame, CliError, CliResult, FrameShape};
use crate::analysis::Analysis;
use docudb_storage::{StorageError, StorageHandler};
use std::path::Path;
use tracing::debug;

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Number of records checked.
    pub records_checked: usize,
    /// Number of valid records.
    pub valid_records: usize,
    /// List of errors found.
    pub errors: Vec<String>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs the verify command.
pub async fn run(path: &Path) -> CliResult<()> {
    println!("Verifying store at {}", path.display());
    println!();

    let handler = open(path).await?;
    let result = verify(&handler).await?;

    println!("  Records checked: {}", result.records_checked);
    println!("  Valid records:   {}", result.valid_records);
    for error in &result.errors {
        println!("  ✗ {error}");
    }

    println!();
    if result.is_ok() {
        println!("✓ Store verification passed");
        Ok(())
    } else {
        println!("✗ Store verification failed");
        Err(CliError::VerificationFailed {
            problems: result.errors.len(),
        }
        .into())
    }
}

/// Checks the framing, every record, and id uniqueness.
pub async fn verify(handler: &StorageHandler) -> CliResult<VerifyResult> {
    let mut result = VerifyResult::default();

    if let FrameShape::Malformed(message) = read_frame(handler).await? {
        result.errors.push(format!("frame: {message}"));
        return Ok(result);
    }

    let records = match handler.load_records().await {
        Ok(records) => records,
        Err(e @ (StorageError::Codec(_) | StorageError::InvalidUtf8)) => {
            result.errors.push(format!("frame: {e}"));
            return Ok(result);
        }
        Err(e) => return Err(e.into()),
    };

    let analysis = Analysis::of(&records);
    result.records_checked = analysis.total();
    result.valid_records = analysis.valid();

    for (index, problem) in analysis.invalid() {
        result.errors.push(format!("record {index}: {problem}"));
    }
    for (id, count) in analysis.duplicate_ids() {
        result.errors.push(format!("id {id} stored {count} times"));
    }

    debug!(
        checked = result.records_checked,
        errors = result.errors.len(),
        "verified store"
    );
    Ok(result)
}
