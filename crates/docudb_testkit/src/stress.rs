//! Concurrent load helpers.
//!
//! These run many record operations from concurrent tasks against one model
//! and report how they went. The store file must stay well formed whatever
//! the interleaving.

use docudb_core::{CollectionModel, RecordId};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result of a stress run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Ids of the records saved successfully.
    pub saved_ids: Vec<RecordId>,
}

impl StressTestResult {
    fn new(saved_ids: Vec<RecordId>, failed: usize, duration: Duration) -> Self {
        Self {
            total_ops: saved_ids.len() + failed,
            successful_ops: saved_ids.len(),
            failed_ops: failed,
            duration,
            saved_ids,
        }
    }

    /// Operations per second.
    pub fn ops_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.total_ops as f64 / secs
        } else {
            0.0
        }
    }
}

/// Configuration for stress runs.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of concurrent tasks.
    pub tasks: usize,
    /// Records created and saved by each task.
    pub records_per_task: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            tasks: 8,
            records_per_task: 25,
        }
    }
}

/// Creates and saves records from concurrent tasks.
///
/// `content` builds the content of record `n` of task `task`.
pub async fn stress_concurrent_saves<F>(
    model: Arc<CollectionModel>,
    config: &StressConfig,
    content: F,
) -> StressTestResult
where
    F: Fn(usize, usize) -> Value + Send + Sync + 'static,
{
    let content = Arc::new(content);
    let start = Instant::now();

    let handles: Vec<_> = (0..config.tasks)
        .map(|task| {
            let model = Arc::clone(&model);
            let content = Arc::clone(&content);
            let count = config.records_per_task;
            tokio::spawn(async move {
                let mut saved = Vec::with_capacity(count);
                let mut failed = 0;
                for n in 0..count {
                    match model.new_record(&content(task, n)) {
                        Ok(mut record) => match record.save().await {
                            Ok(()) => saved.push(record.id().clone()),
                            Err(_) => failed += 1,
                        },
                        Err(_) => failed += 1,
                    }
                }
                (saved, failed)
            })
        })
        .collect();

    let mut saved_ids = Vec::new();
    let mut failed = 0;
    for handle in handles {
        match handle.await {
            Ok((saved, task_failed)) => {
                saved_ids.extend(saved);
                failed += task_failed;
            }
            Err(_) => failed += config.records_per_task,
        }
    }

    StressTestResult::new(saved_ids, failed, start.elapsed())
}

/// What concurrent readers saw while one record was being updated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReadStats {
    /// Lookups performed.
    pub reads: usize,
    /// Lookups that found no copy of the record.
    pub missing: usize,
    /// Lookups that found more than one copy of the record.
    pub duplicated: usize,
}

/// Repeatedly edits and saves one record while concurrent tasks look it up.
///
/// An update removes the old line and appends the new one under two separate
/// lock acquisitions, so a reader may briefly find the record missing. It
/// must never find two copies.
pub async fn stress_update_while_reading(
    model: Arc<CollectionModel>,
    updates: usize,
    readers: usize,
) -> UpdateReadStats {
    let mut record = model
        .new_record(&serde_json::json!({"title": "v0"}))
        .expect("Content must match the post schema");
    record.save().await.expect("Initial save failed");
    let id = record.id().clone();

    let writer = tokio::spawn(async move {
        for n in 1..=updates {
            record
                .edit(&serde_json::json!({ "title": format!("v{n}") }))
                .expect("Edit failed");
            record.save().await.expect("Update failed");
        }
    });

    let reader_handles: Vec<_> = (0..readers)
        .map(|_| {
            let model = Arc::clone(&model);
            let id = id.clone();
            tokio::spawn(async move {
                let mut stats = UpdateReadStats::default();
                for _ in 0..updates {
                    let found = model.find_by_id(&id).await.expect("Read failed");
                    stats.reads += 1;
                    match found.len() {
                        0 => stats.missing += 1,
                        1 => {}
                        _ => stats.duplicated += 1,
                    }
                    tokio::task::yield_now().await;
                }
                stats
            })
        })
        .collect();

    writer.await.expect("Writer task panicked");
    let mut total = UpdateReadStats::default();
    for handle in reader_handles {
        let stats = handle.await.expect("Reader task panicked");
        total.reads += stats.reads;
        total.missing += stats.missing;
        total.duplicated += stats.duplicated;
    }
    total
}
