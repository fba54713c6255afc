//! One-shot parallel normalization pool
//!
//! Normalization is pure per row, so rows fan out to a small set of
//! worker threads over bounded channels. Every task carries its input
//! index and results are reassembled by index, so output order always
//! matches input order regardless of worker scheduling. Later stages
//! depend on that: grouping and chunk numbering must see rows in
//! source order to stay reproducible.

use crate::error::WorkerError;
use crossbeam_channel::bounded;
use std::thread;
use tracing::debug;

/// Channel capacity per worker
const CHANNEL_DEPTH: usize = 64;

/// Batches smaller than this are normalized inline
const PARALLEL_CUTOFF: usize = 512;

/// Run `task` over every row on `worker_count` threads, preserving
/// input order in the returned vector
pub fn normalize_rows<R, T>(
    rows: Vec<R>,
    worker_count: usize,
    task: fn(&R) -> T,
) -> Result<Vec<T>, WorkerError>
where
    R: Send + 'static,
    T: Send + 'static,
{
    let total = rows.len();
    if worker_count <= 1 || total < PARALLEL_CUTOFF {
        return Ok(rows.iter().map(task).collect());
    }

    let (task_tx, task_rx) = bounded::<(usize, R)>(worker_count * CHANNEL_DEPTH);
    let (result_tx, result_rx) = bounded::<(usize, T)>(worker_count * CHANNEL_DEPTH);

    let mut workers = Vec::with_capacity(worker_count);
    for id in 0..worker_count {
        let task_rx = task_rx.clone();
        let result_tx = result_tx.clone();
        let handle = thread::Builder::new()
            .name(format!("normalize-{}", id))
            .spawn(move || {
                for (idx, row) in task_rx.iter() {
                    if result_tx.send((idx, task(&row))).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| WorkerError::SpawnFailed {
                id,
                reason: e.to_string(),
            })?;
        workers.push(handle);
    }
    drop(task_rx);
    drop(result_tx);

    // Feed from a separate thread so the bounded channels cannot
    // deadlock against result collection
    let feeder = thread::Builder::new()
        .name("normalize-feed".to_string())
        .spawn(move || {
            for pair in rows.into_iter().enumerate() {
                if task_tx.send(pair).is_err() {
                    break;
                }
            }
        })
        .map_err(|e| WorkerError::SpawnFailed {
            id: worker_count,
            reason: e.to_string(),
        })?;

    let mut slots: Vec<Option<T>> = Vec::with_capacity(total);
    slots.resize_with(total, || None);
    let mut received = 0usize;
    for (idx, record) in result_rx.iter() {
        slots[idx] = Some(record);
        received += 1;
    }

    let _ = feeder.join();
    for (id, handle) in workers.into_iter().enumerate() {
        handle.join().map_err(|_| WorkerError::Panicked { id })?;
    }

    if received != total {
        return Err(WorkerError::ResultsIncomplete {
            expected: total,
            missing: total - received,
        });
    }

    debug!(rows = total, workers = worker_count, "Parallel normalization complete");
    Ok(slots.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn double(n: &u64) -> u64 {
        n * 2
    }

    #[test]
    fn test_inline_path_for_small_batches() {
        let rows: Vec<u64> = (0..10).collect();
        let out = normalize_rows(rows, 4, double).unwrap();
        assert_eq!(out, (0..10).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_parallel_preserves_order() {
        let rows: Vec<u64> = (0..10_000).collect();
        let out = normalize_rows(rows, 4, double).unwrap();
        assert_eq!(out.len(), 10_000);
        for (i, v) in out.iter().enumerate() {
            assert_eq!(*v, (i as u64) * 2);
        }
    }

    #[test]
    fn test_single_worker_runs_inline() {
        let rows: Vec<u64> = (0..5_000).collect();
        let out = normalize_rows(rows, 1, double).unwrap();
        assert_eq!(out.len(), 5_000);
        assert_eq!(out[4_999], 9_998);
    }

    #[test]
    fn test_empty_input() {
        let out = normalize_rows(Vec::<u64>::new(), 4, double).unwrap();
        assert!(out.is_empty());
    }
}
