//! Splitting a message budget across concurrent workers.

use crate::error::BenchError;

/// Split `total` messages across `workers` as evenly as possible
///
/// Every worker receives `total / workers`; the first `total % workers`
/// workers receive one extra message. The returned counts always sum to
/// `total`, and workers beyond `total` get a count of zero.
pub fn partition(total: usize, workers: usize) -> Result<Vec<usize>, BenchError> {
    if workers == 0 {
        return Err(BenchError::config("concurrency must be at least 1"));
    }

    let base = total / workers;
    let remainder = total % workers;

    Ok((0..workers)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect())
}
