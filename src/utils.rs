//! # Utility Functions
//!
//! Formatting helpers for human-readable output, validation of run
//! parameters, and small system-information lookups shared by the CLI,
//! the benchmark runner and the report.
//!
//! ```rust
//! use publish_bench::utils::*;
//! use std::time::Duration;
//!
//! assert_eq!(format_duration(Duration::from_micros(1500)), "1.50ms");
//! assert_eq!(format_bytes(2048), "2.00 KB");
//! assert!(validate_concurrency(0).is_err());
//! ```

use anyhow::Result;
use std::time::Duration;
use uuid::Uuid;

/// Generate a unique identifier for a benchmark run
pub fn generate_run_id() -> String {
    Uuid::new_v4().to_string()
}

/// Format a duration in a human-readable way
///
/// Picks the largest unit that keeps the value above one: `ns`, `μs`, `ms`,
/// `s`, then a compound minutes/hours form for long runs.
///
/// ```rust
/// # use publish_bench::utils::format_duration;
/// # use std::time::Duration;
/// assert_eq!(format_duration(Duration::from_nanos(500)), "500ns");
/// assert_eq!(format_duration(Duration::from_nanos(1500)), "1.50μs");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ns = duration.as_nanos();

    if total_ns < 1_000 {
        format!("{}ns", total_ns)
    } else if total_ns < 1_000_000 {
        format!("{:.2}μs", total_ns as f64 / 1_000.0)
    } else if total_ns < 1_000_000_000 {
        format!("{:.2}ms", total_ns as f64 / 1_000_000.0)
    } else if total_ns < 60_000_000_000 {
        format!("{:.2}s", total_ns as f64 / 1_000_000_000.0)
    } else {
        let seconds = duration.as_secs();
        let minutes = seconds / 60;
        let remaining_seconds = seconds % 60;

        if minutes < 60 {
            format!("{}m {}s", minutes, remaining_seconds)
        } else {
            let hours = minutes / 60;
            let remaining_minutes = minutes % 60;
            format!("{}h {}m {}s", hours, remaining_minutes, remaining_seconds)
        }
    }
}

/// Format a byte count with binary units (B, KB, MB, GB)
pub fn format_bytes(bytes: usize) -> String {
    let bytes = bytes as f64;
    if bytes < 1024.0 {
        format!("{:.0} B", bytes)
    } else if bytes < 1024.0 * 1024.0 {
        format!("{:.2} KB", bytes / 1024.0)
    } else if bytes < 1024.0 * 1024.0 * 1024.0 {
        format!("{:.2} MB", bytes / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Validate that the number of concurrent publishers is usable
///
/// At least one worker is required; the upper bound keeps a typo from
/// spawning an unbounded number of tasks against a broker.
pub fn validate_concurrency(concurrency: usize) -> Result<()> {
    if concurrency == 0 {
        anyhow::bail!("Concurrency cannot be zero");
    }
    if concurrency > crate::defaults::MAX_CONCURRENCY {
        anyhow::bail!(
            "Concurrency {} is too high (maximum {})",
            concurrency,
            crate::defaults::MAX_CONCURRENCY
        );
    }
    Ok(())
}

/// Validate the payload size; empty payloads are allowed
pub fn validate_payload_size(size: usize) -> Result<()> {
    if size > crate::defaults::MAX_PAYLOAD_SIZE {
        anyhow::bail!(
            "Payload size {} is too large (maximum {})",
            size,
            format_bytes(crate::defaults::MAX_PAYLOAD_SIZE)
        );
    }
    Ok(())
}

/// Number of logical CPU cores available to the process
pub fn get_cpu_cores() -> usize {
    num_cpus::get()
}
