use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Shared, append-only store of per-call publish latencies
///
/// Workers call [`LatencyRecorder::record`] concurrently; the lock is held only
/// for a single `Vec::push`. Sample order carries no meaning.
#[derive(Debug, Default)]
pub struct LatencyRecorder {
    samples: Mutex<Vec<Duration>>,
}

impl LatencyRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size the store for a run of `capacity` messages
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    /// Append one observed call duration
    pub fn record(&self, latency: Duration) {
        self.samples.lock().push(latency);
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }

    /// Copy of every sample recorded so far
    ///
    /// Meant to be called once all workers have joined.
    pub fn snapshot(&self) -> Vec<Duration> {
        self.samples.lock().clone()
    }

    /// Take ownership of the samples without copying
    pub fn into_samples(self) -> Vec<Duration> {
        self.samples.into_inner()
    }
}

/// Publish attempt and acknowledgment counts shared by all workers
#[derive(Debug, Default)]
pub struct PublishCounters {
    sent: AtomicU64,
    acked: AtomicU64,
}

impl PublishCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a publish call about to be issued
    pub fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a publish call the backend acknowledged
    pub fn record_ack(&self) {
        self.acked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn acked(&self) -> u64 {
        self.acked.load(Ordering::Relaxed)
    }
}

/// Index selected for percentile `p` (0-100) over `len` sorted samples
///
/// Nearest-rank on a linear index: `floor((len - 1) * p / 100)`, clamped to
/// the valid range. Never interpolates between neighbours.
pub fn percentile_index(len: usize, p: f64) -> usize {
    if len == 0 {
        return 0;
    }
    let last = len - 1;
    let idx = (last as f64 * p / 100.0).floor();
    if idx.is_nan() || idx <= 0.0 {
        0
    } else {
        (idx as usize).min(last)
    }
}

/// Percentile `p` of an already ascending slice; zero when empty
pub fn percentile_of_sorted(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    sorted[percentile_index(sorted.len(), p)]
}

/// Median and 95th percentile of an unordered sample set
///
/// The input is copied and sorted; an empty set yields `(0, 0)`.
pub fn percentiles(samples: &[Duration]) -> (Duration, Duration) {
    let mut sorted = samples.to_vec();
    sorted.sort_unstable();
    (
        percentile_of_sorted(&sorted, 50.0),
        percentile_of_sorted(&sorted, 95.0),
    )
}

/// Serialize `Duration` fields as integer nanoseconds
mod duration_ns {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_nanos().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_nanos)
    }
}

/// Distribution statistics beyond the headline p50/p95
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub samples: usize,
    #[serde(rename = "min_ns", with = "duration_ns")]
    pub min: Duration,
    #[serde(rename = "mean_ns", with = "duration_ns")]
    pub mean: Duration,
    #[serde(rename = "max_ns", with = "duration_ns")]
    pub max: Duration,
    #[serde(rename = "p99_ns", with = "duration_ns")]
    pub p99: Duration,
}

impl LatencySummary {
    /// Summarize an ascending slice of samples
    pub fn from_sorted(sorted: &[Duration]) -> Self {
        if sorted.is_empty() {
            return Self {
                samples: 0,
                min: Duration::ZERO,
                mean: Duration::ZERO,
                max: Duration::ZERO,
                p99: Duration::ZERO,
            };
        }

        let total_ns: u128 = sorted.iter().map(|d| d.as_nanos()).sum();
        let mean_ns = total_ns / sorted.len() as u128;

        Self {
            samples: sorted.len(),
            min: sorted[0],
            mean: Duration::from_nanos(mean_ns.min(u64::MAX as u128) as u64),
            max: sorted[sorted.len() - 1],
            p99: percentile_of_sorted(sorted, 99.0),
        }
    }
}

/// Message and byte rates over the run's wall-clock time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputMetrics {
    pub messages_per_second: f64,
    /// Decimal megabytes (1 MB = 1e6 bytes)
    pub megabytes_per_second: f64,
    pub total_messages: u64,
    pub total_bytes: u64,
}

impl ThroughputMetrics {
    pub fn new(total_messages: u64, total_bytes: u64, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        let (messages_per_second, megabytes_per_second) = if secs > 0.0 {
            (
                total_messages as f64 / secs,
                total_bytes as f64 / 1e6 / secs,
            )
        } else {
            (0.0, 0.0)
        };

        Self {
            messages_per_second,
            megabytes_per_second,
            total_messages,
            total_bytes,
        }
    }
}

/// Final statistics of a completed run
///
/// Built once after every worker has joined and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    #[serde(rename = "elapsed_ns", with = "duration_ns")]
    pub elapsed: Duration,
    pub sent: u64,
    pub acked: u64,
    #[serde(rename = "p50_ns", with = "duration_ns")]
    pub p50: Duration,
    #[serde(rename = "p95_ns", with = "duration_ns")]
    pub p95: Duration,
    pub latency: LatencySummary,
    pub throughput: ThroughputMetrics,
}

impl RunMetrics {
    /// Derive run statistics from the raw samples
    ///
    /// Throughput counts acknowledged messages, each carrying `payload_size`
    /// bytes.
    pub fn compute(
        samples: &[Duration],
        elapsed: Duration,
        sent: u64,
        acked: u64,
        payload_size: usize,
    ) -> Self {
        let mut sorted = samples.to_vec();
        sorted.sort_unstable();
        let p50 = percentile_of_sorted(&sorted, 50.0);
        let p95 = percentile_of_sorted(&sorted, 95.0);
        let latency = LatencySummary::from_sorted(&sorted);

        let total_bytes = acked.saturating_mul(payload_size as u64);

        Self {
            elapsed,
            sent,
            acked,
            p50,
            p95,
            latency,
            throughput: ThroughputMetrics::new(acked, total_bytes, elapsed),
        }
    }
}
