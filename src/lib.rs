//! # Publish Benchmark Library
//!
//! A closed-loop publish load generator for message brokers. A fixed number of
//! concurrent publishers each keep one publish call in flight, every call is
//! timed until the broker acknowledges it, and the run reports aggregate
//! throughput and tail latency.
//!
//! ## Supported Backends
//!
//! - **NATS JetStream** (`--features nats`): publishes wait for the stream's `PubAck`
//! - **Kafka** (`--features kafka`): `acks=all`, one record per request
//! - **Pulsar** (`--features pulsar`): batching disabled, waits for the send receipt
//! - **Memory** (always built): in-process acknowledgments with an optional delay
//!
//! ## Architecture Overview
//!
//! - `benchmark`: Run configuration, the runner and its worker loop
//! - `partition`: Even split of the message budget across workers
//! - `payload`: The random message body shared by all workers
//! - `publisher`: The `Publisher` capability and one implementation per backend
//! - `metrics`: Latency recording, nearest-rank percentiles and throughput
//! - `results`: The run report and its JSON output
//! - `cli`, `logging`, `utils`: Command-line surface, tracing setup, helpers
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use publish_bench::{BenchmarkRunner, RunConfig};
//! use publish_bench::publisher::MemoryPublisher;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runner = BenchmarkRunner::new(RunConfig {
//!         messages: 100_000,
//!         payload_size: 512,
//!         concurrency: 64,
//!     });
//!     let metrics = runner.run(Arc::new(MemoryPublisher::new(None))).await?;
//!
//!     println!("p50={:?} p95={:?}", metrics.p50, metrics.p95);
//!     Ok(())
//! }
//! ```

/// Run configuration, benchmark runner and worker loop
pub mod benchmark;

/// Command-line interface and backend selection
pub mod cli;

/// Fatal error taxonomy of a run
pub mod error;

/// Console and file logging setup
pub mod logging;

/// Latency recording, percentile estimation and throughput
pub mod metrics;

pub mod partition;

pub mod payload;

/// Publisher capability and backend implementations
pub mod publisher;

/// Run report and JSON output
pub mod results;

pub mod utils;

pub use benchmark::{BenchmarkConfig, BenchmarkRunner, RunConfig};
pub use cli::{Args, Backend};
pub use error::BenchError;
pub use metrics::{percentiles, LatencyRecorder, RunMetrics};
pub use partition::partition;
pub use payload::Payload;
pub use publisher::{BackendConfig, Publisher, PublisherFactory};
pub use results::{ResultsManager, RunReport};

/// The current version of the publish benchmark
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values
pub mod defaults {
    use crate::cli::Backend;

    /// Backend used when `--system` is not given
    pub const BACKEND: Backend = Backend::Nats;

    /// Default subject / topic name
    pub const TOPIC: &str = "bench";

    /// Default number of messages to publish
    pub const MESSAGES: usize = 100_000;

    /// Default payload size in bytes
    pub const PAYLOAD_SIZE: usize = 512;

    /// Default number of parallel publishers
    pub const CONCURRENCY: usize = 64;

    /// Default Kafka partition count
    pub const PARTITIONS: u32 = 6;

    /// Default JetStream replicas / Kafka replication factor
    pub const REPLICAS: u32 = 3;

    pub const PULSAR_TENANT: &str = "public";

    pub const PULSAR_NAMESPACE: &str = "default";

    /// JetStream stream that captures the benchmark subject
    pub const NATS_STREAM: &str = "S_BENCH";

    /// Upper bound on concurrent publishers
    pub const MAX_CONCURRENCY: usize = 4096;

    /// Upper bound on payload size (64 MiB)
    pub const MAX_PAYLOAD_SIZE: usize = 64 * 1024 * 1024;
}
