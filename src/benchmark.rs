//! # Benchmark Engine Module
//!
//! Closed-loop publish benchmark: a fixed message budget is split across
//! concurrent workers, each of which keeps exactly one publish call in flight
//! and times it from just before the call until the acknowledgment arrives.
//!
//! ## Key Components
//!
//! - **BenchmarkConfig**: Validated run and backend parameters built from the CLI
//! - **BenchmarkRunner**: Partitions the work, launches workers, joins them and
//!   derives the final [`RunMetrics`]
//! - **Worker**: One concurrent publisher looping over its private share
//!
//! ## Execution Lifecycle
//!
//! 1. **Payload**: One random buffer is generated and shared by every worker
//! 2. **Partition**: `messages` is split as evenly as possible across workers
//! 3. **Measurement**: All workers start together on the multi-threaded runtime
//! 4. **Join**: The runner waits for every worker; this is the only barrier
//! 5. **Statistics**: Percentiles and throughput are computed over all samples
//!
//! ## Failure Policy
//!
//! Any failed publish aborts the whole run. The failing worker raises a shared
//! halt flag so no other worker starts a new call, the remaining tasks are
//! cancelled, and the error is returned without metrics.

use crate::{
    cli::{Args, Backend},
    error::BenchError,
    metrics::{LatencyRecorder, PublishCounters, RunMetrics},
    partition::partition,
    payload::Payload,
    publisher::{BackendConfig, Publisher},
    utils::{format_bytes, validate_concurrency, validate_payload_size},
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, error, info, trace};

/// Upper bound on the latency buffer reserved before the run starts
const MAX_PREALLOCATED_SAMPLES: usize = 1 << 20;

/// Parameters of the measured workload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Total number of messages published across all workers
    pub messages: usize,

    /// Size of every payload in bytes
    pub payload_size: usize,

    /// Number of concurrent workers, each with one call in flight
    pub concurrency: usize,
}

/// Complete configuration for one benchmark invocation
#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    pub run: RunConfig,
    pub backend: BackendConfig,
}

impl BenchmarkConfig {
    /// Create benchmark configuration from CLI arguments
    ///
    /// All validation happens here so that configuration errors surface
    /// before any connection is opened or worker spawned.
    pub fn from_args(args: &Args) -> Result<Self, BenchError> {
        validate_concurrency(args.concurrency).map_err(|e| BenchError::config(e.to_string()))?;
        validate_payload_size(args.size).map_err(|e| BenchError::config(e.to_string()))?;

        if args.backend.requires_servers() && args.servers.trim().is_empty() {
            return Err(BenchError::config(format!(
                "--servers is required for the {} backend",
                args.backend
            )));
        }

        if args.topic.trim().is_empty() {
            return Err(BenchError::config("topic cannot be empty"));
        }

        match args.backend {
            Backend::Nats | Backend::Kafka if args.replicas == 0 => {
                return Err(BenchError::config("replicas must be at least 1"));
            }
            Backend::Kafka if args.partitions == 0 => {
                return Err(BenchError::config("partitions must be at least 1"));
            }
            Backend::Pulsar
                if args.pulsar_tenant.trim().is_empty()
                    || args.pulsar_namespace.trim().is_empty() =>
            {
                return Err(BenchError::config(
                    "pulsar tenant and namespace cannot be empty",
                ));
            }
            _ => {}
        }

        Ok(Self {
            run: RunConfig {
                messages: args.messages,
                payload_size: args.size,
                concurrency: args.concurrency,
            },
            backend: BackendConfig {
                backend: args.backend,
                servers: args.servers.trim().to_string(),
                topic: args.topic.clone(),
                partitions: args.partitions,
                replicas: args.replicas,
                pulsar_tenant: args.pulsar_tenant.clone(),
                pulsar_namespace: args.pulsar_namespace.clone(),
                memory_ack_delay: args.memory_ack_delay,
            },
        })
    }
}

impl std::fmt::Display for BenchmarkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "-----------------------------------------------------------------"
        )?;
        writeln!(f, "Starting Benchmark for: {}", self.backend.backend)?;
        if !self.backend.servers.is_empty() {
            writeln!(f, "  Servers:            {}", self.backend.servers)?;
        }
        match self.backend.backend {
            Backend::Pulsar => {
                writeln!(f, "  Topic:              {}", self.backend.pulsar_topic())?
            }
            _ => writeln!(f, "  Topic:              {}", self.backend.topic)?,
        }
        writeln!(f, "  Messages:           {}", self.run.messages)?;
        writeln!(
            f,
            "  Payload Size:       {} ({} bytes)",
            format_bytes(self.run.payload_size),
            self.run.payload_size
        )?;
        writeln!(f, "  Concurrency:        {}", self.run.concurrency)?;
        match self.backend.backend {
            Backend::Nats => writeln!(f, "  Stream Replicas:    {}", self.backend.replicas)?,
            Backend::Kafka => {
                writeln!(f, "  Partitions:         {}", self.backend.partitions)?;
                writeln!(f, "  Replication:        {}", self.backend.replicas)?;
            }
            Backend::Memory => {
                if let Some(delay) = self.backend.memory_ack_delay {
                    writeln!(f, "  Ack Delay:          {:?}", delay)?;
                }
            }
            Backend::Pulsar => {}
        }
        write!(
            f,
            "-----------------------------------------------------------------"
        )
    }
}

/// One concurrent publisher and its private share of the work
struct Worker {
    id: usize,
    count: usize,
    payload: Payload,
    publisher: Arc<dyn Publisher>,
    recorder: Arc<LatencyRecorder>,
    counters: Arc<PublishCounters>,
    halt: Arc<AtomicBool>,
}

impl Worker {
    /// Publish `count` messages back to back, timing each call
    async fn run(self) -> Result<(), BenchError> {
        trace!("Worker {} starting with {} messages", self.id, self.count);

        for _ in 0..self.count {
            if self.halt.load(Ordering::Acquire) {
                debug!("Worker {} stopping: run aborted", self.id);
                return Ok(());
            }

            self.counters.record_sent();
            let started = Instant::now();
            let outcome = self.publisher.publish_once(&self.payload).await;
            let latency = started.elapsed();

            if let Err(source) = outcome {
                self.halt.store(true, Ordering::Release);
                return Err(BenchError::Publish {
                    worker: self.id,
                    source,
                });
            }

            self.counters.record_ack();
            self.recorder.record(latency);
        }

        trace!("Worker {} finished", self.id);
        Ok(())
    }
}

/// Benchmark runner that drives concurrent publishers against one backend
///
/// ```rust,no_run
/// # use publish_bench::benchmark::{BenchmarkRunner, RunConfig};
/// # use publish_bench::publisher::MemoryPublisher;
/// # use std::sync::Arc;
/// # #[tokio::main]
/// # async fn main() -> anyhow::Result<()> {
/// let runner = BenchmarkRunner::new(RunConfig {
///     messages: 10_000,
///     payload_size: 512,
///     concurrency: 8,
/// });
/// let metrics = runner.run(Arc::new(MemoryPublisher::new(None))).await?;
/// println!("p95 = {:?}", metrics.p95);
/// # Ok(())
/// # }
/// ```
pub struct BenchmarkRunner {
    config: RunConfig,
}

impl BenchmarkRunner {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Execute the run to completion and return its metrics
    ///
    /// ## Returns
    /// - `Ok(RunMetrics)`: every message was acknowledged
    /// - `Err(BenchError)`: configuration, payload or publish failure; no
    ///   partial metrics are produced
    pub async fn run(&self, publisher: Arc<dyn Publisher>) -> Result<RunMetrics, BenchError> {
        let assignments = partition(self.config.messages, self.config.concurrency)?;
        let payload = Payload::generate(self.config.payload_size)?;

        let recorder = Arc::new(LatencyRecorder::with_capacity(
            self.config.messages.min(MAX_PREALLOCATED_SAMPLES),
        ));
        let counters = Arc::new(PublishCounters::new());
        let halt = Arc::new(AtomicBool::new(false));

        info!(
            "Publishing {} messages of {} bytes via {} with {} workers",
            self.config.messages,
            self.config.payload_size,
            publisher.name(),
            self.config.concurrency
        );

        let start = Instant::now();
        let mut workers = JoinSet::new();
        for (id, count) in assignments.into_iter().enumerate() {
            let worker = Worker {
                id,
                count,
                payload: payload.clone(),
                publisher: Arc::clone(&publisher),
                recorder: Arc::clone(&recorder),
                counters: Arc::clone(&counters),
                halt: Arc::clone(&halt),
            };
            workers.spawn(worker.run());
        }

        while let Some(joined) = workers.join_next().await {
            let failure = match joined {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(e) => BenchError::from(e),
            };

            halt.store(true, Ordering::Release);
            workers.abort_all();
            error!("Aborting run after {} acknowledged messages: {}", counters.acked(), failure);
            return Err(failure);
        }
        let elapsed = start.elapsed();

        let samples = recorder.snapshot();
        debug!(
            "All workers joined after {:?} with {} samples",
            elapsed,
            samples.len()
        );

        Ok(RunMetrics::compute(
            &samples,
            elapsed,
            counters.sent(),
            counters.acked(),
            self.config.payload_size,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::MemoryPublisher;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU64;
    use std::time::Duration;

    /// Fails the n-th call (1-based) and acknowledges everything else
    struct FailingPublisher {
        fail_on: u64,
        calls: AtomicU64,
    }

    #[async_trait]
    impl Publisher for FailingPublisher {
        async fn publish_once(&self, _payload: &Payload) -> anyhow::Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == self.fail_on {
                anyhow::bail!("simulated broker rejection");
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
            Ok(())
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    fn memory_args() -> Args {
        Args {
            backend: Backend::Memory,
            messages: 1000,
            size: 64,
            concurrency: 4,
            ..Default::default()
        }
    }

    #[test]
    fn test_config_from_args() {
        let config = BenchmarkConfig::from_args(&memory_args()).unwrap();

        assert_eq!(config.run.messages, 1000);
        assert_eq!(config.run.payload_size, 64);
        assert_eq!(config.run.concurrency, 4);
        assert_eq!(config.backend.backend, Backend::Memory);
        assert_eq!(config.backend.topic, "bench");
    }

    #[test]
    fn test_config_rejects_zero_concurrency() {
        let args = Args {
            concurrency: 0,
            ..memory_args()
        };
        assert!(matches!(
            BenchmarkConfig::from_args(&args),
            Err(BenchError::Config(_))
        ));
    }

    #[test]
    fn test_config_requires_servers_for_brokers() {
        for backend in [Backend::Nats, Backend::Kafka, Backend::Pulsar] {
            let args = Args {
                backend,
                servers: "  ".to_string(),
                ..memory_args()
            };
            let err = BenchmarkConfig::from_args(&args).unwrap_err();
            assert!(err.to_string().contains("--servers"), "{}", err);
        }
    }

    #[test]
    fn test_config_rejects_bad_provisioning() {
        let args = Args {
            backend: Backend::Kafka,
            servers: "localhost:9092".to_string(),
            partitions: 0,
            ..memory_args()
        };
        assert!(BenchmarkConfig::from_args(&args).is_err());

        let args = Args {
            backend: Backend::Nats,
            servers: "nats://localhost:4222".to_string(),
            replicas: 0,
            ..memory_args()
        };
        assert!(BenchmarkConfig::from_args(&args).is_err());

        let args = Args {
            backend: Backend::Pulsar,
            servers: "pulsar://localhost:6650".to_string(),
            pulsar_namespace: String::new(),
            ..memory_args()
        };
        assert!(BenchmarkConfig::from_args(&args).is_err());
    }

    #[test]
    fn test_config_display_mentions_parameters() {
        let args = Args {
            backend: Backend::Kafka,
            servers: "broker:9092".to_string(),
            ..memory_args()
        };
        let rendered = BenchmarkConfig::from_args(&args).unwrap().to_string();
        assert!(rendered.contains("Kafka"));
        assert!(rendered.contains("broker:9092"));
        assert!(rendered.contains("Partitions:         6"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_run_records_every_message() {
        let publisher = Arc::new(MemoryPublisher::new(None));
        let runner = BenchmarkRunner::new(RunConfig {
            messages: 1000,
            payload_size: 100,
            concurrency: 8,
        });

        let metrics = runner.run(publisher.clone()).await.unwrap();

        assert_eq!(metrics.sent, 1000);
        assert_eq!(metrics.acked, 1000);
        assert_eq!(metrics.latency.samples, 1000);
        assert_eq!(metrics.throughput.total_bytes, 100_000);
        assert_eq!(publisher.acked_messages(), 1000);
        assert_eq!(publisher.acked_bytes(), 100_000);
        assert!(metrics.p50 <= metrics.p95);
        assert!(metrics.p95 <= metrics.latency.max);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_run_completeness_across_concurrency_levels() {
        let total = 24;
        for concurrency in 1..=total {
            let runner = BenchmarkRunner::new(RunConfig {
                messages: total,
                payload_size: 8,
                concurrency,
            });
            let metrics = runner
                .run(Arc::new(MemoryPublisher::new(None)))
                .await
                .unwrap();
            assert_eq!(metrics.latency.samples, total, "concurrency={}", concurrency);
            assert_eq!(metrics.acked, total as u64);
        }
    }

    #[tokio::test]
    async fn test_run_with_more_workers_than_messages() {
        let publisher = Arc::new(MemoryPublisher::new(None));
        let runner = BenchmarkRunner::new(RunConfig {
            messages: 3,
            payload_size: 16,
            concurrency: 10,
        });

        let metrics = runner.run(publisher.clone()).await.unwrap();
        assert_eq!(metrics.acked, 3);
        assert_eq!(publisher.acked_messages(), 3);
    }

    #[tokio::test]
    async fn test_run_with_zero_messages() {
        let runner = BenchmarkRunner::new(RunConfig {
            messages: 0,
            payload_size: 16,
            concurrency: 4,
        });

        let metrics = runner
            .run(Arc::new(MemoryPublisher::new(None)))
            .await
            .unwrap();
        assert_eq!(metrics.acked, 0);
        assert_eq!(metrics.p50, Duration::ZERO);
        assert_eq!(metrics.p95, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_run_rejects_zero_concurrency() {
        let runner = BenchmarkRunner::new(RunConfig {
            messages: 10,
            payload_size: 16,
            concurrency: 0,
        });
        let result = runner.run(Arc::new(MemoryPublisher::new(None))).await;
        assert!(matches!(result, Err(BenchError::Config(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_run_aborts_on_publish_failure() {
        let publisher = Arc::new(FailingPublisher {
            fail_on: 20,
            calls: AtomicU64::new(0),
        });
        let runner = BenchmarkRunner::new(RunConfig {
            messages: 10_000,
            payload_size: 32,
            concurrency: 4,
        });

        let result = runner.run(publisher.clone()).await;
        match result {
            Err(BenchError::Publish { source, .. }) => {
                assert!(source.to_string().contains("simulated broker rejection"));
            }
            other => panic!("expected publish failure, got {:?}", other.map(|m| m.acked)),
        }

        // Remaining workers stop issuing calls once the run is aborted.
        let calls_at_abort = publisher.calls.load(Ordering::SeqCst);
        assert!(calls_at_abort < 200, "calls after abort: {}", calls_at_abort);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(publisher.calls.load(Ordering::SeqCst), calls_at_abort);
    }

    #[tokio::test]
    async fn test_run_with_huge_message_count_starts_without_preallocating() {
        let publisher = Arc::new(FailingPublisher {
            fail_on: 1,
            calls: AtomicU64::new(0),
        });
        let runner = BenchmarkRunner::new(RunConfig {
            messages: usize::MAX,
            payload_size: 32,
            concurrency: 1,
        });

        let result = runner.run(publisher.clone()).await;
        assert!(matches!(result, Err(BenchError::Publish { worker: 0, .. })));
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 1);
    }
}
