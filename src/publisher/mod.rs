use crate::cli::Backend;
use crate::error::BenchError;
use crate::payload::Payload;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub mod memory;
#[cfg(feature = "kafka")]
pub mod kafka;
#[cfg(feature = "nats")]
pub mod nats;
#[cfg(feature = "pulsar")]
pub mod pulsar;

pub use memory::MemoryPublisher;

/// Backend connection and provisioning settings
///
/// Only the fields relevant to the selected backend are consulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub backend: Backend,
    /// Bootstrap address(es), e.g. `nats://host:4222`, `host:9092`, `pulsar://host:6650`
    pub servers: String,
    /// NATS subject or Kafka/Pulsar topic
    pub topic: String,
    /// Kafka partition count used when creating the topic
    pub partitions: u32,
    /// JetStream stream replicas, Kafka replication factor
    pub replicas: u32,
    pub pulsar_tenant: String,
    pub pulsar_namespace: String,
    /// Artificial acknowledgment latency of the in-process backend
    pub memory_ack_delay: Option<Duration>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            servers: String::new(),
            topic: crate::defaults::TOPIC.to_string(),
            partitions: crate::defaults::PARTITIONS,
            replicas: crate::defaults::REPLICAS,
            pulsar_tenant: crate::defaults::PULSAR_TENANT.to_string(),
            pulsar_namespace: crate::defaults::PULSAR_NAMESPACE.to_string(),
            memory_ack_delay: None,
        }
    }
}

impl BackendConfig {
    /// Fully qualified Pulsar topic name
    pub fn pulsar_topic(&self) -> String {
        format!(
            "persistent://{}/{}/{}",
            self.pulsar_tenant, self.pulsar_namespace, self.topic
        )
    }
}

/// Publish one message and wait for the backend to acknowledge it
///
/// A single instance is shared by every worker of a run, so implementations
/// must tolerate concurrent `publish_once` calls.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Resolve once the backend has persisted or delivered `payload`
    async fn publish_once(&self, payload: &Payload) -> Result<()>;

    /// Backend name for logs and reports
    fn name(&self) -> &'static str;

    /// Flush and release backend resources after a completed run
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Resolves a [`Backend`] selection to a connected [`Publisher`]
pub struct PublisherFactory;

impl PublisherFactory {
    /// Connect to the configured backend and provision its topic or stream
    pub async fn connect(config: &BackendConfig) -> Result<Arc<dyn Publisher>, BenchError> {
        match config.backend {
            Backend::Memory => Ok(Arc::new(MemoryPublisher::new(config.memory_ack_delay))),

            #[cfg(feature = "nats")]
            Backend::Nats => nats::NatsPublisher::connect(config)
                .await
                .map(|p| Arc::new(p) as Arc<dyn Publisher>)
                .map_err(|source| BenchError::BackendSetup {
                    backend: "NATS JetStream",
                    source,
                }),

            #[cfg(feature = "kafka")]
            Backend::Kafka => kafka::KafkaPublisher::connect(config)
                .await
                .map(|p| Arc::new(p) as Arc<dyn Publisher>)
                .map_err(|source| BenchError::BackendSetup {
                    backend: "Kafka",
                    source,
                }),

            #[cfg(feature = "pulsar")]
            Backend::Pulsar => pulsar::PulsarPublisher::connect(config)
                .await
                .map(|p| Arc::new(p) as Arc<dyn Publisher>)
                .map_err(|source| BenchError::BackendSetup {
                    backend: "Pulsar",
                    source,
                }),

            #[allow(unreachable_patterns)]
            other => Err(BenchError::config(format!(
                "{} support is not compiled in; rebuild with `--features {}`",
                other,
                other.feature_name()
            ))),
        }
    }
}
