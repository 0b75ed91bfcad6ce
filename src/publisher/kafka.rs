use super::{BackendConfig, Publisher};
use crate::payload::Payload;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{debug, info, warn};

const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Kafka publisher backed by librdkafka
///
/// The producer requires acknowledgment from all in-sync replicas and sends
/// every record on its own, so a publish resolves only when that single
/// record's delivery report arrives.
pub struct KafkaPublisher {
    producer: FutureProducer,
    topic: String,
}

impl KafkaPublisher {
    pub async fn connect(config: &BackendConfig) -> Result<Self> {
        Self::ensure_topic(config).await;

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.servers)
            .set("client.id", "bench-kafka")
            .set("acks", "all")
            .set("linger.ms", "0")
            .set("batch.num.messages", "1")
            .create()
            .with_context(|| format!("failed to create Kafka producer for {}", config.servers))?;
        debug!("Kafka producer created for {}", config.servers);

        Ok(Self {
            producer,
            topic: config.topic.clone(),
        })
    }

    /// Create the topic if the cluster lets us; brokers with auto-creation
    /// enabled make this optional.
    async fn ensure_topic(config: &BackendConfig) {
        let admin: AdminClient<DefaultClientContext> = match ClientConfig::new()
            .set("bootstrap.servers", &config.servers)
            .create()
        {
            Ok(admin) => admin,
            Err(e) => {
                warn!("Could not create Kafka admin client: {}", e);
                return;
            }
        };

        let topic = NewTopic::new(
            &config.topic,
            config.partitions as i32,
            TopicReplication::Fixed(config.replicas as i32),
        );

        match admin.create_topics([&topic], &AdminOptions::new()).await {
            Ok(results) => {
                for result in results {
                    match result {
                        Ok(name) => info!(
                            "Created Kafka topic {} ({} partitions, replication {})",
                            name, config.partitions, config.replicas
                        ),
                        Err((name, code)) => debug!("Kafka topic {} not created: {}", name, code),
                    }
                }
            }
            Err(e) => warn!("Kafka topic creation request failed: {}", e),
        }
    }
}

#[async_trait]
impl Publisher for KafkaPublisher {
    async fn publish_once(&self, payload: &Payload) -> Result<()> {
        let record: FutureRecord<'_, (), [u8]> =
            FutureRecord::to(&self.topic).payload(payload.as_bytes());
        self.producer
            .send(record, Timeout::Never)
            .await
            .map_err(|(err, _)| err)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "kafka"
    }

    async fn close(&self) -> Result<()> {
        self.producer.flush(Timeout::After(FLUSH_TIMEOUT))?;
        Ok(())
    }
}
