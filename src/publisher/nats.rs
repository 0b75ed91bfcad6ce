use super::{BackendConfig, Publisher};
use crate::payload::Payload;
use anyhow::{Context, Result};
use async_nats::jetstream::{self, stream};
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// NATS JetStream publisher
///
/// Each publish waits for the JetStream `PubAck`, which the server sends once
/// the message is stored on the configured number of replicas.
pub struct NatsPublisher {
    client: async_nats::Client,
    context: jetstream::Context,
    subject: String,
}

impl NatsPublisher {
    /// Connect and make sure a stream captures the benchmark subject
    pub async fn connect(config: &BackendConfig) -> Result<Self> {
        let client = async_nats::ConnectOptions::new()
            .name("bench-nats")
            .connect(config.servers.as_str())
            .await
            .with_context(|| format!("failed to connect to NATS at {}", config.servers))?;
        debug!("Connected to NATS at {}", config.servers);

        let context = jetstream::new(client.clone());

        let stream_config = stream::Config {
            name: crate::defaults::NATS_STREAM.to_string(),
            subjects: vec![config.topic.clone()],
            num_replicas: config.replicas as usize,
            storage: stream::StorageType::File,
            retention: stream::RetentionPolicy::Limits,
            ..Default::default()
        };

        // An existing stream with different settings is not fatal; publishes
        // still succeed as long as some stream binds the subject.
        match context.get_or_create_stream(stream_config).await {
            Ok(_) => info!(
                "JetStream stream {} ready for subject {} ({} replicas)",
                crate::defaults::NATS_STREAM,
                config.topic,
                config.replicas
            ),
            Err(e) => warn!(
                "Could not ensure JetStream stream {}: {}",
                crate::defaults::NATS_STREAM,
                e
            ),
        }

        Ok(Self {
            client,
            context,
            subject: config.topic.clone(),
        })
    }
}

#[async_trait]
impl Publisher for NatsPublisher {
    async fn publish_once(&self, payload: &Payload) -> Result<()> {
        let ack = self
            .context
            .publish(self.subject.clone(), payload.to_bytes())
            .await?;
        ack.await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "nats"
    }

    async fn close(&self) -> Result<()> {
        self.client.flush().await?;
        Ok(())
    }
}
