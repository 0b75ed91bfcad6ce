use super::{BackendConfig, Publisher};
use crate::payload::Payload;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ::pulsar::producer::{Producer, ProducerOptions};
use ::pulsar::{ConnectionRetryOptions, OperationRetryOptions, Pulsar, TokioExecutor};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Apache Pulsar publisher with batching disabled
///
/// The client's producer needs `&mut self` to enqueue, so enqueueing is
/// serialized behind a mutex while the broker receipt is awaited outside it.
/// Workers therefore still overlap on the network round trip.
pub struct PulsarPublisher {
    producer: Mutex<Producer<TokioExecutor>>,
    // Keeps the connection pool alive for the producer's lifetime.
    _client: Pulsar<TokioExecutor>,
}

impl PulsarPublisher {
    pub async fn connect(config: &BackendConfig) -> Result<Self> {
        let client: Pulsar<TokioExecutor> = Pulsar::builder(config.servers.clone(), TokioExecutor)
            .with_operation_retry_options(OperationRetryOptions {
                operation_timeout: CLIENT_TIMEOUT,
                ..Default::default()
            })
            .with_connection_retry_options(ConnectionRetryOptions {
                connection_timeout: CLIENT_TIMEOUT,
                ..Default::default()
            })
            .build()
            .await
            .map_err(|e| anyhow!("failed to connect to Pulsar at {}: {}", config.servers, e))?;

        let topic = config.pulsar_topic();
        let producer = client
            .producer()
            .with_topic(topic.clone())
            .with_options(ProducerOptions {
                batch_size: None,
                ..Default::default()
            })
            .build()
            .await
            .map_err(|e| anyhow!("failed to create Pulsar producer for {}: {}", topic, e))?;
        debug!("Pulsar producer ready on {}", topic);

        Ok(Self {
            producer: Mutex::new(producer),
            _client: client,
        })
    }
}

#[async_trait]
impl Publisher for PulsarPublisher {
    async fn publish_once(&self, payload: &Payload) -> Result<()> {
        let receipt = {
            let mut producer = self.producer.lock().await;
            producer
                .send_non_blocking(payload.as_bytes().to_vec())
                .await
                .map_err(|e| anyhow!("pulsar send failed: {}", e))?
        };
        receipt
            .await
            .map_err(|e| anyhow!("pulsar receipt failed: {}", e))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "pulsar"
    }

    async fn close(&self) -> Result<()> {
        self.producer
            .lock()
            .await
            .close()
            .await
            .map_err(|e| anyhow!("pulsar close failed: {}", e))
    }
}
