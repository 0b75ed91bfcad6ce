use super::Publisher;
use crate::payload::Payload;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// In-process backend that acknowledges every message locally
///
/// Useful for measuring the harness's own overhead and for dry runs without a
/// broker. An optional fixed delay stands in for broker round-trip time.
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    ack_delay: Option<Duration>,
    acked_messages: AtomicU64,
    acked_bytes: AtomicU64,
}

impl MemoryPublisher {
    pub fn new(ack_delay: Option<Duration>) -> Self {
        Self {
            ack_delay,
            acked_messages: AtomicU64::new(0),
            acked_bytes: AtomicU64::new(0),
        }
    }

    pub fn acked_messages(&self) -> u64 {
        self.acked_messages.load(Ordering::Relaxed)
    }

    pub fn acked_bytes(&self) -> u64 {
        self.acked_bytes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Publisher for MemoryPublisher {
    async fn publish_once(&self, payload: &Payload) -> Result<()> {
        if let Some(delay) = self.ack_delay {
            sleep(delay).await;
        }
        self.acked_messages.fetch_add(1, Ordering::Relaxed);
        self.acked_bytes
            .fetch_add(payload.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }

    async fn close(&self) -> Result<()> {
        debug!(
            "Memory backend acknowledged {} messages ({} bytes)",
            self.acked_messages(),
            self.acked_bytes()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_memory_publisher_counts() {
        let publisher = MemoryPublisher::new(None);
        let payload = Payload::from(vec![0u8; 100]);

        for _ in 0..3 {
            publisher.publish_once(&payload).await.unwrap();
        }

        assert_eq!(publisher.acked_messages(), 3);
        assert_eq!(publisher.acked_bytes(), 300);
    }

    #[tokio::test]
    async fn test_memory_publisher_ack_delay() {
        let delay = Duration::from_millis(10);
        let publisher = MemoryPublisher::new(Some(delay));
        let payload = Payload::from(vec![0u8; 8]);

        let started = Instant::now();
        publisher.publish_once(&payload).await.unwrap();
        assert!(started.elapsed() >= delay);
    }
}
