use anyhow::{bail, Result};
use async_trait::async_trait;
use publish_bench::{BenchError, BenchmarkRunner, Payload, Publisher, RunConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Acknowledges every message until the broker "goes away"
struct FlakyBroker {
    healthy_for: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl Publisher for FlakyBroker {
    async fn publish_once(&self, payload: &Payload) -> Result<()> {
        assert_eq!(payload.len(), 64);
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.healthy_for {
            bail!("connection reset by peer");
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}

/// The first failed publish ends the whole run with an error and no metrics,
/// and the remaining workers stop issuing calls.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn publish_failure_aborts_run() {
    let broker = Arc::new(FlakyBroker {
        healthy_for: 20,
        calls: AtomicUsize::new(0),
    });
    let runner = BenchmarkRunner::new(RunConfig {
        messages: 10_000,
        payload_size: 64,
        concurrency: 8,
    });

    let err = runner.run(broker.clone()).await.unwrap_err();
    match &err {
        BenchError::Publish { source, .. } => {
            assert!(source.to_string().contains("connection reset"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let calls_at_abort = broker.calls.load(Ordering::SeqCst);
    assert!(calls_at_abort < 10_000);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(broker.calls.load(Ordering::SeqCst), calls_at_abort);
}
