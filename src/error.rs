//! Error taxonomy for a benchmark run.
//!
//! Every variant is fatal: a run either completes its full message count or
//! stops with one of these errors and produces no metrics.

use thiserror::Error;

/// Fatal conditions that end a benchmark run
#[derive(Debug, Error)]
pub enum BenchError {
    /// Invalid run configuration, detected before any worker starts
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The random source could not fill the payload buffer
    #[error("failed to generate {size}-byte payload: {source}")]
    PayloadGeneration {
        size: usize,
        #[source]
        source: rand::Error,
    },

    /// Connecting to the backend or provisioning its topic failed
    #[error("{backend} setup failed: {source}")]
    BackendSetup {
        backend: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// A publish call reported failure; the whole run is aborted
    #[error("publish failed on worker {worker}: {source}")]
    Publish {
        worker: usize,
        #[source]
        source: anyhow::Error,
    },

    /// A worker task terminated without returning
    #[error("worker task terminated abnormally: {0}")]
    WorkerPanicked(#[from] tokio::task::JoinError),
}

impl BenchError {
    /// Shorthand for a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        BenchError::Config(message.into())
    }
}
