use crate::{
    benchmark::{BenchmarkConfig, RunConfig},
    cli::Backend,
    metrics::RunMetrics,
    publisher::BackendConfig,
    utils::{format_duration, generate_run_id, get_cpu_cores},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything known about one completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
    pub backend: BackendConfig,
    pub config: RunConfig,
    pub metrics: RunMetrics,
    pub system_info: SystemInfo,
}

/// System information for reproducibility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub architecture: String,
    pub cpu_cores: usize,
}

impl Default for SystemInfo {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            architecture: std::env::consts::ARCH.to_string(),
            cpu_cores: get_cpu_cores(),
        }
    }
}

impl RunReport {
    pub fn new(config: &BenchmarkConfig, metrics: RunMetrics) -> Self {
        Self {
            run_id: generate_run_id(),
            timestamp: chrono::Utc::now(),
            version: crate::VERSION.to_string(),
            backend: config.backend.clone(),
            config: config.run.clone(),
            metrics,
            system_info: SystemInfo::default(),
        }
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} | msgs={} size={}B conc={}",
            self.backend.backend, self.config.messages, self.config.payload_size, self.config.concurrency
        )?;
        match self.backend.backend {
            Backend::Nats => write!(f, " replicas={}", self.backend.replicas)?,
            Backend::Kafka => write!(f, " partitions~{}", self.backend.partitions)?,
            Backend::Pulsar => write!(f, " topic={}", self.backend.pulsar_topic())?,
            Backend::Memory => {}
        }
        writeln!(f)?;

        let throughput = &self.metrics.throughput;
        writeln!(
            f,
            "Throughput: {:.0} msg/s, {:.2} MB/s",
            throughput.messages_per_second, throughput.megabytes_per_second
        )?;
        writeln!(
            f,
            "Latency: p50={} p95={}",
            format_duration(self.metrics.p50),
            format_duration(self.metrics.p95)
        )?;

        let latency = &self.metrics.latency;
        write!(
            f,
            "Detail: elapsed={} acked={}/{} min={} mean={} p99={} max={}",
            format_duration(self.metrics.elapsed),
            self.metrics.acked,
            self.metrics.sent,
            format_duration(latency.min),
            format_duration(latency.mean),
            format_duration(latency.p99),
            format_duration(latency.max)
        )
    }
}

/// Writes run reports to disk
pub struct ResultsManager {
    output_file: PathBuf,
}

impl ResultsManager {
    pub fn new(output_file: &Path) -> Self {
        Self {
            output_file: output_file.to_path_buf(),
        }
    }

    pub fn output_file(&self) -> &Path {
        &self.output_file
    }

    /// Write the report as pretty-printed JSON, replacing any existing file
    pub fn write(&self, report: &RunReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(&self.output_file, json)
            .with_context(|| format!("failed to write results to {:?}", self.output_file))?;

        info!("Results written to: {:?}", self.output_file);
        Ok(())
    }
}
