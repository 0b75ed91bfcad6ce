use clap::{ArgAction, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Publish Benchmark - closed-loop publish latency and throughput for message brokers
#[derive(Parser, Debug, Clone)]
#[clap(version, about, long_about = None)]
pub struct Args {
    /// Messaging backend to drive
    #[clap(long = "system", alias = "backend", value_enum, default_value_t = crate::defaults::BACKEND, help_heading = "Core Options")]
    pub backend: Backend,

    /// Bootstrap URLs. nats: nats://host:4222; kafka: host:9092; pulsar: pulsar://host:6650
    #[clap(long, default_value = "", help_heading = "Core Options")]
    pub servers: String,

    /// Subject (NATS) or topic (Kafka, Pulsar)
    #[clap(long, default_value = crate::defaults::TOPIC, help_heading = "Core Options")]
    pub topic: String,

    /// Total number of messages to publish
    #[clap(short = 'n', long, default_value_t = crate::defaults::MESSAGES, help_heading = "Core Options")]
    pub messages: usize,

    /// Payload size in bytes
    #[clap(short = 's', long, default_value_t = crate::defaults::PAYLOAD_SIZE, help_heading = "Core Options")]
    pub size: usize,

    /// Number of parallel publishers
    #[clap(short = 'c', long, default_value_t = crate::defaults::CONCURRENCY, help_heading = "Core Options")]
    pub concurrency: usize,

    /// Kafka partitions to create the topic with
    #[clap(long, default_value_t = crate::defaults::PARTITIONS, help_heading = "Provisioning")]
    pub partitions: u32,

    /// JetStream stream replicas / Kafka replication factor
    #[clap(long, alias = "js-replicas", default_value_t = crate::defaults::REPLICAS, help_heading = "Provisioning")]
    pub replicas: u32,

    /// Pulsar tenant
    #[clap(long, default_value = crate::defaults::PULSAR_TENANT, help_heading = "Provisioning")]
    pub pulsar_tenant: String,

    /// Pulsar namespace
    #[clap(long, default_value = crate::defaults::PULSAR_NAMESPACE, help_heading = "Provisioning")]
    pub pulsar_namespace: String,

    /// Simulated acknowledgment delay for the memory backend (e.g. "250us", "2ms")
    #[clap(long, value_parser = parse_duration, help_heading = "Provisioning")]
    pub memory_ack_delay: Option<Duration>,

    /// Write the run report as JSON to this file
    #[clap(short = 'o', long, help_heading = "Output")]
    pub output_file: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[clap(short = 'v', long, action = ArgAction::Count, help_heading = "Output")]
    pub verbose: u8,

    /// Only log errors
    #[clap(short = 'q', long, default_value_t = false, help_heading = "Output")]
    pub quiet: bool,

    /// Also write plain-text logs to this file
    #[clap(long, help_heading = "Output")]
    pub log_file: Option<PathBuf>,
}

impl Default for Args {
    /// Arguments as if the binary were invoked with no flags
    fn default() -> Self {
        Args::parse_from(["publish-bench"])
    }
}

/// Supported messaging backends
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// NATS JetStream
    #[clap(name = "nats")]
    Nats,

    /// Apache Kafka
    #[clap(name = "kafka")]
    Kafka,

    /// Apache Pulsar
    #[clap(name = "pulsar")]
    Pulsar,

    /// In-process broker that acknowledges locally
    #[clap(name = "memory")]
    Memory,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Nats => write!(f, "NATS JetStream"),
            Backend::Kafka => write!(f, "Kafka"),
            Backend::Pulsar => write!(f, "Pulsar"),
            Backend::Memory => write!(f, "Memory"),
        }
    }
}

impl Backend {
    /// Whether the backend needs `--servers`
    pub fn requires_servers(&self) -> bool {
        !matches!(self, Backend::Memory)
    }

    /// Cargo feature that compiles the backend in
    pub fn feature_name(&self) -> &'static str {
        match self {
            Backend::Nats => "nats",
            Backend::Kafka => "kafka",
            Backend::Pulsar => "pulsar",
            Backend::Memory => "default",
        }
    }
}

/// Parse duration from string (e.g., "250us", "2ms", "1s", "5m")
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Duration cannot be empty".to_string());
    }

    let (num_str, unit) = if let Some(stripped) = s.strip_suffix("us") {
        (stripped, "us")
    } else if let Some(stripped) = s.strip_suffix("ms") {
        (stripped, "ms")
    } else if let Some(stripped) = s.strip_suffix('s') {
        (stripped, "s")
    } else if let Some(stripped) = s.strip_suffix('m') {
        (stripped, "m")
    } else {
        (s, "ms") // Default to milliseconds
    };

    let num: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number in duration: {}", num_str))?;

    if !num.is_finite() || num < 0.0 {
        return Err(format!("Duration must be a non-negative number: {}", s));
    }

    let unit_ns = match unit {
        "us" => 1_000.0,
        "ms" => 1_000_000.0,
        "s" => 1_000_000_000.0,
        "m" => 60_000_000_000.0,
        _ => return Err(format!("Invalid duration unit: {}", unit)),
    };

    Ok(Duration::from_nanos((num * unit_ns).round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("250us").unwrap(), Duration::from_micros(250));
        assert_eq!(parse_duration("2ms").unwrap(), Duration::from_millis(2));
        assert_eq!(parse_duration("1s").unwrap(), Duration::from_secs(1));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("10").unwrap(), Duration::from_millis(10));

        assert!(parse_duration("").is_err());
        assert!(parse_duration("invalid").is_err());
        assert!(parse_duration("-1ms").is_err());
    }

    #[test]
    fn test_backend_display() {
        assert_eq!(Backend::Nats.to_string(), "NATS JetStream");
        assert_eq!(Backend::Kafka.to_string(), "Kafka");
        assert_eq!(Backend::Pulsar.to_string(), "Pulsar");
        assert_eq!(Backend::Memory.to_string(), "Memory");
    }

    #[test]
    fn test_backend_requires_servers() {
        assert!(Backend::Nats.requires_servers());
        assert!(Backend::Kafka.requires_servers());
        assert!(Backend::Pulsar.requires_servers());
        assert!(!Backend::Memory.requires_servers());
    }

    #[test]
    fn test_default_args_match_defaults() {
        let args = Args::default();
        assert_eq!(args.backend, Backend::Nats);
        assert_eq!(args.topic, "bench");
        assert_eq!(args.messages, 100_000);
        assert_eq!(args.size, 512);
        assert_eq!(args.concurrency, 64);
        assert_eq!(args.partitions, 6);
        assert_eq!(args.replicas, 3);
        assert_eq!(args.pulsar_tenant, "public");
        assert_eq!(args.pulsar_namespace, "default");
        assert!(args.servers.is_empty());
        assert!(args.output_file.is_none());
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::parse_from([
            "publish-bench",
            "--system",
            "kafka",
            "--servers",
            "broker:9092",
            "-n",
            "1000",
            "-s",
            "100",
            "-c",
            "8",
            "-vv",
        ]);
        assert_eq!(args.backend, Backend::Kafka);
        assert_eq!(args.servers, "broker:9092");
        assert_eq!(args.messages, 1000);
        assert_eq!(args.size, 100);
        assert_eq!(args.concurrency, 8);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_parse_memory_ack_delay() {
        let args = Args::parse_from([
            "publish-bench",
            "--system",
            "memory",
            "--memory-ack-delay",
            "500us",
        ]);
        assert_eq!(args.backend, Backend::Memory);
        assert_eq!(args.memory_ack_delay, Some(Duration::from_micros(500)));
    }
}
