//! # Publish Benchmark - Main Entry Point
//!
//! 1. **Parse arguments** and initialize logging
//! 2. **Validate configuration** before touching the network
//! 3. **Connect** to the selected backend and provision its topic or stream
//! 4. **Run** the closed-loop benchmark
//! 5. **Report** the summary on stdout and optionally as JSON
//!
//! Any fatal error (bad configuration, backend setup, a failed publish) ends
//! the process with a non-zero status and no results.

use anyhow::{Context, Result};
use clap::Parser;
use publish_bench::{
    benchmark::{BenchmarkConfig, BenchmarkRunner},
    cli::Args,
    logging,
    publisher::PublisherFactory,
    results::{ResultsManager, RunReport},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Flushes the file appender on drop, so it must outlive the run.
    let _log_guard = logging::init(args.verbose, args.quiet, args.log_file.as_deref())?;

    info!("Starting Publish Benchmark v{}", publish_bench::VERSION);
    debug!("Configuration: {:?}", args);

    let config = BenchmarkConfig::from_args(&args)?;
    info!("{}", config);

    let publisher = PublisherFactory::connect(&config.backend).await?;
    info!("Connected to {} backend", publisher.name());

    let runner = BenchmarkRunner::new(config.run.clone());
    let metrics = runner
        .run(Arc::clone(&publisher))
        .await
        .with_context(|| format!("{} benchmark aborted", config.backend.backend))?;

    if let Err(e) = publisher.close().await {
        warn!("Failed to close {} publisher cleanly: {}", publisher.name(), e);
    }

    let report = RunReport::new(&config, metrics);
    println!("{}", report);

    if let Some(ref output_file) = args.output_file {
        ResultsManager::new(output_file).write(&report)?;
    }

    info!("Publish Benchmark completed successfully");
    Ok(())
}
