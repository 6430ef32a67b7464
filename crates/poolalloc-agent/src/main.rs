//! Poolalloc Agent Binary
//!
//! `poolalloc-agent [request.json]`; falls back to `POOLALLOC_REQUEST_PATH`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use prometheus::{Encoder, TextEncoder};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use poolalloc_agent::{run_cycle, AgentConfig, AgentInput};
use poolalloc_common::VERSION;
use poolalloc_optimizer::AllocatorMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the outcome
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting poolalloc agent v{}", VERSION);

    let config = AgentConfig::load()?;
    info!("Loaded configuration: {:?}", config);

    let path = match std::env::args().nth(1).map(PathBuf::from).or(config.request_path.clone()) {
        Some(path) => path,
        None => bail!("no request file given; pass a path or set POOLALLOC_REQUEST_PATH"),
    };
    let input = AgentInput::from_file(&path)?;
    info!(path = %path.display(), pools = input.pools.len(), "Request loaded");

    let registry = prometheus::Registry::new();
    let metrics = Arc::new(AllocatorMetrics::new()?);
    metrics.register(&registry)?;

    let outcome = run_cycle(&config, input, Some(metrics)).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if config.dump_metrics {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
        eprintln!("{}", String::from_utf8_lossy(&buffer));
    }

    Ok(())
}
