//! Agent configuration

use anyhow::{Context, Result};
use poolalloc_optimizer::OptimizerConfig;
use std::path::PathBuf;
use std::str::FromStr;

/// Agent configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentConfig {
    /// Optimizer settings
    pub optimizer: OptimizerConfig,
    /// Request file, used when none is given on the command line
    pub request_path: Option<PathBuf>,
    /// Dump Prometheus metrics to stderr after the cycle
    pub dump_metrics: bool,
}

impl AgentConfig {
    /// Load configuration from `.env` and the environment
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = parse(&lookup, "POOLALLOC_THRESHOLD")? {
            cfg.optimizer.threshold = v;
        }
        if let Some(v) = parse(&lookup, "POOLALLOC_RANDOMIZATION_FACTOR")? {
            cfg.optimizer.randomization_factor = v;
        }
        if let Some(v) = parse(&lookup, "POOLALLOC_POOL_TIMEOUT_MS")? {
            cfg.optimizer.pool_timeout_ms = v;
        }
        if let Some(v) = parse(&lookup, "POOLALLOC_SEED")? {
            cfg.optimizer.seed = Some(v);
        }
        if let Some(v) = parse(&lookup, "POOLALLOC_DUMP_METRICS")? {
            cfg.dump_metrics = v;
        }
        if let Some(path) = lookup("POOLALLOC_REQUEST_PATH") {
            cfg.request_path = Some(PathBuf::from(path));
        }

        cfg.optimizer.validate()?;
        Ok(cfg)
    }
}

fn parse<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("invalid value for {key}: {raw:?}"))
        })
        .transpose()
}
