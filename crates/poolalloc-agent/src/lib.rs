//! # Poolalloc Agent
//!
//! Offline driver for the allocator: loads a request file, runs one cycle against an
//! in-memory ledger, and reports the outcome as JSON.

pub mod config;
pub mod input;

pub use config::AgentConfig;
pub use input::AgentInput;

use anyhow::Result;
use poolalloc_common::AllocationOutcome;
use poolalloc_optimizer::{Allocator, AllocatorMetrics};
use std::sync::Arc;

/// Run one cycle for `input`
pub async fn run_cycle(
    config: &AgentConfig,
    input: AgentInput,
    metrics: Option<Arc<AllocatorMetrics>>,
) -> Result<AllocationOutcome> {
    let (request, ledger) = input.into_parts();
    let mut allocator = Allocator::new(config.optimizer.clone(), Arc::new(ledger))?;
    if let Some(metrics) = metrics {
        allocator = allocator.with_metrics(metrics);
    }
    Ok(allocator.allocate(&request).await)
}
