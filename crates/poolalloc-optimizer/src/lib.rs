//! # Poolalloc Optimizer
//!
//! Turns {budget, pool states, yield rates} into a validated allocation map.
//!
//! ## Cycle
//!
//! ```text
//! refresh (concurrent, bounded)
//!   -> BudgetCalculator   investable = floor(threshold x total), minus minimums
//!   -> YieldScorer        probe = discretionary / n, rank by rate desc, id asc
//!   -> AllocationOptimizer minimums + remainder to best, perturb, clamp, reconcile
//!   -> AllocationValidator on failure: minimums-only map, flagged
//! ```
//!
//! Every recovered failure is recorded as an [`Anomaly`](poolalloc_common::Anomaly) on
//! the outcome. A cycle never fails.

pub mod allocator;
pub mod budget;
pub mod optimizer;
pub mod remote;
pub mod scoring;
pub mod telemetry;
pub mod validator;

pub use allocator::Allocator;
pub use budget::{BudgetCalculator, BudgetPlan};
pub use optimizer::{AllocationOptimizer, OptimizationInput};
pub use scoring::YieldScorer;
pub use telemetry::AllocatorMetrics;
pub use validator::AllocationValidator;

use poolalloc_common::{
    AllocError, Result, DEFAULT_POOL_TIMEOUT_MS, DEFAULT_RANDOMIZATION_FACTOR, DEFAULT_THRESHOLD,
};
use rust_decimal::Decimal;
use std::time::Duration;

/// Optimizer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerConfig {
    /// Fraction of the total budget that may be allocated, in (0, 1]
    pub threshold: Decimal,
    /// Perturbation magnitude, in [0, 1)
    pub randomization_factor: Decimal,
    /// Bound on each remote pool read
    pub pool_timeout_ms: u64,
    /// Fixed RNG seed; every cycle reuses it when set
    pub seed: Option<u64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            randomization_factor: DEFAULT_RANDOMIZATION_FACTOR,
            pool_timeout_ms: DEFAULT_POOL_TIMEOUT_MS,
            seed: None,
        }
    }
}

impl OptimizerConfig {
    /// Deterministic configuration: no perturbation
    pub fn deterministic(threshold: Decimal) -> Self {
        Self {
            threshold,
            randomization_factor: Decimal::ZERO,
            ..Self::default()
        }
    }

    pub fn pool_timeout(&self) -> Duration {
        Duration::from_millis(self.pool_timeout_ms)
    }

    /// Reject out-of-range fractions
    pub fn validate(&self) -> Result<()> {
        if self.threshold <= Decimal::ZERO || self.threshold > Decimal::ONE {
            return Err(AllocError::Config(format!(
                "threshold must be in (0, 1], got {}",
                self.threshold
            )));
        }
        if self.randomization_factor < Decimal::ZERO || self.randomization_factor >= Decimal::ONE {
            return Err(AllocError::Config(format!(
                "randomization_factor must be in [0, 1), got {}",
                self.randomization_factor
            )));
        }
        if self.pool_timeout_ms == 0 {
            return Err(AllocError::Config("pool_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }
}
