//! Allocation optimizer
//!
//! Every pool first receives its minimum reserve; the discretionary remainder goes to
//! the best-ranked pool, spilling down the ranking when a pool hits its cap. The map is
//! then perturbed, re-clamped and reconciled so the total lands on the investable budget.

pub mod perturb;
pub mod reconcile;

pub use perturb::Perturbation;
pub use reconcile::Limits;

use poolalloc_common::{types::amount::total, AllocationMap, Amount, ScoredPool};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

/// Everything the optimizer needs for one cycle
#[derive(Debug, Clone, Copy)]
pub struct OptimizationInput<'a> {
    /// Target total
    pub investable: Amount,
    /// Budget left after minimums
    pub discretionary: Amount,
    /// Per-pool `[minimum, max]`
    pub limits: &'a Limits,
    /// Pools best first
    pub ranking: &'a [ScoredPool],
}

/// Computes the allocation map
#[derive(Debug)]
pub struct AllocationOptimizer {
    perturbation: Perturbation,
    rng: StdRng,
}

impl AllocationOptimizer {
    /// Seeded optimizer; `None` draws the seed from OS entropy
    pub fn new(randomization_factor: Decimal, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            perturbation: Perturbation::new(randomization_factor),
            rng,
        }
    }

    /// Minimums plus the remainder along the ranking, before perturbation
    pub fn base_allocation(input: &OptimizationInput<'_>) -> AllocationMap {
        let mut allocation: AllocationMap = input
            .limits
            .iter()
            .map(|(pool, bounds)| (pool.clone(), bounds.min))
            .collect();

        let unplaced = reconcile::distribute(
            &mut allocation,
            input.limits,
            input.ranking,
            input.discretionary,
        );
        if unplaced > 0 {
            warn!(unplaced, "Every pool is at capacity; remainder left unallocated");
        }
        allocation
    }

    /// Compute the final map for one cycle
    #[instrument(skip(self, input), fields(pools = input.limits.len(), investable = input.investable))]
    pub fn optimize(&mut self, input: &OptimizationInput<'_>) -> AllocationMap {
        let mut allocation = Self::base_allocation(input);

        self.perturbation.apply(&mut allocation, &mut self.rng);
        reconcile::clamp(&mut allocation, input.limits);
        reconcile::reconcile(&mut allocation, input.limits, input.ranking, input.investable);

        debug!(
            total = total(allocation.values()),
            perturbation_ppm = self.perturbation.magnitude_ppm(),
            "Allocation computed"
        );
        allocation
    }
}
