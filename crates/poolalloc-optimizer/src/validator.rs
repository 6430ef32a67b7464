//! Final-map validation
//!
//! A map is valid when it covers exactly the requested pools, every entry sits in
//! `[minimum, effective max]`, and the total stays within budget. In a degenerate cycle
//! the minimums alone set the budget bound. An invalid map is replaced by the
//! minimums-only map.

use crate::optimizer::Limits;
use poolalloc_common::{types::amount::total, AllocationMap, Amount, Anomaly, InvariantViolation};
use tracing::error;

/// Checks allocation maps against pool limits and the investable budget
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocationValidator;

impl AllocationValidator {
    /// Every broken invariant, or `Ok` for a valid map
    pub fn validate(
        allocation: &AllocationMap,
        limits: &Limits,
        investable: Amount,
    ) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();

        for pool in limits.keys() {
            if !allocation.contains_key(pool) {
                violations.push(InvariantViolation::MissingPool(pool.clone()));
            }
        }

        for (pool, &allocated) in allocation {
            let Some(bounds) = limits.get(pool) else {
                violations.push(InvariantViolation::UnknownPool(pool.clone()));
                continue;
            };
            if allocated < bounds.min {
                violations.push(InvariantViolation::BelowMinimum {
                    pool: pool.clone(),
                    allocated,
                    minimum: bounds.min,
                });
            }
            if let Some(capacity) = bounds.effective_max() {
                if allocated > capacity {
                    violations.push(InvariantViolation::AboveCapacity {
                        pool: pool.clone(),
                        allocated,
                        capacity,
                    });
                }
            }
        }

        let minimum_total = total(limits.values().map(|bounds| &bounds.min));
        let bound = investable.max(minimum_total);
        let allocated = total(allocation.values());
        if allocated > bound {
            violations.push(InvariantViolation::OverBudget {
                total: allocated,
                bound,
            });
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Minimums-only map
    pub fn fallback(limits: &Limits) -> AllocationMap {
        limits
            .iter()
            .map(|(pool, bounds)| (pool.clone(), bounds.min))
            .collect()
    }

    /// Validate `allocation`, substituting the fallback map on failure.
    ///
    /// Returns the map to publish and whether it is the fallback.
    pub fn finalize(
        allocation: AllocationMap,
        limits: &Limits,
        investable: Amount,
        anomalies: &mut Vec<Anomaly>,
    ) -> (AllocationMap, bool) {
        match Self::validate(&allocation, limits, investable) {
            Ok(()) => (allocation, false),
            Err(violations) => {
                for violation in &violations {
                    error!(%violation, "Allocation invariant broken");
                }
                anomalies.push(Anomaly::InvariantViolation { violations });
                (Self::fallback(limits), true)
            }
        }
    }
}
