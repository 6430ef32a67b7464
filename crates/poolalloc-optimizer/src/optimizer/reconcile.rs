//! Re-clamping and total reconciliation
//!
//! Slack is handed out along the ranking, best first, up to each pool's headroom.
//! Excess is trimmed starting at the lowest-yield pool, never below a pool's minimum.

use poolalloc_common::{types::amount::total, AllocationMap, Amount, CapacityBounds, PoolId, ScoredPool};
use std::collections::BTreeMap;

/// Pool limits for one cycle; `min` is the pool's minimum reserve
pub type Limits = BTreeMap<PoolId, CapacityBounds>;

/// Add `amount` along `ranking`, best first; returns what no pool could absorb
pub fn distribute(
    allocation: &mut AllocationMap,
    limits: &Limits,
    ranking: &[ScoredPool],
    amount: Amount,
) -> Amount {
    let mut remaining = amount;
    for scored in ranking {
        if remaining == 0 {
            break;
        }
        let Some(current) = allocation.get_mut(&scored.pool) else {
            continue;
        };
        let room = limits
            .get(&scored.pool)
            .and_then(|bounds| bounds.headroom(*current))
            .unwrap_or(Amount::MAX);
        let added = remaining.min(room);
        *current += added;
        remaining -= added;
    }
    remaining
}

/// Bring every allocation back into `[minimum, max]`
pub fn clamp(allocation: &mut AllocationMap, limits: &Limits) {
    for (pool, amount) in allocation.iter_mut() {
        if let Some(bounds) = limits.get(pool) {
            *amount = bounds.clamp(*amount);
        }
    }
}

/// Trim `excess` starting at the lowest-yield pool; returns what could not be trimmed
pub fn trim(
    allocation: &mut AllocationMap,
    limits: &Limits,
    ranking: &[ScoredPool],
    excess: Amount,
) -> Amount {
    let mut remaining = excess;
    for scored in ranking.iter().rev() {
        if remaining == 0 {
            break;
        }
        let Some(current) = allocation.get_mut(&scored.pool) else {
            continue;
        };
        let floor = limits.get(&scored.pool).map(|b| b.min).unwrap_or(0);
        let cut = remaining.min(current.saturating_sub(floor));
        *current -= cut;
        remaining -= cut;
    }
    remaining
}

/// Make the total land on `investable`: top up the best pools on undershoot,
/// trim from the worst on overshoot
pub fn reconcile(
    allocation: &mut AllocationMap,
    limits: &Limits,
    ranking: &[ScoredPool],
    investable: Amount,
) {
    let sum = total(allocation.values());
    if sum < investable {
        distribute(allocation, limits, ranking, investable - sum);
    } else if sum > investable {
        trim(allocation, limits, ranking, sum - investable);
    }
}
