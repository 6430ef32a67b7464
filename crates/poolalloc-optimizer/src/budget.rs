//! Budget calculation: investable budget, minimum reserves, discretionary remainder

use crate::remote::guarded;
use poolalloc_common::{
    types::amount::{mul_floor, total},
    Amount, Anomaly, PoolError, PoolId, PoolKind, ReadStage,
};
use poolalloc_pools::PoolHandle;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Budget split for one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetPlan {
    /// `floor(threshold * total_assets)`
    pub investable: Amount,
    /// Minimum reserve per pool
    pub minimums: BTreeMap<PoolId, Amount>,
    /// Sum of `minimums`
    pub minimum_total: Amount,
    /// `max(0, investable - minimum_total)`
    pub discretionary: Amount,
}

impl BudgetPlan {
    /// Minimums alone exceed the investable budget
    pub fn is_degenerate(&self) -> bool {
        self.minimum_total > self.investable
    }
}

/// Derives the investable budget and the discretionary remainder
#[derive(Debug, Clone, Copy)]
pub struct BudgetCalculator {
    threshold: Decimal,
}

impl BudgetCalculator {
    pub fn new(threshold: Decimal) -> Self {
        Self { threshold }
    }

    /// `floor(threshold * total_assets)`, exact
    pub fn investable(&self, total_assets: Amount) -> Amount {
        mul_floor(total_assets, self.threshold)
    }

    /// Split `total_assets` given each pool's minimum
    pub fn plan(&self, total_assets: Amount, minimums: BTreeMap<PoolId, Amount>) -> BudgetPlan {
        let investable = self.investable(total_assets);
        let minimum_total = total(minimums.values());
        let discretionary = investable.saturating_sub(minimum_total);

        debug!(investable, minimum_total, discretionary, "Budget planned");

        BudgetPlan {
            investable,
            minimums,
            minimum_total,
            discretionary,
        }
    }

    /// Plan and report a degenerate budget as an anomaly
    pub fn plan_reporting(
        &self,
        total_assets: Amount,
        minimums: BTreeMap<PoolId, Amount>,
        anomalies: &mut Vec<Anomaly>,
    ) -> BudgetPlan {
        let plan = self.plan(total_assets, minimums);
        if plan.is_degenerate() {
            warn!(
                minimums = plan.minimum_total,
                investable = plan.investable,
                "Minimum reserves exceed investable budget; discretionary clamped to zero"
            );
            anomalies.push(Anomaly::DegenerateBudget {
                minimums: plan.minimum_total,
                investable: plan.investable,
            });
        }
        plan
    }

    /// Read every pool's minimum reserve.
    ///
    /// Fixed-savings pools carry no debt and are reserved an equal share of `investable`
    /// instead. A pool without state falls back to its last-known minimum, or zero. Pools
    /// in `unreachable` already had their refresh failure reported, so only failures of
    /// pools that refreshed successfully are added to `anomalies`.
    pub fn collect_minimums(
        pools: &[Box<dyn PoolHandle>],
        unreachable: &BTreeSet<PoolId>,
        investable: Amount,
        anomalies: &mut Vec<Anomaly>,
    ) -> BTreeMap<PoolId, Amount> {
        let equal_share = investable / pools.len().max(1) as Amount;
        pools
            .iter()
            .map(|pool| {
                if pool.kind() == PoolKind::FixedSavings {
                    return (pool.id().clone(), equal_share);
                }
                let minimum = match guarded(pool.id(), || pool.minimum_reserve()) {
                    Ok(minimum) => minimum,
                    Err(err) => {
                        let fallback = pool.last_known_minimum().unwrap_or(0);
                        if !unreachable.contains(pool.id()) {
                            warn!(pool = %pool.id(), error = %err, fallback, "Minimum reserve unavailable");
                            anomalies.push(remote_read(pool.id(), ReadStage::Minimum, &err));
                        }
                        fallback
                    }
                };
                (pool.id().clone(), minimum)
            })
            .collect()
    }
}

pub(crate) fn remote_read(pool: &PoolId, stage: ReadStage, err: &PoolError) -> Anomaly {
    Anomaly::RemoteRead {
        pool: pool.clone(),
        stage,
        reason: err.to_string(),
    }
}
