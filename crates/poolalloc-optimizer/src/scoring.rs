//! Yield scoring and ranking
//!
//! Each pool is asked for its projected rate on an equal-share probe deposit. A pool
//! whose refresh failed is not queried at all. A pool whose query fails, stalls or
//! panics scores zero and sinks to the bottom of the ranking; the rest of the cycle is
//! unaffected.

use crate::budget::remote_read;
use crate::remote::bounded;
use futures::future::join_all;
use poolalloc_common::{Amount, Anomaly, PoolId, ReadStage, ScoredPool};
use poolalloc_pools::PoolHandle;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, warn};

/// Queries and ranks pool yields
#[derive(Debug, Clone, Copy)]
pub struct YieldScorer {
    timeout: Duration,
}

impl YieldScorer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Probe deposit used only for rate estimation: the remainder split evenly.
    /// An empty pool set probes with zero rather than dividing by zero.
    pub fn probe_amount(discretionary: Amount, pool_count: usize) -> Amount {
        if pool_count == 0 {
            return 0;
        }
        discretionary / pool_count as Amount
    }

    /// Query every reachable pool concurrently and return all pools ranked best first.
    ///
    /// Pools in `unreachable` already failed this cycle; they score zero without a query.
    pub async fn score(
        &self,
        pools: &[Box<dyn PoolHandle>],
        unreachable: &BTreeSet<PoolId>,
        probe: Amount,
        anomalies: &mut Vec<Anomaly>,
    ) -> Vec<ScoredPool> {
        let results = join_all(pools.iter().map(|pool| async move {
            if unreachable.contains(pool.id()) {
                return None;
            }
            Some(bounded(pool.id(), self.timeout, pool.yield_rate(probe)).await)
        }))
        .await;

        let scores = pools
            .iter()
            .zip(results)
            .map(|(pool, result)| match result {
                Some(Ok(rate)) => {
                    debug!(pool = %pool.id(), %rate, probe, "Yield quoted");
                    ScoredPool {
                        pool: pool.id().clone(),
                        rate: rate.max(Decimal::ZERO),
                        reachable: true,
                    }
                }
                Some(Err(err)) => {
                    warn!(pool = %pool.id(), error = %err, "Yield query failed; scoring zero");
                    anomalies.push(remote_read(pool.id(), ReadStage::YieldRate, &err));
                    Self::failed(pool.id())
                }
                None => {
                    debug!(pool = %pool.id(), "Pool unreachable this cycle; scoring zero");
                    Self::failed(pool.id())
                }
            })
            .collect();

        Self::rank(scores)
    }

    fn failed(pool: &PoolId) -> ScoredPool {
        ScoredPool {
            pool: pool.clone(),
            rate: Decimal::ZERO,
            reachable: false,
        }
    }

    /// Order by descending rate, ties by ascending pool id
    pub fn rank(mut scores: Vec<ScoredPool>) -> Vec<ScoredPool> {
        scores.sort_by(|a, b| b.rate.cmp(&a.rate).then_with(|| a.pool.cmp(&b.pool)));
        scores
    }
}
