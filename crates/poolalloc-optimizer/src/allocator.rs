//! Allocation cycle driver
//!
//! Runs one cycle end to end: build and refresh pools, plan the budget, rank yields,
//! optimize, validate. Remote failures degrade the affected pool only; the cycle always
//! produces a complete map.

use crate::budget::{remote_read, BudgetCalculator};
use crate::optimizer::{AllocationOptimizer, Limits, OptimizationInput};
use crate::remote::{guarded, refresh_all};
use crate::scoring::YieldScorer;
use crate::telemetry::AllocatorMetrics;
use crate::validator::AllocationValidator;
use crate::OptimizerConfig;
use poolalloc_common::{
    AllocationMap, AllocationOutcome, AllocationRequest, Amount, Anomaly, CapacityBounds, PoolId,
    ReadStage, Result, ScoredPool,
};
use poolalloc_pools::{LedgerClient, PoolFactory, PoolHandle, RefreshContext};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Allocation cycle runner
pub struct Allocator {
    config: OptimizerConfig,
    factory: PoolFactory,
    metrics: Option<Arc<AllocatorMetrics>>,
}

impl Allocator {
    /// Create an allocator; rejects an out-of-range configuration
    pub fn new(config: OptimizerConfig, ledger: Arc<dyn LedgerClient>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            factory: PoolFactory::new(ledger),
            metrics: None,
        })
    }

    /// Record every cycle into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<AllocatorMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Run one cycle for `request`
    #[instrument(skip(self, request), fields(pools = request.pools.len(), request_type = ?request.request_type))]
    pub async fn allocate(&self, request: &AllocationRequest) -> AllocationOutcome {
        let pools = self.factory.build_all(request);
        let ctx = RefreshContext::new(request.user_address.clone());
        self.allocate_pools(request.total_assets, pools, &ctx).await
    }

    /// Run one cycle over already-built pools
    pub async fn allocate_pools(
        &self,
        total_assets: Amount,
        mut pools: Vec<Box<dyn PoolHandle>>,
        ctx: &RefreshContext,
    ) -> AllocationOutcome {
        let started = Instant::now();
        let budget = BudgetCalculator::new(self.config.threshold);
        let mut anomalies = Vec::new();

        if pools.is_empty() {
            let outcome = self.outcome(
                AllocationMap::new(),
                Vec::new(),
                budget.investable(total_assets),
                anomalies,
                false,
            );
            self.finish(&outcome, started);
            return outcome;
        }

        let timeout = self.config.pool_timeout();
        let failures = refresh_all(&mut pools, ctx, timeout).await;
        let mut unreachable = BTreeSet::new();
        for err in &failures {
            warn!(pool = %err.pool(), error = %err, "Pool refresh failed; using fallback minimum");
            anomalies.push(remote_read(err.pool(), ReadStage::Refresh, err));
            unreachable.insert(err.pool().clone());
        }

        let investable = budget.investable(total_assets);
        let minimums =
            BudgetCalculator::collect_minimums(&pools, &unreachable, investable, &mut anomalies);
        let plan = budget.plan_reporting(total_assets, minimums, &mut anomalies);

        let limits: Limits = pools
            .iter()
            .map(|pool| {
                let min = plan.minimums.get(pool.id()).copied().unwrap_or(0);
                let max = guarded(pool.id(), || Ok(pool.capacity_bounds()))
                    .map(|bounds| bounds.max)
                    .unwrap_or(None);
                let bounds = CapacityBounds { min, max };
                (pool.id().clone(), bounds)
            })
            .collect();

        let scorer = YieldScorer::new(timeout);
        let probe = YieldScorer::probe_amount(plan.discretionary, pools.len());
        let ranking = scorer.score(&pools, &unreachable, probe, &mut anomalies).await;

        let mut optimizer =
            AllocationOptimizer::new(self.config.randomization_factor, self.config.seed);
        let allocation = optimizer.optimize(&OptimizationInput {
            investable: plan.investable,
            discretionary: plan.discretionary,
            limits: &limits,
            ranking: &ranking,
        });

        let (allocation, fallback) =
            AllocationValidator::finalize(allocation, &limits, plan.investable, &mut anomalies);

        let outcome = self.outcome(allocation, ranking, plan.investable, anomalies, fallback);
        self.finish(&outcome, started);
        outcome
    }

    fn outcome(
        &self,
        allocations: AllocationMap,
        ranking: Vec<ScoredPool>,
        investable: Amount,
        anomalies: Vec<Anomaly>,
        fallback: bool,
    ) -> AllocationOutcome {
        AllocationOutcome {
            cycle_id: Uuid::now_v7(),
            allocations,
            ranking,
            investable,
            anomalies,
            fallback,
            computed_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    fn finish(&self, outcome: &AllocationOutcome, started: Instant) {
        let elapsed = started.elapsed();
        if let Some(metrics) = &self.metrics {
            metrics.record(outcome, elapsed);
        }
        info!(
            cycle_id = %outcome.cycle_id,
            pools = outcome.allocations.len(),
            investable = outcome.investable,
            allocated = outcome.total_allocated(),
            best = outcome.best_pool().map(PoolId::as_str).unwrap_or("-"),
            anomalies = outcome.anomalies.len(),
            fallback = outcome.fallback,
            elapsed_ms = elapsed.as_millis() as u64,
            "Allocation cycle complete"
        );
    }
}
