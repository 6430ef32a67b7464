//! Prometheus metrics for allocation cycles

use poolalloc_common::{AllocationOutcome, Anomaly, ReadStage};
use std::time::Duration;

/// Cycle counters and timings
pub struct AllocatorMetrics {
    pub cycles_total: prometheus::IntCounter,
    pub fallbacks_total: prometheus::IntCounter,
    pub pool_read_failures_total: prometheus::IntCounterVec,
    pub degenerate_budgets_total: prometheus::IntCounter,
    pub cycle_duration_seconds: prometheus::Histogram,
}

impl AllocatorMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        Ok(Self {
            cycles_total: prometheus::IntCounter::new(
                "poolalloc_cycles_total",
                "Total allocation cycles run",
            )?,
            fallbacks_total: prometheus::IntCounter::new(
                "poolalloc_fallbacks_total",
                "Cycles that published the minimums-only map",
            )?,
            pool_read_failures_total: prometheus::IntCounterVec::new(
                prometheus::Opts::new(
                    "poolalloc_pool_read_failures_total",
                    "Failed remote pool reads",
                ),
                &["stage"],
            )?,
            degenerate_budgets_total: prometheus::IntCounter::new(
                "poolalloc_degenerate_budgets_total",
                "Cycles where minimums exceeded the investable budget",
            )?,
            cycle_duration_seconds: prometheus::Histogram::with_opts(
                prometheus::HistogramOpts::new(
                    "poolalloc_cycle_duration_seconds",
                    "Allocation cycle duration",
                )
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0]),
            )?,
        })
    }

    pub fn register(&self, registry: &prometheus::Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.cycles_total.clone()))?;
        registry.register(Box::new(self.fallbacks_total.clone()))?;
        registry.register(Box::new(self.pool_read_failures_total.clone()))?;
        registry.register(Box::new(self.degenerate_budgets_total.clone()))?;
        registry.register(Box::new(self.cycle_duration_seconds.clone()))?;
        Ok(())
    }

    /// Record a finished cycle
    pub fn record(&self, outcome: &AllocationOutcome, elapsed: Duration) {
        self.cycles_total.inc();
        if outcome.fallback {
            self.fallbacks_total.inc();
        }
        for anomaly in &outcome.anomalies {
            match anomaly {
                Anomaly::RemoteRead { stage, .. } => self
                    .pool_read_failures_total
                    .with_label_values(&[stage_label(*stage)])
                    .inc(),
                Anomaly::DegenerateBudget { .. } => self.degenerate_budgets_total.inc(),
                Anomaly::InvariantViolation { .. } => {}
            }
        }
        self.cycle_duration_seconds.observe(elapsed.as_secs_f64());
    }
}

fn stage_label(stage: ReadStage) -> &'static str {
    match stage {
        ReadStage::Refresh => "refresh",
        ReadStage::Minimum => "minimum",
        ReadStage::YieldRate => "yield_rate",
    }
}
