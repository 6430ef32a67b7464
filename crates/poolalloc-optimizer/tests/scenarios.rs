//! End-to-end allocation cycles

use async_trait::async_trait;
use poolalloc_common::{
    AllocationMap, AllocationRequest, Amount, Anomaly, CapacityBounds, PoolDescriptor, PoolError,
    PoolId, PoolKind, ReadStage, RequestType,
};
use poolalloc_optimizer::{Allocator, OptimizerConfig};
use poolalloc_pools::{
    InMemoryLedger, LedgerEntry, PoolHandle, RefreshContext, ReserveState, SyntheticPool,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

fn deterministic() -> Allocator {
    Allocator::new(
        OptimizerConfig::deterministic(dec!(0.99)),
        Arc::new(InMemoryLedger::new()),
    )
    .unwrap()
}

fn map(entries: &[(&str, Amount)]) -> AllocationMap {
    entries.iter().map(|(id, a)| (PoolId::from(*id), *a)).collect()
}

/// Pool whose rate query always fails
struct RatelessPool {
    id: PoolId,
    minimum: Amount,
}

#[async_trait]
impl PoolHandle for RatelessPool {
    fn id(&self) -> &PoolId {
        &self.id
    }
    fn kind(&self) -> PoolKind {
        PoolKind::Synthetic
    }
    async fn refresh(&mut self, _ctx: &RefreshContext) -> Result<(), PoolError> {
        Ok(())
    }
    fn minimum_reserve(&self) -> Result<Amount, PoolError> {
        Ok(self.minimum)
    }
    async fn yield_rate(&self, _candidate: Amount) -> Result<Decimal, PoolError> {
        Err(PoolError::RemoteRead {
            pool: self.id.clone(),
            reason: "rate oracle offline".to_string(),
        })
    }
    fn capacity_bounds(&self) -> CapacityBounds {
        CapacityBounds::unbounded(self.minimum)
    }
}

/// Pool whose refresh always fails but whose rate query would answer
struct FailingRefreshPool {
    id: PoolId,
    rate: Decimal,
}

#[async_trait]
impl PoolHandle for FailingRefreshPool {
    fn id(&self) -> &PoolId {
        &self.id
    }
    fn kind(&self) -> PoolKind {
        PoolKind::CompoundMarket
    }
    async fn refresh(&mut self, _ctx: &RefreshContext) -> Result<(), PoolError> {
        Err(PoolError::RemoteRead {
            pool: self.id.clone(),
            reason: "node unavailable".to_string(),
        })
    }
    fn minimum_reserve(&self) -> Result<Amount, PoolError> {
        Err(PoolError::StateUnavailable {
            pool: self.id.clone(),
        })
    }
    async fn yield_rate(&self, _candidate: Amount) -> Result<Decimal, PoolError> {
        Ok(self.rate)
    }
    fn capacity_bounds(&self) -> CapacityBounds {
        CapacityBounds::unbounded(0)
    }
}

/// Pool that panics on every call
struct PanickingPool(PoolId);

#[async_trait]
impl PoolHandle for PanickingPool {
    fn id(&self) -> &PoolId {
        &self.0
    }
    fn kind(&self) -> PoolKind {
        PoolKind::SiloStrategy
    }
    async fn refresh(&mut self, _ctx: &RefreshContext) -> Result<(), PoolError> {
        panic!("silo adapter bug")
    }
    fn minimum_reserve(&self) -> Result<Amount, PoolError> {
        panic!("silo adapter bug")
    }
    async fn yield_rate(&self, _candidate: Amount) -> Result<Decimal, PoolError> {
        panic!("silo adapter bug")
    }
    fn capacity_bounds(&self) -> CapacityBounds {
        panic!("silo adapter bug")
    }
}

#[tokio::test]
async fn test_remainder_to_best_pool() {
    let request = AllocationRequest::new(1000)
        .with_pool("X", PoolDescriptor::synthetic(100, dec!(0.03)))
        .with_pool("Y", PoolDescriptor::synthetic(50, dec!(0.05)));

    let outcome = deterministic().allocate(&request).await;

    // 990 investable, 150 in minimums, 840 discretionary to Y
    assert_eq!(outcome.allocations, map(&[("X", 100), ("Y", 890)]));
    assert_eq!(outcome.investable, 990);
    assert_eq!(outcome.total_allocated(), 990);
    assert_eq!(outcome.best_pool(), Some(&PoolId::from("Y")));
    assert!(outcome.is_clean());
    assert!(!outcome.fallback);
}

#[tokio::test]
async fn test_single_pool_takes_everything() {
    for total in [0u128, 1, 1000, 123_456_789_012_345_678_901_234_567] {
        let request =
            AllocationRequest::new(total).with_pool("only", PoolDescriptor::synthetic(0, dec!(0.01)));
        let outcome = deterministic().allocate(&request).await;
        assert_eq!(outcome.allocations[&PoolId::from("only")], outcome.investable);
    }
}

#[tokio::test]
async fn test_all_rate_queries_fail() {
    let pools: Vec<Box<dyn PoolHandle>> = vec![
        Box::new(RatelessPool {
            id: PoolId::from("b"),
            minimum: 100,
        }),
        Box::new(RatelessPool {
            id: PoolId::from("a"),
            minimum: 50,
        }),
    ];

    let outcome = deterministic()
        .allocate_pools(1000, pools, &RefreshContext::default())
        .await;

    // every pool scores zero; the tie goes to the lowest id
    assert_eq!(outcome.allocations, map(&[("a", 890), ("b", 100)]));
    assert!(!outcome.fallback);
    let failed: BTreeSet<&str> = outcome
        .anomalies
        .iter()
        .filter_map(|a| match a {
            Anomaly::RemoteRead {
                pool,
                stage: ReadStage::YieldRate,
                ..
            } => Some(pool.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(failed, BTreeSet::from(["a", "b"]));
}

#[tokio::test]
async fn test_minimums_exceed_budget() {
    let request = AllocationRequest::new(1000)
        .with_pool("x", PoolDescriptor::synthetic(700, dec!(0.04)))
        .with_pool("y", PoolDescriptor::synthetic(500, dec!(0.02)));

    let outcome = deterministic().allocate(&request).await;

    assert_eq!(outcome.allocations, map(&[("x", 700), ("y", 500)]));
    assert_eq!(
        outcome.anomalies,
        vec![Anomaly::DegenerateBudget {
            minimums: 1200,
            investable: 990
        }]
    );
    assert!(!outcome.fallback);
}

#[tokio::test]
async fn test_capped_pool_spills_to_next() {
    let request = AllocationRequest::new(10_000)
        .with_pool(
            "best",
            PoolDescriptor::synthetic(0, dec!(0.09)).with_max_deposit(2_000),
        )
        .with_pool("next", PoolDescriptor::synthetic(0, dec!(0.05)))
        .with_pool("last", PoolDescriptor::synthetic(0, dec!(0.01)));

    let outcome = deterministic().allocate(&request).await;

    assert_eq!(
        outcome.allocations,
        map(&[("best", 2_000), ("last", 0), ("next", 7_900)])
    );
}

#[tokio::test]
async fn test_perturbed_cycles_keep_invariants() {
    let request = AllocationRequest::new(10_000_000)
        .with_pool("a", PoolDescriptor::synthetic(1_000_000, dec!(0.02)))
        .with_pool("b", PoolDescriptor::synthetic(2_000_000, dec!(0.06)))
        .with_pool("c", PoolDescriptor::synthetic(500_000, dec!(0.04)));

    let mut seen = BTreeSet::new();
    for seed in 0..50 {
        let config = OptimizerConfig {
            randomization_factor: dec!(0.02),
            seed: Some(seed),
            ..OptimizerConfig::default()
        };
        let allocator = Allocator::new(config, Arc::new(InMemoryLedger::new())).unwrap();
        let outcome = allocator.allocate(&request).await;

        assert!(!outcome.fallback);
        assert_eq!(outcome.total_allocated(), 9_900_000);
        assert!(outcome.allocations[&PoolId::from("a")] >= 1_000_000);
        assert!(outcome.allocations[&PoolId::from("b")] >= 2_000_000);
        assert!(outcome.allocations[&PoolId::from("c")] >= 500_000);
        seen.insert(outcome.allocations.clone());
    }
    assert!(seen.len() > 1);
}

fn lending_entry(stable: Amount, variable: Amount, rate: Decimal) -> LedgerEntry {
    LedgerEntry {
        reserve: ReserveState {
            next_total_stable_debt: stable,
            total_variable_debt: variable,
            ..Default::default()
        },
        supply_rate: rate,
    }
}

fn borrow_entry(borrow: Amount, rate: Decimal, cap: Option<Amount>) -> LedgerEntry {
    LedgerEntry {
        reserve: ReserveState {
            total_borrow: borrow,
            supply_cap: cap,
            ..Default::default()
        },
        supply_rate: rate,
    }
}

#[tokio::test]
async fn test_organic_request_reads_ledger() {
    let ledger = InMemoryLedger::new()
        .with_contract("0xlend", lending_entry(100, 200, dec!(0.031)))
        .with_contract("0xcomp", borrow_entry(400, dec!(0.052), Some(1_000)))
        .with_contract("0xsave", borrow_entry(0, dec!(0.01), None));
    let allocator =
        Allocator::new(OptimizerConfig::deterministic(dec!(1)), Arc::new(ledger)).unwrap();

    let request = AllocationRequest::new(5_000)
        .with_request_type(RequestType::Organic)
        .with_user_address("0xuser")
        .with_pool("lend", PoolDescriptor::chain(PoolKind::VariableRateLending, "0xlend"))
        .with_pool("comp", PoolDescriptor::chain(PoolKind::CompoundMarket, "0xcomp"))
        .with_pool("save", PoolDescriptor::chain(PoolKind::FixedSavings, "0xsave"));

    let outcome = allocator.allocate(&request).await;

    // minimums: lend 300, comp 400, save 5000 / 3 = 1666; discretionary 2634
    // comp caps at 1000, the rest spills to lend; save keeps its share
    assert_eq!(
        outcome.allocations,
        map(&[("comp", 1_000), ("lend", 2_334), ("save", 1_666)])
    );
    assert!(outcome.is_clean());
}

#[tokio::test]
async fn test_unreachable_pool_uses_last_known_minimum() {
    let ledger = InMemoryLedger::new()
        .with_contract("0xok", borrow_entry(100, dec!(0.02), None))
        .with_failing("0xdown");
    let allocator =
        Allocator::new(OptimizerConfig::deterministic(dec!(1)), Arc::new(ledger)).unwrap();

    let request = AllocationRequest::new(1_000)
        .with_request_type(RequestType::Organic)
        .with_pool("ok", PoolDescriptor::chain(PoolKind::SiloStrategy, "0xok"))
        .with_pool(
            "down",
            PoolDescriptor::chain(PoolKind::SiloStrategy, "0xdown").with_last_known_minimum(250),
        );

    let outcome = allocator.allocate(&request).await;

    assert_eq!(outcome.allocations, map(&[("down", 250), ("ok", 750)]));
    assert!(outcome.anomalies.iter().any(|a| matches!(
        a,
        Anomaly::RemoteRead { pool, stage: ReadStage::Refresh, .. } if pool.as_str() == "down"
    )));
    assert!(!outcome.anomalies.iter().any(|a| matches!(
        a,
        Anomaly::RemoteRead { stage: ReadStage::YieldRate, .. }
    )));
    let down = outcome.ranking.iter().find(|s| s.pool.as_str() == "down").unwrap();
    assert!(!down.reachable);
    assert_eq!(down.rate, Decimal::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_ledger_times_out() {
    let ledger = InMemoryLedger::new()
        .with_contract("0xa", borrow_entry(10, dec!(0.05), None))
        .with_contract("0xb", borrow_entry(20, dec!(0.07), None))
        .with_latency(Duration::from_secs(30));
    let config = OptimizerConfig {
        pool_timeout_ms: 500,
        ..OptimizerConfig::deterministic(dec!(1))
    };
    let allocator = Allocator::new(config, Arc::new(ledger)).unwrap();

    let request = AllocationRequest::new(1_000)
        .with_request_type(RequestType::Organic)
        .with_pool("a", PoolDescriptor::chain(PoolKind::CompoundMarket, "0xa"))
        .with_pool(
            "b",
            PoolDescriptor::chain(PoolKind::CompoundMarket, "0xb").with_last_known_minimum(20),
        );

    let outcome = allocator.allocate(&request).await;

    assert_eq!(outcome.allocations, map(&[("a", 980), ("b", 20)]));
    // one timeout per pool: refresh fails, the rate is never queried
    assert_eq!(outcome.anomalies.len(), 2);
    assert!(outcome.anomalies.iter().all(|a| matches!(
        a,
        Anomaly::RemoteRead { stage: ReadStage::Refresh, .. }
    )));
}

#[tokio::test]
async fn test_synthetic_request_ignores_kind_tags() {
    let request = AllocationRequest::new(1_000).with_pool(
        "tagged",
        PoolDescriptor {
            kind: PoolKind::VariableRateLending,
            ..PoolDescriptor::synthetic(10, dec!(0.03))
        },
    );

    let outcome = deterministic().allocate(&request).await;

    assert_eq!(outcome.allocations, map(&[("tagged", 990)]));
    assert!(outcome.is_clean());
}

#[tokio::test]
async fn test_request_from_json() {
    let request: AllocationRequest = serde_json::from_str(
        r#"{
            "total_assets": 1000,
            "pools": {
                "X": {"borrow_amount": 100, "supply_rate": "0.03"},
                "Y": {"borrow_amount": 50, "supply_rate": "0.05"}
            }
        }"#,
    )
    .unwrap();

    let outcome = deterministic().allocate(&request).await;
    assert_eq!(outcome.allocations, map(&[("X", 100), ("Y", 890)]));
}

#[tokio::test]
async fn test_failed_refresh_is_never_best() {
    let pools: Vec<Box<dyn PoolHandle>> = vec![
        Box::new(FailingRefreshPool {
            id: PoolId::from("down"),
            rate: dec!(0.50),
        }),
        Box::new(SyntheticPool::new(PoolId::from("up"), 0, dec!(0.05))),
    ];
    let allocator =
        Allocator::new(OptimizerConfig::deterministic(dec!(1)), Arc::new(InMemoryLedger::new()))
            .unwrap();

    let outcome = allocator
        .allocate_pools(1_000, pools, &RefreshContext::default())
        .await;

    assert_eq!(outcome.allocations, map(&[("down", 0), ("up", 1_000)]));
    assert_eq!(outcome.best_pool(), Some(&PoolId::from("up")));
    assert_eq!(
        outcome.anomalies,
        vec![Anomaly::RemoteRead {
            pool: PoolId::from("down"),
            stage: ReadStage::Refresh,
            reason: "Remote read failed for pool down: node unavailable".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_panicking_pool_is_isolated() {
    let handle = tokio::spawn(async {
        let pools: Vec<Box<dyn PoolHandle>> = vec![
            Box::new(PanickingPool(PoolId::from("bad"))),
            Box::new(SyntheticPool::new(PoolId::from("good"), 100, dec!(0.02))),
        ];
        deterministic()
            .allocate_pools(1_000, pools, &RefreshContext::default())
            .await
    });

    let outcome = handle.await.unwrap();

    assert_eq!(outcome.allocations, map(&[("bad", 0), ("good", 990)]));
    assert!(!outcome.fallback);
    assert!(outcome.anomalies.iter().any(|a| matches!(
        a,
        Anomaly::RemoteRead { pool, stage: ReadStage::Refresh, reason }
            if pool.as_str() == "bad" && reason.contains("silo adapter bug")
    )));
}
