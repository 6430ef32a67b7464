//! Allocation request and outcome types
//!
//! One request describes one cycle: the budget, the pools, and how to build them.
//! The outcome always carries a complete map, plus every anomaly met on the way.

use super::amount::{self, Amount};
use super::pool::{PoolDescriptor, PoolId};
use crate::error::InvariantViolation;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Per-pool allocation, keyed and iterated in pool-id order
pub type AllocationMap = BTreeMap<PoolId, Amount>;

/// How the pools of a request are to be built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    /// Real pools, built per kind tag and refreshed against the ledger
    Organic,
    /// Every pool is synthetic; no ledger access
    Synthetic,
}

impl Default for RequestType {
    fn default() -> Self {
        RequestType::Synthetic
    }
}

/// Inbound allocation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRequest {
    /// Organic or synthetic
    #[serde(default)]
    pub request_type: RequestType,

    /// Total capital available this cycle
    pub total_assets: Amount,

    /// Pools to allocate across
    pub pools: BTreeMap<PoolId, PoolDescriptor>,

    /// Depositor address, used by pools whose rate depends on it
    #[serde(default)]
    pub user_address: Option<String>,
}

impl AllocationRequest {
    /// Create a synthetic request
    pub fn new(total_assets: Amount) -> Self {
        Self {
            request_type: RequestType::Synthetic,
            total_assets,
            pools: BTreeMap::new(),
            user_address: None,
        }
    }

    /// Add a pool
    pub fn with_pool(mut self, id: impl Into<PoolId>, descriptor: PoolDescriptor) -> Self {
        self.pools.insert(id.into(), descriptor);
        self
    }

    /// Set the request type
    pub fn with_request_type(mut self, request_type: RequestType) -> Self {
        self.request_type = request_type;
        self
    }

    /// Set the depositor address
    pub fn with_user_address(mut self, user_address: impl Into<String>) -> Self {
        self.user_address = Some(user_address.into());
        self
    }
}

/// Pool with its projected yield, as ranked by the scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPool {
    pub pool: PoolId,
    /// Annualized rate; zero when the query failed
    pub rate: Decimal,
    /// Whether the rate query succeeded
    pub reachable: bool,
}

/// Which remote read failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadStage {
    Refresh,
    Minimum,
    YieldRate,
}

/// Reportable, recovered condition met during a cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anomaly {
    /// A pool's read failed; it was scored at zero and/or given its fallback minimum
    RemoteRead {
        pool: PoolId,
        stage: ReadStage,
        reason: String,
    },
    /// Minimums alone exceed the investable budget
    DegenerateBudget { minimums: Amount, investable: Amount },
    /// The computed map failed validation and was replaced by the minimums-only map
    InvariantViolation { violations: Vec<InvariantViolation> },
}

/// Result of one allocation cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationOutcome {
    /// Cycle identifier
    pub cycle_id: Uuid,

    /// Final map; covers every requested pool
    pub allocations: AllocationMap,

    /// Pools ordered best first
    pub ranking: Vec<ScoredPool>,

    /// `floor(threshold * total_assets)`
    pub investable: Amount,

    /// Recovered conditions, in the order they were met
    pub anomalies: Vec<Anomaly>,

    /// Whether the minimums-only fallback was substituted
    pub fallback: bool,

    /// Unix millis
    pub computed_at: i64,
}

impl AllocationOutcome {
    /// Sum of all allocations
    pub fn total_allocated(&self) -> Amount {
        amount::total(self.allocations.values())
    }

    /// True when no anomaly was raised
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }

    /// Best-ranked pool, if any
    pub fn best_pool(&self) -> Option<&PoolId> {
        self.ranking.first().map(|scored| &scored.pool)
    }
}
