//! Ledger boundary
//!
//! Pools read their on-chain state and quote supply rates through [`LedgerClient`].
//! Real chain access lives outside this workspace; [`InMemoryLedger`] backs tests and
//! the offline agent.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use poolalloc_common::Amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Debt and capacity state of one pool contract
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveState {
    /// Stable debt including interest accrued up to the next block
    #[serde(default)]
    pub next_total_stable_debt: Amount,
    /// Variable debt
    #[serde(default)]
    pub total_variable_debt: Amount,
    /// Total borrowed (silo and compound-style markets)
    #[serde(default)]
    pub total_borrow: Amount,
    /// Largest total deposit the contract accepts
    #[serde(default)]
    pub supply_cap: Option<Amount>,
}

/// Supply-rate quote request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateQuery {
    pub contract: String,
    /// Depositor, for markets whose rate depends on it
    pub user: Option<String>,
    /// Candidate deposit, for markets whose rate depends on size
    pub amount: Option<Amount>,
}

/// Errors returned by a ledger client
#[derive(Debug, Clone, thiserror::Error)]
pub enum LedgerError {
    #[error("Ledger unreachable: {0}")]
    Unreachable(String),

    #[error("Unknown contract: {0}")]
    UnknownContract(String),
}

/// Read-only access to pool contracts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Read the debt/capacity state of a contract
    async fn read_reserve(&self, contract: &str) -> Result<ReserveState, LedgerError>;

    /// Quote the annualized supply rate for a candidate deposit
    async fn quote_supply_rate(&self, query: &RateQuery) -> Result<Decimal, LedgerError>;
}

/// One contract in an [`InMemoryLedger`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(default)]
    pub reserve: ReserveState,
    #[serde(default)]
    pub supply_rate: Decimal,
}

/// In-memory ledger
///
/// Uses DashMap so pool reads can run concurrently. Contracts can be marked failing,
/// and every read can be delayed to exercise timeouts.
#[derive(Default)]
pub struct InMemoryLedger {
    entries: DashMap<String, LedgerEntry>,
    failing: DashSet<String>,
    latency: Option<Duration>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a contract -> entry table
    pub fn from_entries(entries: BTreeMap<String, LedgerEntry>) -> Self {
        let ledger = Self::new();
        for (contract, entry) in entries {
            ledger.entries.insert(contract, entry);
        }
        ledger
    }

    /// Register or replace a contract
    pub fn with_contract(self, contract: impl Into<String>, entry: LedgerEntry) -> Self {
        self.entries.insert(contract.into(), entry);
        self
    }

    /// Make every read of `contract` fail
    pub fn with_failing(self, contract: impl Into<String>) -> Self {
        self.failing.insert(contract.into());
        self
    }

    /// Delay every read
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    async fn lookup(&self, contract: &str) -> Result<LedgerEntry, LedgerError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.contains(contract) {
            return Err(LedgerError::Unreachable(format!("{} is not responding", contract)));
        }
        self.entries
            .get(contract)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| LedgerError::UnknownContract(contract.to_string()))
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn read_reserve(&self, contract: &str) -> Result<ReserveState, LedgerError> {
        let entry = self.lookup(contract).await?;
        debug!(contract, "Reserve read");
        Ok(entry.reserve)
    }

    async fn quote_supply_rate(&self, query: &RateQuery) -> Result<Decimal, LedgerError> {
        let entry = self.lookup(&query.contract).await?;
        Ok(entry.supply_rate)
    }
}
