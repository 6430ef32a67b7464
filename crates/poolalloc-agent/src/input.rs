//! Request file format
//!
//! An allocation request plus an optional `ledger` table that seeds the in-memory
//! ledger for organic pools:
//!
//! ```json
//! {
//!   "request_type": "organic",
//!   "total_assets": 1000000,
//!   "pools": { "main": { "kind": "compound_v3", "contract_address": "0xc3" } },
//!   "ledger": { "0xc3": { "reserve": { "total_borrow": 250000 }, "supply_rate": "0.041" } }
//! }
//! ```

use anyhow::{Context, Result};
use poolalloc_common::{AllocationRequest, Amount, PoolDescriptor, PoolId, RequestType};
use poolalloc_pools::{InMemoryLedger, LedgerEntry};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Parsed request file
#[derive(Debug, Clone, Deserialize)]
pub struct AgentInput {
    #[serde(default)]
    pub request_type: RequestType,
    pub total_assets: Amount,
    pub pools: BTreeMap<PoolId, PoolDescriptor>,
    #[serde(default)]
    pub user_address: Option<String>,
    #[serde(default)]
    pub ledger: BTreeMap<String, LedgerEntry>,
}

impl AgentInput {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("malformed request")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read request file {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Split into the allocation request and its ledger
    pub fn into_parts(self) -> (AllocationRequest, InMemoryLedger) {
        let request = AllocationRequest {
            request_type: self.request_type,
            total_assets: self.total_assets,
            pools: self.pools,
            user_address: self.user_address,
        };
        (request, InMemoryLedger::from_entries(self.ledger))
    }
}
