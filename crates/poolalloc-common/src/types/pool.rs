//! Pool identity and descriptors
//!
//! A descriptor is what a request says about a pool. Pool handles are built from
//! descriptors at the start of every cycle and discarded at its end.

use super::amount::Amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque pool key, unique within a request.
///
/// Ordering is plain string ordering and doubles as the deterministic tie-break rule.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolId(String);

impl PoolId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PoolId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PoolId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Pool implementations the allocator knows how to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolKind {
    /// Test pool whose state is fully described by the request
    #[serde(rename = "synthetic")]
    Synthetic,
    /// Variable-rate lending market (stable + variable debt)
    #[serde(rename = "aave_v3")]
    VariableRateLending,
    /// Silo lending strategy behind an aggregator vault
    #[serde(rename = "sturdy_silo")]
    SiloStrategy,
    /// Fixed-savings instrument with a single current rate
    #[serde(rename = "dai_savings")]
    FixedSavings,
    /// Compound-style lending market
    #[serde(rename = "compound_v3")]
    CompoundMarket,
}

impl PoolKind {
    /// Wire tag of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolKind::Synthetic => "synthetic",
            PoolKind::VariableRateLending => "aave_v3",
            PoolKind::SiloStrategy => "sturdy_silo",
            PoolKind::FixedSavings => "dai_savings",
            PoolKind::CompoundMarket => "compound_v3",
        }
    }
}

impl Default for PoolKind {
    fn default() -> Self {
        PoolKind::Synthetic
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-supplied description of one pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolDescriptor {
    /// Kind tag selecting the pool implementation
    #[serde(default, alias = "pool_type")]
    pub kind: PoolKind,

    /// Ledger address of the pool contract (chain-based kinds)
    #[serde(default)]
    pub contract_address: Option<String>,

    /// Outstanding borrow (synthetic pools)
    #[serde(default)]
    pub borrow_amount: Amount,

    /// Precomputed annualized supply rate (synthetic pools)
    #[serde(default)]
    pub supply_rate: Decimal,

    /// Largest total deposit the pool can absorb, if bounded
    #[serde(default)]
    pub max_deposit: Option<Amount>,

    /// Minimum reserve seen in an earlier cycle, used when the ledger is unreachable
    #[serde(default)]
    pub last_known_minimum: Option<Amount>,
}

impl PoolDescriptor {
    /// Descriptor for a synthetic pool
    pub fn synthetic(borrow_amount: Amount, supply_rate: Decimal) -> Self {
        Self {
            kind: PoolKind::Synthetic,
            contract_address: None,
            borrow_amount,
            supply_rate,
            max_deposit: None,
            last_known_minimum: None,
        }
    }

    /// Descriptor for a ledger-backed pool
    pub fn chain(kind: PoolKind, contract_address: impl Into<String>) -> Self {
        Self {
            kind,
            contract_address: Some(contract_address.into()),
            borrow_amount: 0,
            supply_rate: Decimal::ZERO,
            max_deposit: None,
            last_known_minimum: None,
        }
    }

    /// Cap the pool's total deposit
    pub fn with_max_deposit(mut self, max_deposit: Amount) -> Self {
        self.max_deposit = Some(max_deposit);
        self
    }

    /// Remember a minimum from an earlier cycle
    pub fn with_last_known_minimum(mut self, minimum: Amount) -> Self {
        self.last_known_minimum = Some(minimum);
        self
    }
}

/// Deposit range a pool accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityBounds {
    pub min: Amount,
    pub max: Option<Amount>,
}

impl CapacityBounds {
    pub fn unbounded(min: Amount) -> Self {
        Self { min, max: None }
    }

    /// Upper bound an allocation may reach; a minimum above the max wins
    pub fn effective_max(&self) -> Option<Amount> {
        self.max.map(|max| max.max(self.min))
    }

    /// Room left above `current`, `None` when unbounded
    pub fn headroom(&self, current: Amount) -> Option<Amount> {
        self.effective_max().map(|max| max.saturating_sub(current))
    }

    /// Clamp `amount` into `[min, effective max]`
    pub fn clamp(&self, amount: Amount) -> Amount {
        let raised = amount.max(self.min);
        match self.effective_max() {
            Some(max) => raised.min(max),
            None => raised,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pool_id_ordering() {
        let mut ids = vec![PoolId::from("b"), PoolId::from("a"), PoolId::from("c")];
        ids.sort();
        assert_eq!(ids, vec![PoolId::from("a"), PoolId::from("b"), PoolId::from("c")]);
    }

    #[test]
    fn test_descriptor_parses_wire_tags() {
        let json = r#"{"pool_type": "aave_v3", "contract_address": "0xabc"}"#;
        let desc: PoolDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(desc.kind, PoolKind::VariableRateLending);
        assert_eq!(desc.contract_address.as_deref(), Some("0xabc"));
        assert_eq!(desc.borrow_amount, 0);
    }

    #[test]
    fn test_descriptor_defaults_to_synthetic() {
        let json = r#"{"borrow_amount": 100, "supply_rate": "0.05"}"#;
        let desc: PoolDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(desc, PoolDescriptor::synthetic(100, dec!(0.05)));
    }

    #[test]
    fn test_capacity_clamp() {
        let bounds = CapacityBounds { min: 50, max: Some(200) };
        assert_eq!(bounds.clamp(10), 50);
        assert_eq!(bounds.clamp(120), 120);
        assert_eq!(bounds.clamp(500), 200);
        assert_eq!(bounds.headroom(150), Some(50));
    }

    #[test]
    fn test_minimum_wins_over_lower_max() {
        let bounds = CapacityBounds { min: 300, max: Some(200) };
        assert_eq!(bounds.effective_max(), Some(300));
        assert_eq!(bounds.clamp(1000), 300);
        assert_eq!(bounds.headroom(300), Some(0));
    }
}
