//! Variable-rate lending market
//!
//! Minimum reserve is the market's outstanding debt: next total stable debt plus total
//! variable debt. The supply rate depends on both the depositor and the deposit size.

use super::chain::ChainState;
use crate::handle::{PoolHandle, RefreshContext};
use crate::ledger::LedgerClient;
use async_trait::async_trait;
use poolalloc_common::{Amount, CapacityBounds, PoolDescriptor, PoolError, PoolId, PoolKind};
use rust_decimal::Decimal;
use std::sync::Arc;

pub struct LendingMarketPool {
    state: ChainState,
}

impl LendingMarketPool {
    pub fn new(id: PoolId, descriptor: &PoolDescriptor, ledger: Arc<dyn LedgerClient>) -> Self {
        Self {
            state: ChainState::new(id, descriptor, ledger),
        }
    }
}

#[async_trait]
impl PoolHandle for LendingMarketPool {
    fn id(&self) -> &PoolId {
        self.state.id()
    }

    fn kind(&self) -> PoolKind {
        PoolKind::VariableRateLending
    }

    async fn refresh(&mut self, ctx: &RefreshContext) -> Result<(), PoolError> {
        self.state.refresh(ctx).await
    }

    fn minimum_reserve(&self) -> Result<Amount, PoolError> {
        let reserve = self.state.reserve()?;
        Ok(reserve
            .next_total_stable_debt
            .saturating_add(reserve.total_variable_debt))
    }

    async fn yield_rate(&self, candidate: Amount) -> Result<Decimal, PoolError> {
        self.state
            .quote(self.state.user_address(), Some(candidate))
            .await
    }

    fn capacity_bounds(&self) -> CapacityBounds {
        self.state.bounds(self.minimum_reserve().ok())
    }

    fn last_known_minimum(&self) -> Option<Amount> {
        self.state.last_known_minimum()
    }
}
