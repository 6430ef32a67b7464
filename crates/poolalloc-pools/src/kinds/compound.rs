//! Compound-style lending market

use super::chain::ChainState;
use crate::handle::{PoolHandle, RefreshContext};
use crate::ledger::LedgerClient;
use async_trait::async_trait;
use poolalloc_common::{Amount, CapacityBounds, PoolDescriptor, PoolError, PoolId, PoolKind};
use rust_decimal::Decimal;
use std::sync::Arc;

pub struct CompoundMarketPool {
    state: ChainState,
}

impl CompoundMarketPool {
    pub fn new(id: PoolId, descriptor: &PoolDescriptor, ledger: Arc<dyn LedgerClient>) -> Self {
        Self {
            state: ChainState::new(id, descriptor, ledger),
        }
    }
}

#[async_trait]
impl PoolHandle for CompoundMarketPool {
    fn id(&self) -> &PoolId {
        self.state.id()
    }

    fn kind(&self) -> PoolKind {
        PoolKind::CompoundMarket
    }

    async fn refresh(&mut self, ctx: &RefreshContext) -> Result<(), PoolError> {
        self.state.refresh(ctx).await
    }

    fn minimum_reserve(&self) -> Result<Amount, PoolError> {
        Ok(self.state.reserve()?.total_borrow)
    }

    async fn yield_rate(&self, candidate: Amount) -> Result<Decimal, PoolError> {
        self.state.quote(None, Some(candidate)).await
    }

    fn capacity_bounds(&self) -> CapacityBounds {
        self.state.bounds(self.minimum_reserve().ok())
    }

    fn last_known_minimum(&self) -> Option<Amount> {
        self.state.last_known_minimum()
    }
}
