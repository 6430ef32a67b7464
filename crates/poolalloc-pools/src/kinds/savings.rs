//! Fixed-savings instrument
//!
//! Nothing is borrowed against a savings rate, so the pool reports no committed debt once
//! the contract has been read. The budget calculator reserves an equal share of the
//! investable budget for it instead. The rate does not depend on the deposit.

use super::chain::ChainState;
use crate::handle::{PoolHandle, RefreshContext};
use crate::ledger::LedgerClient;
use async_trait::async_trait;
use poolalloc_common::{Amount, CapacityBounds, PoolDescriptor, PoolError, PoolId, PoolKind};
use rust_decimal::Decimal;
use std::sync::Arc;

pub struct SavingsRatePool {
    state: ChainState,
}

impl SavingsRatePool {
    pub fn new(id: PoolId, descriptor: &PoolDescriptor, ledger: Arc<dyn LedgerClient>) -> Self {
        Self {
            state: ChainState::new(id, descriptor, ledger),
        }
    }
}

#[async_trait]
impl PoolHandle for SavingsRatePool {
    fn id(&self) -> &PoolId {
        self.state.id()
    }

    fn kind(&self) -> PoolKind {
        PoolKind::FixedSavings
    }

    async fn refresh(&mut self, ctx: &RefreshContext) -> Result<(), PoolError> {
        self.state.refresh(ctx).await
    }

    fn minimum_reserve(&self) -> Result<Amount, PoolError> {
        self.state.reserve().map(|_| 0)
    }

    async fn yield_rate(&self, _candidate: Amount) -> Result<Decimal, PoolError> {
        self.state.quote(None, None).await
    }

    fn capacity_bounds(&self) -> CapacityBounds {
        self.state.bounds(self.minimum_reserve().ok())
    }

    fn last_known_minimum(&self) -> Option<Amount> {
        self.state.last_known_minimum()
    }
}
