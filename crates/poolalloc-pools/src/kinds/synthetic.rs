//! Synthetic pool: state comes entirely from the request

use crate::handle::{PoolHandle, RefreshContext};
use async_trait::async_trait;
use poolalloc_common::{Amount, CapacityBounds, PoolDescriptor, PoolError, PoolId, PoolKind};
use rust_decimal::Decimal;

/// Pool with a fixed borrow amount and a precomputed supply rate
#[derive(Debug, Clone)]
pub struct SyntheticPool {
    id: PoolId,
    borrow_amount: Amount,
    supply_rate: Decimal,
    max_deposit: Option<Amount>,
}

impl SyntheticPool {
    pub fn new(id: PoolId, borrow_amount: Amount, supply_rate: Decimal) -> Self {
        Self {
            id,
            borrow_amount,
            supply_rate,
            max_deposit: None,
        }
    }

    pub fn from_descriptor(id: PoolId, descriptor: &PoolDescriptor) -> Self {
        Self {
            id,
            borrow_amount: descriptor.borrow_amount,
            supply_rate: descriptor.supply_rate,
            max_deposit: descriptor.max_deposit,
        }
    }

    pub fn with_max_deposit(mut self, max_deposit: Amount) -> Self {
        self.max_deposit = Some(max_deposit);
        self
    }
}

#[async_trait]
impl PoolHandle for SyntheticPool {
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
        Ok(self.borrow_amount)
    }

    async fn yield_rate(&self, _candidate: Amount) -> Result<Decimal, PoolError> {
        Ok(self.supply_rate.max(Decimal::ZERO))
    }

    fn capacity_bounds(&self) -> CapacityBounds {
        CapacityBounds {
            min: self.borrow_amount,
            max: self.max_deposit,
        }
    }

    fn last_known_minimum(&self) -> Option<Amount> {
        Some(self.borrow_amount)
    }
}
