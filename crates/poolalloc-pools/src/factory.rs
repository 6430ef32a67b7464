//! Builds pool handles from request descriptors, keyed on the kind tag

use crate::handle::PoolHandle;
use crate::kinds::{
    CompoundMarketPool, LendingMarketPool, SavingsRatePool, SiloStrategyPool, SyntheticPool,
};
use crate::ledger::LedgerClient;
use poolalloc_common::{AllocationRequest, PoolDescriptor, PoolId, PoolKind, RequestType};
use std::sync::Arc;
use tracing::debug;

/// Pool factory bound to one ledger client
#[derive(Clone)]
pub struct PoolFactory {
    ledger: Arc<dyn LedgerClient>,
}

impl PoolFactory {
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self { ledger }
    }

    /// Build one pool.
    ///
    /// Synthetic requests build every pool as synthetic regardless of its tag.
    pub fn build(
        &self,
        id: PoolId,
        descriptor: &PoolDescriptor,
        request_type: RequestType,
    ) -> Box<dyn PoolHandle> {
        let kind = match request_type {
            RequestType::Synthetic => PoolKind::Synthetic,
            RequestType::Organic => descriptor.kind,
        };
        debug!(pool = %id, %kind, "Building pool");

        let ledger = self.ledger.clone();
        match kind {
            PoolKind::Synthetic => Box::new(SyntheticPool::from_descriptor(id, descriptor)),
            PoolKind::VariableRateLending => {
                Box::new(LendingMarketPool::new(id, descriptor, ledger))
            }
            PoolKind::SiloStrategy => Box::new(SiloStrategyPool::new(id, descriptor, ledger)),
            PoolKind::FixedSavings => Box::new(SavingsRatePool::new(id, descriptor, ledger)),
            PoolKind::CompoundMarket => Box::new(CompoundMarketPool::new(id, descriptor, ledger)),
        }
    }

    /// Build every pool of a request, in pool-id order
    pub fn build_all(&self, request: &AllocationRequest) -> Vec<Box<dyn PoolHandle>> {
        request
            .pools
            .iter()
            .map(|(id, descriptor)| self.build(id.clone(), descriptor, request.request_type))
            .collect()
    }
}
