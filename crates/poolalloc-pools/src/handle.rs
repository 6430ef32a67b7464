//! The pool capability every pool kind implements

use async_trait::async_trait;
use poolalloc_common::{Amount, CapacityBounds, PoolError, PoolId, PoolKind};
use rust_decimal::Decimal;

/// Per-cycle context handed to [`PoolHandle::refresh`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshContext {
    /// Depositor address from the request
    pub user_address: Option<String>,
}

impl RefreshContext {
    pub fn new(user_address: Option<String>) -> Self {
        Self { user_address }
    }
}

/// A yield-bearing pool, built fresh for one allocation cycle.
///
/// `refresh` must succeed before `minimum_reserve` can answer. `yield_rate` and
/// `refresh` are remote reads and may fail or stall; callers bound them with a timeout.
#[async_trait]
pub trait PoolHandle: Send + Sync {
    /// Key of this pool within the request
    fn id(&self) -> &PoolId;

    /// Implementation kind
    fn kind(&self) -> PoolKind;

    /// Populate ledger-derived state
    async fn refresh(&mut self, ctx: &RefreshContext) -> Result<(), PoolError>;

    /// Capital already committed to the pool that cannot be withdrawn this cycle
    fn minimum_reserve(&self) -> Result<Amount, PoolError>;

    /// Projected annualized yield for a candidate deposit
    async fn yield_rate(&self, candidate: Amount) -> Result<Decimal, PoolError>;

    /// Deposit range this pool accepts
    fn capacity_bounds(&self) -> CapacityBounds;

    /// Minimum to assume when the ledger cannot be read this cycle
    fn last_known_minimum(&self) -> Option<Amount> {
        None
    }
}
