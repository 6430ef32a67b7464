//! State shared by every ledger-backed pool kind

use crate::handle::RefreshContext;
use crate::ledger::{LedgerClient, RateQuery, ReserveState};
use poolalloc_common::{Amount, CapacityBounds, PoolDescriptor, PoolError, PoolId};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

/// Ledger connection plus the state read during `refresh`
pub(crate) struct ChainState {
    id: PoolId,
    contract: Option<String>,
    ledger: Arc<dyn LedgerClient>,
    reserve: Option<ReserveState>,
    user_address: Option<String>,
    max_deposit: Option<Amount>,
    last_known_minimum: Option<Amount>,
}

impl ChainState {
    pub(crate) fn new(id: PoolId, descriptor: &PoolDescriptor, ledger: Arc<dyn LedgerClient>) -> Self {
        Self {
            id,
            contract: descriptor.contract_address.clone(),
            ledger,
            reserve: None,
            user_address: None,
            max_deposit: descriptor.max_deposit,
            last_known_minimum: descriptor.last_known_minimum,
        }
    }

    pub(crate) fn id(&self) -> &PoolId {
        &self.id
    }

    pub(crate) fn last_known_minimum(&self) -> Option<Amount> {
        self.last_known_minimum
    }

    pub(crate) fn user_address(&self) -> Option<&str> {
        self.user_address.as_deref()
    }

    fn contract(&self) -> Result<&str, PoolError> {
        self.contract
            .as_deref()
            .ok_or_else(|| PoolError::InvalidDescriptor {
                pool: self.id.clone(),
                reason: "contract_address is required for ledger-backed pools".to_string(),
            })
    }

    /// Read the reserve state; a failed read leaves the pool without state
    pub(crate) async fn refresh(&mut self, ctx: &RefreshContext) -> Result<(), PoolError> {
        self.reserve = None;
        self.user_address = ctx.user_address.clone();

        let contract = self.contract()?;
        let reserve = self
            .ledger
            .read_reserve(contract)
            .await
            .map_err(|e| PoolError::RemoteRead {
                pool: self.id.clone(),
                reason: e.to_string(),
            })?;

        debug!(pool = %self.id, contract, ?reserve, "Pool refreshed");
        self.reserve = Some(reserve);
        Ok(())
    }

    pub(crate) fn reserve(&self) -> Result<&ReserveState, PoolError> {
        self.reserve.as_ref().ok_or_else(|| PoolError::StateUnavailable {
            pool: self.id.clone(),
        })
    }

    pub(crate) async fn quote(
        &self,
        user: Option<&str>,
        amount: Option<Amount>,
    ) -> Result<Decimal, PoolError> {
        let query = RateQuery {
            contract: self.contract()?.to_string(),
            user: user.map(str::to_string),
            amount,
        };
        let rate = self
            .ledger
            .quote_supply_rate(&query)
            .await
            .map_err(|e| PoolError::RemoteRead {
                pool: self.id.clone(),
                reason: e.to_string(),
            })?;
        Ok(rate.max(Decimal::ZERO))
    }

    /// Bounds from a computed minimum; the tighter of the descriptor and ledger caps applies
    pub(crate) fn bounds(&self, minimum: Option<Amount>) -> CapacityBounds {
        let min = minimum
            .or(self.last_known_minimum)
            .unwrap_or(0);
        let ledger_cap = self.reserve.as_ref().and_then(|r| r.supply_cap);
        let max = match (self.max_deposit, ledger_cap) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        CapacityBounds { min, max }
    }
}
