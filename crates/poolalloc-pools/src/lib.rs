//! # Poolalloc Pools
//!
//! Pool handles for the allocator.
//!
//! Every pool kind implements [`PoolHandle`]: `refresh` reads ledger state once per
//! cycle, after which `minimum_reserve`, `yield_rate` and `capacity_bounds` answer
//! from that state. [`PoolFactory`] picks the implementation from the descriptor's kind
//! tag. Ledger access goes through [`LedgerClient`].
//!
//! | Kind                  | Minimum reserve                 | Rate depends on   |
//! |-----------------------|---------------------------------|-------------------|
//! | synthetic             | descriptor `borrow_amount`      | nothing           |
//! | variable-rate lending | stable + variable debt          | user, amount      |
//! | silo strategy         | total borrow                    | amount            |
//! | compound market       | total borrow                    | amount            |
//! | fixed savings         | investable / pool count (*)     | nothing           |
//!
//! (*) Savings pools carry no debt; the budget calculator assigns their equal share.

pub mod factory;
pub mod handle;
pub mod kinds;
pub mod ledger;

pub use factory::PoolFactory;
pub use handle::{PoolHandle, RefreshContext};
pub use kinds::{
    CompoundMarketPool, LendingMarketPool, SavingsRatePool, SiloStrategyPool, SyntheticPool,
};
pub use ledger::{InMemoryLedger, LedgerClient, LedgerEntry, LedgerError, RateQuery, ReserveState};
