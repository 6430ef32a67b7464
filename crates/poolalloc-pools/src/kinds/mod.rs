//! One [`PoolHandle`](crate::PoolHandle) implementation per pool kind

mod chain;
pub mod compound;
pub mod lending;
pub mod savings;
pub mod silo;
pub mod synthetic;

pub use compound::CompoundMarketPool;
pub use lending::LendingMarketPool;
pub use savings::SavingsRatePool;
pub use silo::SiloStrategyPool;
pub use synthetic::SyntheticPool;
