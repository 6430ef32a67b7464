//! # Poolalloc Common
//!
//! Shared types and errors for the poolalloc yield allocator.
//!
//! ## Core Types
//!
//! - [`PoolId`]: opaque pool key, unique within a request
//! - [`PoolKind`]: closed set of pool implementations
//! - [`PoolDescriptor`]: request-supplied description of one pool
//! - [`AllocationRequest`]/[`AllocationOutcome`]: one allocation cycle in and out
//! - [`Amount`]: integral base-unit quantity, with exact fraction helpers in [`types::amount`]
//!
//! ## Errors
//!
//! - [`AllocError`]: cycle-level error taxonomy
//! - [`PoolError`]: failures local to a single pool
//! - [`InvariantViolation`]: what the validator found wrong with a map

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{AllocError, InvariantViolation, PoolError, Result};
pub use types::{
    allocation::{
        AllocationMap, AllocationOutcome, AllocationRequest, Anomaly, ReadStage, RequestType,
        ScoredPool,
    },
    amount::Amount,
    pool::{CapacityBounds, PoolDescriptor, PoolId, PoolKind},
};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Poolalloc version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default safety threshold applied to the total budget
pub const DEFAULT_THRESHOLD: Decimal = dec!(0.99);

/// Default perturbation magnitude (2%)
pub const DEFAULT_RANDOMIZATION_FACTOR: Decimal = dec!(0.02);

/// Default per-call bound on remote pool reads in milliseconds
pub const DEFAULT_POOL_TIMEOUT_MS: u64 = 3000;

/// Resolution of the perturbation draw (parts per million)
pub const PERTURBATION_RESOLUTION: i64 = 1_000_000;
