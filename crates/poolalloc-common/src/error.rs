//! Error types for the allocator
//!
//! Configuration errors surface as [`AllocError`]. Pool-local failures and validation
//! failures never abort a cycle; they are carried on the outcome as anomalies.

use crate::types::{amount::Amount, pool::PoolId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AllocError
pub type Result<T> = std::result::Result<T, AllocError>;

/// Errors that stop an allocator from being built
#[derive(Debug, Error)]
pub enum AllocError {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors raised by a single pool's remote reads or state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("Remote read failed for pool {pool}: {reason}")]
    RemoteRead { pool: PoolId, reason: String },

    #[error("State unavailable for pool {pool}: refresh has not succeeded")]
    StateUnavailable { pool: PoolId },

    #[error("Remote read for pool {pool} timed out after {elapsed_ms}ms")]
    Timeout { pool: PoolId, elapsed_ms: u64 },

    #[error("Invalid descriptor for pool {pool}: {reason}")]
    InvalidDescriptor { pool: PoolId, reason: String },
}

impl PoolError {
    /// Pool the error belongs to
    pub fn pool(&self) -> &PoolId {
        match self {
            PoolError::RemoteRead { pool, .. }
            | PoolError::StateUnavailable { pool }
            | PoolError::Timeout { pool, .. }
            | PoolError::InvalidDescriptor { pool, .. } => pool,
        }
    }
}

/// A broken invariant found in a final allocation map
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantViolation {
    #[error("Pool {0} is missing from the allocation")]
    MissingPool(PoolId),

    #[error("Pool {0} is not part of the request")]
    UnknownPool(PoolId),

    #[error("Pool {pool} allocated {allocated} below its minimum {minimum}")]
    BelowMinimum {
        pool: PoolId,
        allocated: Amount,
        minimum: Amount,
    },

    #[error("Pool {pool} allocated {allocated} above its capacity {capacity}")]
    AboveCapacity {
        pool: PoolId,
        allocated: Amount,
        capacity: Amount,
    },

    #[error("Total allocation {total} exceeds bound {bound}")]
    OverBudget { total: Amount, bound: Amount },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PoolError::RemoteRead {
            pool: PoolId::from("7"),
            reason: "connection reset".to_string(),
        };
        assert!(err.to_string().contains("pool 7"));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_config_error_display() {
        let err = AllocError::Config("threshold must be in (0, 1]".to_string());
        assert_eq!(err.to_string(), "Configuration error: threshold must be in (0, 1]");
    }

    #[test]
    fn test_violation_display() {
        let err = InvariantViolation::OverBudget {
            total: 1200,
            bound: 990,
        };
        assert!(err.to_string().contains("1200"));
        assert!(err.to_string().contains("990"));
    }

    #[test]
    fn test_pool_error_owner() {
        let err = PoolError::Timeout {
            pool: PoolId::from("a"),
            elapsed_ms: 3000,
        };
        assert_eq!(err.pool().as_str(), "a");
    }
}
