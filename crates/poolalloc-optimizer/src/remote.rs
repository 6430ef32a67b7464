//! Bounded, concurrent remote reads against pool handles
//!
//! A read that overruns its limit becomes [`PoolError::Timeout`]; a read that panics
//! becomes [`PoolError::RemoteRead`]. Either way only that pool is affected.

use futures::future::join_all;
use futures::FutureExt;
use poolalloc_common::{PoolError, PoolId};
use poolalloc_pools::{PoolHandle, RefreshContext};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{debug, error};

/// Run a pool read, converting an overrun of `limit` or a panic into a [`PoolError`]
pub async fn bounded<T, F>(pool: &PoolId, limit: Duration, read: F) -> Result<T, PoolError>
where
    F: Future<Output = Result<T, PoolError>>,
{
    match tokio::time::timeout(limit, AssertUnwindSafe(read).catch_unwind()).await {
        Ok(Ok(result)) => result,
        Ok(Err(payload)) => Err(panicked(pool, payload)),
        Err(_) => Err(PoolError::Timeout {
            pool: pool.clone(),
            elapsed_ms: limit.as_millis() as u64,
        }),
    }
}

/// Run a synchronous pool call, converting a panic into a [`PoolError`]
pub fn guarded<T, F>(pool: &PoolId, call: F) -> Result<T, PoolError>
where
    F: FnOnce() -> Result<T, PoolError>,
{
    std::panic::catch_unwind(AssertUnwindSafe(call))
        .unwrap_or_else(|payload| Err(panicked(pool, payload)))
}

fn panicked(pool: &PoolId, payload: Box<dyn Any + Send>) -> PoolError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    error!(%pool, %message, "Pool call panicked");
    PoolError::RemoteRead {
        pool: pool.clone(),
        reason: format!("panicked: {message}"),
    }
}

/// Refresh every pool concurrently; returns the pools that failed, in pool order
pub async fn refresh_all(
    pools: &mut [Box<dyn PoolHandle>],
    ctx: &RefreshContext,
    limit: Duration,
) -> Vec<PoolError> {
    let results = join_all(pools.iter_mut().map(|pool| async move {
        let id = pool.id().clone();
        bounded(&id, limit, pool.refresh(ctx)).await
    }))
    .await;

    let failures: Vec<PoolError> = results.into_iter().filter_map(Result::err).collect();
    debug!(
        pools = pools.len(),
        failed = failures.len(),
        "Pool refresh complete"
    );
    failures
}
