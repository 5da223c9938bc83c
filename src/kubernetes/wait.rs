// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Waiting for resources converged by external controllers

use crate::constants::poll::{DEFAULT_INTERVAL_MS, DEFAULT_TIMEOUT_SECS};
use crate::error::{ProxyAddonError, Result};
use crate::types::Readiness;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Bounds for a single wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Fetch a resource until `predicate` reports it ready and return that snapshot.
///
/// Transient fetch errors are retried within the timeout. A resource that
/// vanishes mid-wait fails with [`ProxyAddonError::ResourceGone`], and
/// cancelling `cancel` ends the wait immediately with
/// [`ProxyAddonError::Cancelled`].
pub async fn poll_until_ready<T, F, Fut, P>(
    what: &str,
    mut fetch: F,
    predicate: P,
    options: PollOptions,
    cancel: &CancellationToken,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&T) -> Readiness,
{
    let start = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(ProxyAddonError::Cancelled(what.to_string()));
        }

        attempts += 1;
        let fetched = tokio::select! {
            _ = cancel.cancelled() => return Err(ProxyAddonError::Cancelled(what.to_string())),
            fetched = fetch() => fetched,
        };
        match fetched {
            Ok(snapshot) => match predicate(&snapshot) {
                Readiness::Ready => {
                    debug!("{} is ready after {} attempt(s)", what, attempts);
                    return Ok(snapshot);
                }
                Readiness::NotReady => trace!("{} not ready yet", what),
                Readiness::Failed(reason) => {
                    return Err(ProxyAddonError::ReadinessFailed {
                        what: what.to_string(),
                        reason,
                    })
                }
            },
            Err(ProxyAddonError::NotFound(key)) => return Err(ProxyAddonError::ResourceGone(key)),
            Err(e) if e.is_transient() => warn!("Transient error fetching {}: {}, retrying", what, e),
            Err(e) => return Err(e),
        }

        let remaining = options.timeout.saturating_sub(start.elapsed());
        if remaining.is_zero() {
            return Err(ProxyAddonError::Timeout {
                what: what.to_string(),
                timeout: options.timeout,
            });
        }

        tokio::select! {
            _ = cancel.cancelled() => return Err(ProxyAddonError::Cancelled(what.to_string())),
            _ = sleep(options.interval.min(remaining)) => {}
        }
    }
}
