//! Module catalog access gate.
//!
//! Decides whether the catalog request may be issued at all and shapes the
//! result so that "not allowed" and "nothing there" look the same to callers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tb_common::{Module, Permission};
use tracing::{debug, warn};

use crate::error::Result;

/// True iff at least one permission row grants read, on any module.
///
/// Absent or empty permission lists close the gate.
pub fn has_module_access(permissions: Option<&[Permission]>) -> bool {
    permissions.is_some_and(|perms| perms.iter().any(|p| p.can_read))
}

/// Where the module catalog comes from.
#[async_trait]
pub trait ModuleSource: Send + Sync {
    /// Fetch the full catalog in one attempt.
    async fn list_modules(&self) -> Result<Vec<Module>>;
}

/// Retry settings for non-authorization catalog failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each further one
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }

    fn backoff(&self, retry: u32) -> Duration {
        self.delay
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
    }
}

/// What a gated fetch produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// The user has no read permission anywhere; nothing was requested
    Skipped,
    /// The backend answered 403; treated as an empty catalog
    Denied,
    /// The catalog as returned by the backend
    Loaded(Vec<Module>),
}

impl GateOutcome {
    pub fn issued_request(&self) -> bool {
        !matches!(self, GateOutcome::Skipped)
    }

    pub fn into_modules(self) -> Vec<Module> {
        match self {
            GateOutcome::Loaded(modules) => modules,
            GateOutcome::Skipped | GateOutcome::Denied => Vec::new(),
        }
    }
}

/// Issues the catalog request only for users that may see modules.
#[derive(Clone)]
pub struct CatalogGate {
    source: Arc<dyn ModuleSource>,
    retry: RetryPolicy,
}

impl CatalogGate {
    pub fn new(source: Arc<dyn ModuleSource>, retry: RetryPolicy) -> Self {
        Self { source, retry }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Fetch the catalog on behalf of a user with `permissions`.
    ///
    /// A 403 is returned as [`GateOutcome::Denied`] and never retried. Other
    /// failures are retried up to `max_retries` times, then returned.
    pub async fn fetch(&self, permissions: Option<&[Permission]>) -> Result<GateOutcome> {
        if !has_module_access(permissions) {
            debug!("No read permission on any module, skipping catalog request");
            return Ok(GateOutcome::Skipped);
        }

        let mut retry = 0;
        loop {
            match self.source.list_modules().await {
                Ok(modules) => {
                    debug!(count = modules.len(), "Module catalog loaded");
                    return Ok(GateOutcome::Loaded(modules));
                }
                Err(e) if e.is_authorization_failure() => {
                    debug!("Catalog request forbidden, treating as empty catalog");
                    return Ok(GateOutcome::Denied);
                }
                Err(e) => {
                    if retry >= self.retry.max_retries {
                        warn!(error = %e, attempts = retry + 1, "Module catalog fetch failed");
                        return Err(e);
                    }
                    retry += 1;
                    let delay = self.retry.backoff(retry);
                    debug!(error = %e, retry, ?delay, "Retrying module catalog fetch");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl std::fmt::Debug for CatalogGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogGate")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
