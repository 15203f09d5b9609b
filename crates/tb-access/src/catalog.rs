//! Cached module catalog with stale-while-revalidate refresh.
//!
//! The cache is the only place fetched modules are written, and it writes
//! only through the [`CatalogGate`]. Readers take a [`CatalogSnapshot`]
//! synchronously and never trigger a request themselves.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tb_common::{Module, Permission};
use tokio::time::Instant;
use tracing::debug;

use crate::error::{FetchError, Result};
use crate::gate::{has_module_access, CatalogGate, GateOutcome};
use crate::session::Session;

/// Point-in-time view of the catalog cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    /// `None` until a fetch has completed
    pub modules: Option<Arc<[Module]>>,
    /// A fetch is currently running
    pub is_fetching: bool,
    /// Error of the last failed fetch, cleared by the next success
    pub error: Option<FetchError>,
    /// Wall-clock time of the last successful fetch
    pub fetched_at: Option<DateTime<Utc>>,
}

impl CatalogSnapshot {
    /// A completed catalog, mainly for deriving access state directly.
    pub fn loaded(modules: Vec<Module>) -> Self {
        Self {
            modules: Some(modules.into()),
            is_fetching: false,
            error: None,
            fetched_at: Some(Utc::now()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.modules.is_some()
    }
}

#[derive(Default)]
struct CacheState {
    modules: Option<Arc<[Module]>>,
    fetched_at: Option<Instant>,
    fetched_at_utc: Option<DateTime<Utc>>,
    error: Option<FetchError>,
    in_flight: bool,
}

/// Shared module catalog.
pub struct CatalogCache {
    gate: CatalogGate,
    stale_after: Duration,
    state: RwLock<CacheState>,
    version: AtomicU64,
    epoch: AtomicU64,
    fetch_lock: tokio::sync::Mutex<()>,
    revalidating: AtomicBool,
}

impl CatalogCache {
    pub fn new(gate: CatalogGate, stale_after: Duration) -> Self {
        Self {
            gate,
            stale_after,
            state: RwLock::new(CacheState::default()),
            version: AtomicU64::new(0),
            epoch: AtomicU64::new(0),
            fetch_lock: tokio::sync::Mutex::new(()),
            revalidating: AtomicBool::new(false),
        }
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    /// Increases on every state change.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        let state = self.state.read();
        CatalogSnapshot {
            modules: state.modules.clone(),
            is_fetching: state.in_flight,
            error: state.error.clone(),
            fetched_at: state.fetched_at_utc,
        }
    }

    /// Data present and younger than the staleness window.
    pub fn is_fresh(&self) -> bool {
        let state = self.state.read();
        state.modules.is_some()
            && state
                .fetched_at
                .is_some_and(|at| at.elapsed() < self.stale_after)
    }

    /// Fetch now, regardless of freshness.
    ///
    /// Users without any read permission never reach the network; the cache
    /// is left untouched and the current snapshot is returned.
    pub async fn refresh(&self, permissions: Option<&[Permission]>) -> Result<CatalogSnapshot> {
        self.load(permissions, true).await
    }

    /// Return a usable snapshot for `session`.
    ///
    /// - gate closed: returns immediately, no request
    /// - nothing cached yet: awaits the first fetch
    /// - cached but stale: returns the stale data and refetches in the
    ///   background (one background refetch at a time)
    /// - fresh: returns the cached data
    ///
    /// Fetch errors are recorded in the returned snapshot rather than
    /// returned.
    pub async fn ensure_fresh(self: &Arc<Self>, session: Option<Arc<Session>>) -> CatalogSnapshot {
        let permissions = session.as_deref().and_then(Session::permissions);
        if !has_module_access(permissions) {
            return self.snapshot();
        }

        let loaded = self.state.read().modules.is_some();
        if !loaded {
            if let Err(e) = self.load(permissions, false).await {
                debug!(error = %e, "Initial catalog load failed");
            }
            return self.snapshot();
        }

        if !self.is_fresh()
            && self
                .revalidating
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            let cache = Arc::clone(self);
            tokio::spawn(async move {
                let permissions = session.as_deref().and_then(Session::permissions);
                if let Err(e) = cache.load(permissions, false).await {
                    debug!(error = %e, "Background catalog refresh failed");
                }
                cache.revalidating.store(false, Ordering::Release);
            });
        }

        self.snapshot()
    }

    /// Mark the cached catalog stale so the next read refetches it.
    pub fn invalidate(&self) {
        let mut state = self.state.write();
        if state.fetched_at.take().is_some() {
            debug!("Module catalog invalidated");
            self.bump();
        }
    }

    /// Forget everything, e.g. on logout. A fetch still running is
    /// discarded when it completes.
    pub fn clear(&self) {
        let mut state = self.state.write();
        let in_flight = state.in_flight;
        *state = CacheState {
            in_flight,
            ..CacheState::default()
        };
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.bump();
    }

    async fn load(&self, permissions: Option<&[Permission]>, force: bool) -> Result<CatalogSnapshot> {
        if !has_module_access(permissions) {
            return Ok(self.snapshot());
        }

        let _guard = self.fetch_lock.lock().await;

        // Another caller may have finished a fetch while we waited
        if !force && self.is_fresh() {
            return Ok(self.snapshot());
        }

        let epoch = self.epoch.load(Ordering::Acquire);
        let in_flight = InFlight::start(self);
        let result = self.gate.fetch(permissions).await;
        drop(in_flight);

        if self.epoch.load(Ordering::Acquire) != epoch {
            debug!("Catalog cleared during fetch, discarding result");
            return Ok(self.snapshot());
        }

        let mut state = self.state.write();
        let outcome = match result {
            Ok(GateOutcome::Skipped) => Ok(()),
            Ok(outcome) => {
                let modules = outcome.into_modules();
                state.modules = Some(modules.into());
                state.fetched_at = Some(Instant::now());
                state.fetched_at_utc = Some(Utc::now());
                state.error = None;
                Ok(())
            }
            Err(e) => {
                debug!(error = %e, "Keeping previous module catalog");
                state.error = Some(e.clone());
                Err(e)
            }
        };
        drop(state);
        self.bump();

        outcome.map(|()| self.snapshot())
    }

    fn set_in_flight(&self, in_flight: bool) {
        self.state.write().in_flight = in_flight;
        self.bump();
    }

    fn bump(&self) {
        self.version.fetch_add(1, Ordering::AcqRel);
    }
}

/// Marks the cache as fetching; cleared on completion or when the fetch
/// future is dropped.
struct InFlight<'a> {
    cache: &'a CatalogCache,
}

impl<'a> InFlight<'a> {
    fn start(cache: &'a CatalogCache) -> Self {
        cache.set_in_flight(true);
        Self { cache }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.cache.set_in_flight(false);
    }
}

impl std::fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogCache")
            .field("gate", &self.gate)
            .field("stale_after", &self.stale_after)
            .field("version", &self.version())
            .finish_non_exhaustive()
    }
}
