//! The resolver that ties session, catalog and role override together.

use std::sync::Arc;

use parking_lot::Mutex;
use tb_common::{AuthenticatedUser, PermissionAction};
use tracing::debug;

use crate::capability::{CapabilityCheck, CapabilityResult, DenyReason};
use crate::catalog::CatalogCache;
use crate::error::{AccessError, Result};
use crate::role_override::{RoleOverride, WithRoleOverride};
use crate::session::{Session, SessionStore};
use crate::snapshot::AccessSnapshot;

struct Memo {
    session_version: u64,
    catalog_version: u64,
    session: Option<Arc<Session>>,
    snapshot: Arc<AccessSnapshot>,
}

/// Composes the session store and the catalog cache without owning either.
///
/// [`snapshot`](Self::snapshot) is memoized on the version counters of both
/// inputs, so repeated checks between changes reuse one derivation.
pub struct AccessResolver {
    sessions: SessionStore,
    catalog: Arc<CatalogCache>,
    role_override: Option<RoleOverride>,
    memo: Mutex<Option<Memo>>,
}

impl AccessResolver {
    pub fn new(sessions: SessionStore, catalog: Arc<CatalogCache>) -> Self {
        Self {
            sessions,
            catalog,
            role_override: None,
            memo: Mutex::new(None),
        }
    }

    pub fn with_role_override(mut self, role_override: RoleOverride) -> Self {
        self.role_override = Some(role_override);
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn catalog(&self) -> &Arc<CatalogCache> {
        &self.catalog
    }

    pub fn role_override(&self) -> Option<&RoleOverride> {
        self.role_override.as_ref()
    }

    /// Current derived access state, without the role override.
    pub fn snapshot(&self) -> Arc<AccessSnapshot> {
        self.current().1
    }

    /// Access state with the role override applied, as consumers see it.
    pub fn effective(&self) -> WithRoleOverride<Arc<AccessSnapshot>> {
        let (session, snapshot) = self.current();
        let user = session.as_deref().map(|s| &s.user);
        self.decorate(snapshot, user)
    }

    /// Err unless the effective check allows `action` on `module`.
    pub fn require(&self, module: impl AsRef<str>, action: PermissionAction) -> std::result::Result<(), AccessError> {
        let module = module.as_ref();
        let (session, snapshot) = self.current();
        let Some(session) = session else {
            return Err(AccessError::NotAuthenticated);
        };

        let effective = self.decorate(Arc::clone(&snapshot), Some(&session.user));
        if effective.can(module, action) {
            return Ok(());
        }

        let reason = snapshot
            .explain(module, action)
            .reason
            .unwrap_or(DenyReason::ActionNotGranted);
        debug!(module, %action, %reason, "Guarded operation refused");
        Err(AccessError::Denied {
            module: module.to_string(),
            action,
            reason,
        })
    }

    /// Store a new session. The catalog of the previous user is dropped.
    pub fn login(&self, session: Session) -> Arc<Session> {
        let session = self.sessions.login(session);
        self.catalog.clear();
        session
    }

    /// End the session and forget the catalog.
    pub fn logout(&self) -> Option<Arc<Session>> {
        let previous = self.sessions.logout();
        self.catalog.clear();
        previous
    }

    /// Make sure the catalog is loaded (or revalidating) for the current
    /// session and return the resulting state.
    pub async fn load_catalog(&self) -> Arc<AccessSnapshot> {
        self.catalog.ensure_fresh(self.sessions.current()).await;
        self.snapshot()
    }

    /// Refetch the catalog now and return the resulting state.
    pub async fn refresh_catalog(&self) -> Result<Arc<AccessSnapshot>> {
        let session = self.sessions.current();
        let permissions = session.as_deref().and_then(Session::permissions);
        self.catalog.refresh(permissions).await?;
        Ok(self.snapshot())
    }

    fn decorate(
        &self,
        snapshot: Arc<AccessSnapshot>,
        user: Option<&AuthenticatedUser>,
    ) -> WithRoleOverride<Arc<AccessSnapshot>> {
        match &self.role_override {
            Some(rule) => rule.wrap(snapshot, user),
            None => WithRoleOverride::passthrough(snapshot),
        }
    }

    fn current(&self) -> (Option<Arc<Session>>, Arc<AccessSnapshot>) {
        // Versions are read before the data; a concurrent change makes the
        // stored versions stale and forces a recompute next time.
        let session_version = self.sessions.version();
        let catalog_version = self.catalog.version();

        let mut memo = self.memo.lock();
        if let Some(m) = memo.as_ref() {
            if m.session_version == session_version && m.catalog_version == catalog_version {
                return (m.session.clone(), Arc::clone(&m.snapshot));
            }
        }

        let session = self.sessions.current();
        let catalog = self.catalog.snapshot();
        let user = session.as_deref().map(|s| &s.user);
        let snapshot = Arc::new(AccessSnapshot::derive(user, &catalog));

        *memo = Some(Memo {
            session_version,
            catalog_version,
            session: session.clone(),
            snapshot: Arc::clone(&snapshot),
        });
        (session, snapshot)
    }
}

impl CapabilityCheck for AccessResolver {
    /// Effective check, role override included.
    fn check(&self, module: &str, action: PermissionAction) -> CapabilityResult {
        self.effective().check(module, action)
    }
}

impl std::fmt::Debug for AccessResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessResolver")
            .field("sessions", &self.sessions)
            .field("catalog", &self.catalog)
            .field("role_override", &self.role_override)
            .finish_non_exhaustive()
    }
}
