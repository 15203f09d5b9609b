//! Authenticated session and the store that owns it.
//!
//! The store is the single writer of the current user: [`SessionStore::login`]
//! and [`SessionStore::logout`] are the only mutations. Everything else reads
//! `Arc<Session>` snapshots.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tb_common::{AuthenticatedUser, LoginResponse, Permission};
use tracing::info;

/// A logged-in user with the bearer token issued at login.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: AuthenticatedUser,
}

impl Session {
    pub fn new(token: impl Into<String>, user: AuthenticatedUser) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    /// Build the canonical session from a raw login response.
    ///
    /// This is the only place the camelCase/PascalCase role payloads are
    /// reconciled.
    pub fn from_login(response: LoginResponse) -> Self {
        Self {
            token: response.token,
            user: response.user.normalize(),
        }
    }

    pub fn permissions(&self) -> Option<&[Permission]> {
        self.user.permissions()
    }

    pub fn role_name(&self) -> Option<&str> {
        self.user.role_name()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Default)]
struct SessionInner {
    current: RwLock<Option<Arc<Session>>>,
    version: AtomicU64,
}

/// Process-wide holder of the current session.
///
/// Cloning is cheap and every clone sees the same session. The version
/// counter increases on every login and logout so derived state can be
/// memoized against it.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new session, replacing any previous one.
    pub fn login(&self, session: Session) -> Arc<Session> {
        let session = Arc::new(session);
        info!(
            user_id = %session.user.profile.id,
            role = session.role_name().unwrap_or("<none>"),
            permissions = session.permissions().map_or(0, |p| p.len()),
            "Session started"
        );

        *self.inner.current.write() = Some(Arc::clone(&session));
        self.inner.version.fetch_add(1, Ordering::AcqRel);
        session
    }

    /// Drop the current session, returning it if there was one.
    pub fn logout(&self) -> Option<Arc<Session>> {
        let previous = self.inner.current.write().take();
        if let Some(ref session) = previous {
            info!(user_id = %session.user.profile.id, "Session ended");
            self.inner.version.fetch_add(1, Ordering::AcqRel);
        }
        previous
    }

    pub fn current(&self) -> Option<Arc<Session>> {
        self.inner.current.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.inner
            .current
            .read()
            .as_ref()
            .map(|s| s.token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.current.read().is_some()
    }

    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .field("version", &self.version())
            .finish()
    }
}
