//! Bearer authentication backed by the session store.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tb_access::SessionStore;
use tracing::warn;

/// Called after a rejected token ended the session.
pub type SessionLostHook = Arc<dyn Fn() + Send + Sync>;

/// Body of the login request
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Authenticated HTTP client wrapper
///
/// Reads the bearer token from the shared [`SessionStore`] on every request.
/// Clones share the session-lost hook.
#[derive(Clone)]
pub struct AuthenticatedClient {
    http_client: reqwest::Client,
    sessions: SessionStore,
    on_session_lost: Arc<RwLock<Option<SessionLostHook>>>,
}

impl AuthenticatedClient {
    pub fn new(http_client: reqwest::Client, sessions: SessionStore) -> Self {
        Self {
            http_client,
            sessions,
            on_session_lost: Arc::new(RwLock::new(None)),
        }
    }

    /// Replace the hook run when the backend rejects the token.
    pub fn set_session_lost_hook(&self, hook: SessionLostHook) {
        *self.on_session_lost.write() = Some(hook);
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Get a request builder, with the bearer header when a session exists
    pub fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self.http_client.request(method, url);
        match self.sessions.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// The backend rejected our token; drop the session.
    pub fn session_lost(&self) {
        if self.sessions.logout().is_none() {
            return;
        }
        warn!("Token rejected by backend, session ended");
        let hook = self.on_session_lost.read().clone();
        if let Some(hook) = hook {
            hook();
        }
    }
}

impl fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("sessions", &self.sessions)
            .field("has_session_lost_hook", &self.on_session_lost.read().is_some())
            .finish_non_exhaustive()
    }
}
