//! Low-level Tablero API client

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tb_access::{Session, SessionStore};
use tb_common::LoginResponse;
use tracing::{debug, info};

use crate::auth::{AuthenticatedClient, LoginRequest, SessionLostHook};
use crate::config::Config;
use crate::error::{Error, Result};

/// Tablero API client
///
/// Attaches the session's bearer token to every request and maps HTTP
/// failures onto [`Error`]. A 401 ends the session.
#[derive(Debug, Clone)]
pub struct Client {
    config: Arc<Config>,
    auth_client: AuthenticatedClient,
    http_client: reqwest::Client,
}

impl Client {
    /// Create a new client sharing `sessions` for authentication
    pub fn new(config: Config, sessions: SessionStore) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            auth_client: AuthenticatedClient::new(http_client.clone(), sessions),
            http_client,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sessions(&self) -> &SessionStore {
        self.auth_client.sessions()
    }

    /// Run `hook` whenever a 401 ends the session.
    pub fn on_session_lost(&self, hook: SessionLostHook) {
        self.auth_client.set_session_lost_hook(hook);
    }

    /// Get the underlying HTTP client
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    /// Get a request builder for `path`, authenticated when a session exists
    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.auth_client.request(method, &self.config.url(path))
    }

    /// Execute a request with automatic retries and error handling
    pub async fn execute<T>(&self, request: reqwest::Request) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let mut last_error = None;

        for attempt in 0..self.config.retry_attempts {
            if attempt > 0 {
                let delay = backoff(self.config.retry_delay, attempt);
                debug!(attempt, ?delay, "Retrying request");
                tokio::time::sleep(delay).await;
            }

            let request = request
                .try_clone()
                .ok_or_else(|| Error::Other("Request cannot be cloned".into()))?;

            match self.send_once(request).await {
                Ok(body) => return Ok(body),
                Err(error) if !error.is_retryable() => return Err(error),
                Err(error) => last_error = Some(error),
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Other("Request failed".into())))
    }

    /// Execute a request exactly once
    pub async fn send_once<T>(&self, request: reqwest::Request) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let method = request.method().clone();
        let path = request.url().path().to_string();
        let response = self.http_client.execute(request).await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            self.auth_client.session_lost();
        }

        read_response(response).await.inspect_err(|e| {
            debug!(%method, %path, error = %e, "Request failed");
        })
    }

    /// Authenticate and return the normalized session.
    ///
    /// The session is not stored; callers hand it to the session store (or
    /// to [`AccessClient::login`](crate::AccessClient::login), which does).
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .http_client
            .post(self.config.url(&self.config.login_path))
            .json(&LoginRequest { email, password })
            .send()
            .await?;
        let response: LoginResponse = read_response(response).await?;
        let session = Session::from_login(response);
        info!(
            user_id = %session.user.profile.id,
            role = session.role_name().unwrap_or("<none>"),
            "Login succeeded"
        );
        Ok(session)
    }
}

/// Delay before retry `attempt` (1-based): `base * 2^(attempt - 1)`,
/// saturating instead of overflowing.
fn backoff(base: std::time::Duration, attempt: u32) -> std::time::Duration {
    base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
}

async fn read_response<T>(response: reqwest::Response) -> Result<T>
where
    T: DeserializeOwned,
{
    let status = response.status();
    if status.is_success() {
        let body: T = response.json().await?;
        return Ok(body);
    }

    let body = response.text().await.unwrap_or_default();
    Err(Error::from_status(status, body))
}
