//! Client configuration

use std::time::Duration;

use tb_config::AppConfig;

/// Configuration for the Tablero HTTP client
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the backend, without trailing slash
    pub base_url: String,

    /// Request timeout
    pub timeout: Duration,

    /// Attempts per request in [`Client::execute`](crate::Client::execute)
    pub retry_attempts: u32,

    /// Initial retry delay, doubled per attempt
    pub retry_delay: Duration,

    /// User agent string
    pub user_agent: String,

    /// Login endpoint path
    pub login_path: String,

    /// Module catalog endpoint path
    pub modules_path: String,
}

impl Config {
    /// Create a new configuration with the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
            retry_attempts: 3,
            retry_delay: Duration::from_millis(500),
            user_agent: format!("Tablero-Access/{}", env!("CARGO_PKG_VERSION")),
            login_path: "/api/Auth/login".to_string(),
            modules_path: "/api/Modules".to_string(),
        }
    }

    /// Build from the application configuration.
    ///
    /// Catalog retries map to `retry_attempts = max_retries + 1`.
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(config.api.base_url.clone())
            .with_timeout(config.api.timeout())
            .with_retry(config.catalog.max_retries + 1, config.catalog.retry_delay())
            .with_user_agent(config.api.user_agent.clone())
            .with_paths(config.api.login_path.clone(), config.api.modules_path.clone())
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set retry configuration
    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.retry_attempts = attempts.max(1);
        self.retry_delay = delay;
        self
    }

    /// Set custom user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_paths(mut self, login_path: impl Into<String>, modules_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self.modules_path = modules_path.into();
        self
    }

    /// Absolute URL for `path`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("http://localhost:5000")
    }
}
