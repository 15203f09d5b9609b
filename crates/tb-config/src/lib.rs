//! Tablero Configuration System
//!
//! TOML-based configuration with environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub catalog: CatalogConfig,
    pub access: AccessConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the backend, without trailing slash
    pub base_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// User agent sent with every request
    pub user_agent: String,
    /// Path of the login endpoint
    pub login_path: String,
    /// Path of the module catalog endpoint
    pub modules_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_ms: 30_000,
            user_agent: format!("Tablero-Access/{}", env!("CARGO_PKG_VERSION")),
            login_path: "/api/Auth/login".to_string(),
            modules_path: "/api/Modules".to_string(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Module catalog caching and retry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// How long a fetched catalog counts as fresh (default: 300 = 5 minutes)
    pub stale_secs: u64,
    /// Retries after the first failed fetch; 403 is never retried
    pub max_retries: u32,
    /// Delay between retries in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            stale_secs: 300,
            max_retries: 2,
            retry_delay_ms: 500,
        }
    }
}

impl CatalogConfig {
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Role override settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Apply the admin role override on top of capability checks
    pub admin_override_enabled: bool,
    /// Role name that bypasses capability checks (case-sensitive)
    pub admin_role_name: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            admin_override_enabled: true,
            admin_role_name: "Admin".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// Reject settings the client cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "api.base_url must not be empty".to_string(),
            ));
        }
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "api.base_url must be an http(s) URL: {}",
                self.api.base_url
            )));
        }
        if self.catalog.stale_secs == 0 {
            return Err(ConfigError::ValidationError(
                "catalog.stale_secs must be greater than zero".to_string(),
            ));
        }
        if self.access.admin_override_enabled && self.access.admin_role_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "access.admin_role_name must be set when the override is enabled".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# Tablero Access Configuration
# Environment variables (TABLERO_*) override these settings

[api]
base_url = "http://localhost:5000"
timeout_ms = 30000
login_path = "/api/Auth/login"
modules_path = "/api/Modules"

[catalog]
stale_secs = 300      # catalog stays fresh for 5 minutes
max_retries = 2       # 403 responses are never retried
retry_delay_ms = 500

[access]
admin_override_enabled = true
admin_role_name = "Admin"
"#
        .to_string()
    }
}
