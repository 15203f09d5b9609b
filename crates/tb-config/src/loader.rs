//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "tablero.toml",
    "config.toml",
    "./config/tablero.toml",
    "/etc/tablero/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found), apply env overrides, validate
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file() {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        apply_overrides(&mut config, |key| env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!(?path, "Configured file not found, searching default locations");
        }

        if let Ok(path) = env::var("TABLERO_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `TABLERO_*` overrides read through `lookup`.
///
/// Unparseable numeric or boolean values are ignored with a warning.
pub(crate) fn apply_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    // API
    if let Some(val) = lookup("TABLERO_API_BASE_URL") {
        config.api.base_url = val.trim_end_matches('/').to_string();
    }
    if let Some(val) = lookup("TABLERO_API_TIMEOUT_MS") {
        parse_into(&val, "TABLERO_API_TIMEOUT_MS", &mut config.api.timeout_ms);
    }

    // Catalog
    if let Some(val) = lookup("TABLERO_CATALOG_STALE_SECS") {
        parse_into(&val, "TABLERO_CATALOG_STALE_SECS", &mut config.catalog.stale_secs);
    }
    if let Some(val) = lookup("TABLERO_CATALOG_MAX_RETRIES") {
        parse_into(&val, "TABLERO_CATALOG_MAX_RETRIES", &mut config.catalog.max_retries);
    }
    if let Some(val) = lookup("TABLERO_CATALOG_RETRY_DELAY_MS") {
        parse_into(&val, "TABLERO_CATALOG_RETRY_DELAY_MS", &mut config.catalog.retry_delay_ms);
    }

    // Access
    if let Some(val) = lookup("TABLERO_ADMIN_ROLE_NAME") {
        config.access.admin_role_name = val;
    }
    if let Some(val) = lookup("TABLERO_ADMIN_OVERRIDE_ENABLED") {
        parse_into(
            &val,
            "TABLERO_ADMIN_OVERRIDE_ENABLED",
            &mut config.access.admin_override_enabled,
        );
    }
}

fn parse_into<T: std::str::FromStr>(value: &str, key: &str, target: &mut T) {
    match value.trim().parse() {
        Ok(parsed) => *target = parsed,
        Err(_) => warn!(key, value, "Ignoring unparseable environment override"),
    }
}
