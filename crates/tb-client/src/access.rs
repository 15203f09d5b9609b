//! Client, catalog cache and resolver wired together.

use std::sync::Arc;
use std::time::Duration;

use tb_access::{
    AccessResolver, AccessSnapshot, CatalogCache, CatalogGate, RetryPolicy, RoleOverride, Session,
    SessionStore,
};
use tb_common::{Module, ModuleName, PermissionAction, UpdateModulePayload};
use tb_config::AppConfig;
use tracing::info;

use crate::client::Client;
use crate::config::Config;
use crate::error::Result;
use crate::modules::ModulesApi;

/// Everything an application needs for permission-aware backend access.
#[derive(Debug, Clone)]
pub struct AccessClient {
    client: Client,
    modules: ModulesApi,
    resolver: Arc<AccessResolver>,
}

impl AccessClient {
    /// Build from application configuration with a fresh session store.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = Client::new(Config::from_app_config(config), SessionStore::new())?;
        let retry = RetryPolicy::new(config.catalog.max_retries, config.catalog.retry_delay());
        let role_override = config
            .access
            .admin_override_enabled
            .then(|| RoleOverride::role_named(config.access.admin_role_name.clone()));

        Ok(Self::new(client, retry, config.catalog.stale_after(), role_override))
    }

    pub fn new(
        client: Client,
        retry: RetryPolicy,
        stale_after: Duration,
        role_override: Option<RoleOverride>,
    ) -> Self {
        let modules = ModulesApi::new(client.clone());
        let gate = CatalogGate::new(Arc::new(modules.clone()), retry);
        let catalog = Arc::new(CatalogCache::new(gate, stale_after));

        // The catalog owns the client through its gate; hold it weakly here.
        let weak_catalog = Arc::downgrade(&catalog);
        client.on_session_lost(Arc::new(move || {
            if let Some(catalog) = weak_catalog.upgrade() {
                catalog.clear();
            }
        }));

        let mut resolver = AccessResolver::new(client.sessions().clone(), catalog);
        if let Some(rule) = role_override {
            resolver = resolver.with_role_override(rule);
        }

        Self {
            client,
            modules,
            resolver: Arc::new(resolver),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn modules(&self) -> &ModulesApi {
        &self.modules
    }

    pub fn resolver(&self) -> &Arc<AccessResolver> {
        &self.resolver
    }

    /// Log in and make the normalized session current.
    pub async fn login(&self, email: &str, password: &str) -> Result<Arc<Session>> {
        let session = self.client.login(email, password).await?;
        Ok(self.resolver.login(session))
    }

    pub fn logout(&self) {
        if self.resolver.logout().is_some() {
            info!("Logged out");
        }
    }

    /// Load (or revalidate) the catalog for the current session.
    pub async fn load_catalog(&self) -> Arc<AccessSnapshot> {
        self.resolver.load_catalog().await
    }

    /// Refetch the catalog now.
    pub async fn refresh_catalog(&self) -> Result<Arc<AccessSnapshot>> {
        Ok(self.resolver.refresh_catalog().await?)
    }

    /// Update a module if the user may edit the module catalog.
    ///
    /// Refused updates never reach the network. A successful update marks
    /// the cached catalog stale.
    pub async fn update_module(&self, id: &str, payload: &UpdateModulePayload) -> Result<Module> {
        self.resolver.require(ModuleName::Modules, PermissionAction::Edit)?;

        let module = self.modules.put(id, payload).await?;
        self.resolver.catalog().invalidate();
        info!(module_id = %module.id, "Module updated");
        Ok(module)
    }
}
