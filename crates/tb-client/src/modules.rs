//! `/api/Modules` endpoints.

use async_trait::async_trait;
use reqwest::Method;
use tb_access::{FetchError, ModuleSource};
use tb_common::{Module, UpdateModulePayload};

use crate::client::Client;
use crate::error::Result;

/// Module catalog endpoints.
///
/// Capability checks are not applied here; see
/// [`AccessClient::update_module`](crate::AccessClient::update_module) for the
/// guarded update.
#[derive(Debug, Clone)]
pub struct ModulesApi {
    client: Client,
}

impl ModulesApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// `GET /api/Modules`, single attempt. Retries belong to the catalog gate.
    pub async fn list(&self) -> Result<Vec<Module>> {
        let request = self
            .client
            .request(Method::GET, &self.client.config().modules_path)
            .build()?;
        self.client.send_once(request).await
    }

    /// `GET /api/Modules/{id}`
    pub async fn get(&self, id: &str) -> Result<Module> {
        let request = self.client.request(Method::GET, &self.item_path(id)).build()?;
        self.client.execute(request).await
    }

    /// `PUT /api/Modules/{id}` without any capability check.
    pub(crate) async fn put(&self, id: &str, payload: &UpdateModulePayload) -> Result<Module> {
        let request = self
            .client
            .request(Method::PUT, &self.item_path(id))
            .json(payload)
            .build()?;
        self.client.send_once(request).await
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.client.config().modules_path, id)
    }
}

#[async_trait]
impl ModuleSource for ModulesApi {
    async fn list_modules(&self) -> tb_access::Result<Vec<Module>> {
        self.list().await.map_err(FetchError::from)
    }
}
