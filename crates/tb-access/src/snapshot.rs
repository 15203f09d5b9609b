//! Derived access state for one (session, catalog) pair.

use std::collections::HashMap;
use std::sync::Arc;

use tb_common::{AuthenticatedUser, Module, Permission, PermissionAction};
use tracing::trace;

use crate::capability::{CapabilityCheck, CapabilityResult, DenyReason, PermissionDecision};
use crate::catalog::CatalogSnapshot;
use crate::error::FetchError;
use crate::gate::has_module_access;
use crate::module_map::ModuleNameMap;

/// Everything a screen needs to decide what to show.
///
/// A pure function of the user and the catalog snapshot; rebuilt wholesale
/// whenever either changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessSnapshot {
    has_module_access: bool,
    modules: Arc<[Module]>,
    map: ModuleNameMap,
    grants: HashMap<String, Permission>,
    is_loading: bool,
    is_fetching: bool,
    error: Option<FetchError>,
    loaded: bool,
}

impl Default for AccessSnapshot {
    fn default() -> Self {
        Self {
            has_module_access: false,
            modules: Arc::from(Vec::new()),
            map: ModuleNameMap::empty(),
            grants: HashMap::new(),
            is_loading: false,
            is_fetching: false,
            error: None,
            loaded: false,
        }
    }
}

impl AccessSnapshot {
    pub fn derive(user: Option<&AuthenticatedUser>, catalog: &CatalogSnapshot) -> Self {
        let permissions = user.and_then(AuthenticatedUser::permissions);
        let has_module_access = has_module_access(permissions);

        if !has_module_access {
            return Self::default();
        }

        let modules = catalog.modules.clone().unwrap_or_else(|| Arc::from(Vec::new()));
        let map = ModuleNameMap::build(&modules);

        let mut grants = HashMap::new();
        for permission in permissions.unwrap_or_default() {
            grants
                .entry(permission.module_id.clone())
                .or_insert_with(|| permission.clone());
        }

        Self {
            has_module_access,
            // Only "no data yet" counts; a background refetch keeps serving
            // what is already there.
            is_loading: catalog.modules.is_none()
                && (catalog.is_fetching || catalog.error.is_none()),
            is_fetching: catalog.is_fetching,
            error: catalog.error.clone(),
            loaded: catalog.modules.is_some(),
            modules,
            map,
            grants,
        }
    }

    pub fn has_module_access(&self) -> bool {
        self.has_module_access
    }

    /// Catalog entries; empty while the gate is closed or nothing has loaded.
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// No catalog data yet and one is expected.
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// A fetch is running, possibly behind data that is already served.
    pub fn is_fetching(&self) -> bool {
        self.is_fetching
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    /// Gate open, catalog loaded and no error. A background refetch does
    /// not make a loaded snapshot unready.
    pub fn is_ready(&self) -> bool {
        self.has_module_access && self.loaded && !self.is_loading && self.error.is_none()
    }

    pub fn module_map(&self) -> &ModuleNameMap {
        &self.map
    }

    pub fn module_id(&self, name: &str) -> Option<&str> {
        self.map.module_id(name)
    }

    pub fn module_name(&self, id: &str) -> Option<&str> {
        self.map.module_name(id)
    }

    pub fn module_exists(&self, name: &str) -> bool {
        self.map.module_exists(name)
    }

    pub fn available_module_names(&self) -> Vec<&str> {
        self.map.available_module_names()
    }

    /// Like [`CapabilityCheck::check`] but says why access was denied.
    pub fn explain(&self, module: &str, action: PermissionAction) -> PermissionDecision {
        let decision = self.decide(module, action);
        if let Some(reason) = decision.reason {
            trace!(module, %action, %reason, "Capability denied");
        }
        decision
    }

    fn decide(&self, module: &str, action: PermissionAction) -> PermissionDecision {
        if !self.has_module_access {
            return PermissionDecision::deny(module, action, DenyReason::NoModuleAccess);
        }
        let Some(id) = self.map.module_id(module) else {
            return PermissionDecision::deny(module, action, DenyReason::UnknownModule);
        };
        let Some(permission) = self.grants.get(id) else {
            return PermissionDecision::deny(module, action, DenyReason::NoPermissionEntry);
        };
        if permission.allows(action) {
            PermissionDecision::allow(module, action)
        } else {
            PermissionDecision::deny(module, action, DenyReason::ActionNotGranted)
        }
    }
}

impl CapabilityCheck for AccessSnapshot {
    fn check(&self, module: &str, action: PermissionAction) -> CapabilityResult {
        if !self.has_module_access {
            return CapabilityResult::DENIED;
        }
        CapabilityResult {
            has_permission: self.decide(module, action).allowed,
            is_loading: self.is_loading,
        }
    }
}

/// One-shot capability check without building a snapshot to keep.
pub fn check_capability(
    user: Option<&AuthenticatedUser>,
    catalog: &CatalogSnapshot,
    module: &str,
    action: PermissionAction,
) -> CapabilityResult {
    AccessSnapshot::derive(user, catalog).check(module, action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tb_common::{ModuleName, RoleWithPermissions, UserProfile};

    fn user(permissions: Option<Vec<Permission>>) -> AuthenticatedUser {
        AuthenticatedUser {
            profile: UserProfile {
                id: "u1".into(),
                ..Default::default()
            },
            role: Some(RoleWithPermissions {
                role_id: "r1".into(),
                role_name: "Operador".into(),
                permissions,
            }),
        }
    }

    fn inventory_reader() -> AuthenticatedUser {
        user(Some(vec![Permission::new("m1").grant(PermissionAction::Read)]))
    }

    fn catalog() -> CatalogSnapshot {
        CatalogSnapshot::loaded(vec![Module::new("m1", "inventario"), Module::new("m2", "Ventas")])
    }

    #[test]
    fn test_reader_scenario() {
        let user = inventory_reader();
        let snapshot = AccessSnapshot::derive(Some(&user), &CatalogSnapshot::loaded(vec![Module::new("m1", "inventario")]));

        assert!(snapshot.can(ModuleName::Inventory, PermissionAction::Read));
        assert!(!snapshot.can(ModuleName::Inventory, PermissionAction::Write));
        assert!(!snapshot.can("ventas", PermissionAction::Read));
        assert_eq!(
            snapshot.explain("ventas", PermissionAction::Read).reason,
            Some(DenyReason::UnknownModule)
        );
        assert!(snapshot.is_ready());
    }

    #[test]
    fn test_closed_gate_hides_catalog() {
        let user = user(Some(vec![]));
        let snapshot = AccessSnapshot::derive(Some(&user), &catalog());

        assert!(!snapshot.has_module_access());
        assert!(snapshot.modules().is_empty());
        assert!(snapshot.available_module_names().is_empty());
        assert_eq!(snapshot.module_id("inventario"), None);
        assert!(!snapshot.is_ready());
        assert_eq!(snapshot.check("inventario", PermissionAction::Read), CapabilityResult::DENIED);
        assert_eq!(
            snapshot.explain("inventario", PermissionAction::Read).reason,
            Some(DenyReason::NoModuleAccess)
        );
    }

    #[test]
    fn test_no_user_is_closed_gate() {
        let snapshot = AccessSnapshot::derive(None, &catalog());
        assert_eq!(snapshot, AccessSnapshot::default());
    }

    #[test]
    fn test_missing_row_is_denied() {
        let user = inventory_reader();
        let snapshot = AccessSnapshot::derive(Some(&user), &catalog());

        for action in PermissionAction::ALL {
            assert!(!snapshot.can(ModuleName::Sales, action));
            assert_eq!(
                snapshot.explain("Ventas", action).reason,
                Some(DenyReason::NoPermissionEntry)
            );
        }
        assert_eq!(
            snapshot.explain("inventario", PermissionAction::Delete).reason,
            Some(DenyReason::ActionNotGranted)
        );
    }

    #[test]
    fn test_loading_until_catalog_arrives() {
        let user = inventory_reader();
        let pending = CatalogSnapshot::default();
        let snapshot = AccessSnapshot::derive(Some(&user), &pending);

        assert!(snapshot.is_loading());
        assert_eq!(
            snapshot.check("inventario", PermissionAction::Read),
            CapabilityResult {
                has_permission: false,
                is_loading: true,
            }
        );
    }

    #[test]
    fn test_error_without_data_is_not_loading() {
        let user = inventory_reader();
        let failed = CatalogSnapshot {
            error: Some(FetchError::Transport("timeout".into())),
            ..Default::default()
        };
        let snapshot = AccessSnapshot::derive(Some(&user), &failed);

        assert!(!snapshot.is_loading());
        assert!(!snapshot.is_ready());
        assert_eq!(snapshot.error(), Some(&FetchError::Transport("timeout".into())));
        assert!(!snapshot.can("inventario", PermissionAction::Read));
    }

    #[test]
    fn test_refetch_behind_loaded_data_is_not_loading() {
        let user = inventory_reader();
        let revalidating = CatalogSnapshot {
            is_fetching: true,
            ..catalog()
        };
        let snapshot = AccessSnapshot::derive(Some(&user), &revalidating);

        assert!(!snapshot.is_loading());
        assert!(snapshot.is_fetching());
        assert!(snapshot.is_ready());
        assert_eq!(
            snapshot.check("inventario", PermissionAction::Read),
            CapabilityResult {
                has_permission: true,
                is_loading: false,
            }
        );
    }

    #[test]
    fn test_retry_after_failed_first_load_is_loading() {
        let user = inventory_reader();
        let retrying = CatalogSnapshot {
            is_fetching: true,
            error: Some(FetchError::Transport("timeout".into())),
            ..Default::default()
        };
        let snapshot = AccessSnapshot::derive(Some(&user), &retrying);

        assert!(snapshot.is_loading());
        assert!(!snapshot.is_ready());
    }

    #[test]
    fn test_first_permission_row_wins() {
        let user = user(Some(vec![
            Permission::new("m1").grant(PermissionAction::Read),
            Permission::new("m1")
                .grant(PermissionAction::Read)
                .grant(PermissionAction::Delete),
        ]));
        let snapshot = AccessSnapshot::derive(Some(&user), &catalog());
        assert!(!snapshot.can("inventario", PermissionAction::Delete));
    }

    #[test]
    fn test_check_capability_matches_snapshot() {
        let user = inventory_reader();
        let catalog = catalog();
        let snapshot = AccessSnapshot::derive(Some(&user), &catalog);

        for module in ModuleName::ALL {
            for action in PermissionAction::ALL {
                assert_eq!(
                    check_capability(Some(&user), &catalog, module.as_str(), action),
                    snapshot.check(module.as_str(), action)
                );
            }
        }
    }
}
