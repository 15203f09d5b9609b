//! Capability results and the check trait every consumer goes through.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tb_common::PermissionAction;

/// Answer to "may the user perform `action` on `module`".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityResult {
    pub has_permission: bool,
    pub is_loading: bool,
}

impl CapabilityResult {
    pub const DENIED: CapabilityResult = CapabilityResult {
        has_permission: false,
        is_loading: false,
    };

    pub fn granted() -> Self {
        Self {
            has_permission: true,
            is_loading: false,
        }
    }
}

/// Why a check came back negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No read permission on any module, so the catalog was never requested
    NoModuleAccess,
    /// Name not in the catalog, or the catalog has not loaded
    UnknownModule,
    /// The role has no permission row for this module
    NoPermissionEntry,
    /// The row exists but the flag for this action is off
    ActionNotGranted,
}

impl DenyReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            DenyReason::NoModuleAccess => "no_module_access",
            DenyReason::UnknownModule => "unknown_module",
            DenyReason::NoPermissionEntry => "no_permission_entry",
            DenyReason::ActionNotGranted => "action_not_granted",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A check result with the reason attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionDecision {
    pub module: String,
    pub action: PermissionAction,
    pub allowed: bool,
    pub reason: Option<DenyReason>,
}

impl PermissionDecision {
    pub fn allow(module: impl Into<String>, action: PermissionAction) -> Self {
        Self {
            module: module.into(),
            action,
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(module: impl Into<String>, action: PermissionAction, reason: DenyReason) -> Self {
        Self {
            module: module.into(),
            action,
            allowed: false,
            reason: Some(reason),
        }
    }
}

/// All four flags for one module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleCapabilities {
    pub can_read: bool,
    pub can_write: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub is_loading: bool,
}

impl ModuleCapabilities {
    pub fn allows(&self, action: PermissionAction) -> bool {
        match action {
            PermissionAction::Read => self.can_read,
            PermissionAction::Write => self.can_write,
            PermissionAction::Edit => self.can_edit,
            PermissionAction::Delete => self.can_delete,
        }
    }
}

/// A synchronous, side-effect free capability predicate.
pub trait CapabilityCheck {
    fn check(&self, module: &str, action: PermissionAction) -> CapabilityResult;

    /// Shorthand for `check(..).has_permission` taking a `ModuleName` or any string.
    fn can(&self, module: impl AsRef<str>, action: PermissionAction) -> bool
    where
        Self: Sized,
    {
        self.check(module.as_ref(), action).has_permission
    }

    fn module_capabilities(&self, module: &str) -> ModuleCapabilities {
        let mut caps = ModuleCapabilities::default();
        for action in PermissionAction::ALL {
            let result = self.check(module, action);
            caps.is_loading |= result.is_loading;
            match action {
                PermissionAction::Read => caps.can_read = result.has_permission,
                PermissionAction::Write => caps.can_write = result.has_permission,
                PermissionAction::Edit => caps.can_edit = result.has_permission,
                PermissionAction::Delete => caps.can_delete = result.has_permission,
            }
        }
        caps
    }
}

impl<T: CapabilityCheck + ?Sized> CapabilityCheck for &T {
    fn check(&self, module: &str, action: PermissionAction) -> CapabilityResult {
        (**self).check(module, action)
    }
}

impl<T: CapabilityCheck + ?Sized> CapabilityCheck for Arc<T> {
    fn check(&self, module: &str, action: PermissionAction) -> CapabilityResult {
        (**self).check(module, action)
    }
}
