use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod logging;
pub mod payload;

pub use payload::{LoginResponse, UserPayload};

// ============================================================================
// Module Catalog
// ============================================================================

/// A named capability area as served by `GET /api/Modules`.
///
/// Only `id` and `name` are consulted by access checks; the remaining fields
/// are carried through for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    #[serde(alias = "Id")]
    pub id: String,
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(default, alias = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "Status", skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
}

impl Module {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            status: None,
        }
    }
}

/// Payload for `PUT /api/Modules/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModulePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
}

/// Module names exactly as the backend spells them.
///
/// Call sites refer to modules through these constants instead of raw
/// strings or backend ids. The spelling (including case) must match the
/// backend catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModuleName {
    Modules,
    Users,
    Roles,
    Inventory,
    Production,
    Sales,
    Museum,
    Rentals,
    Finance,
    Monastery,
    Church,
}

impl ModuleName {
    pub const ALL: [ModuleName; 11] = [
        ModuleName::Modules,
        ModuleName::Users,
        ModuleName::Roles,
        ModuleName::Inventory,
        ModuleName::Production,
        ModuleName::Sales,
        ModuleName::Museum,
        ModuleName::Rentals,
        ModuleName::Finance,
        ModuleName::Monastery,
        ModuleName::Church,
    ];

    /// The literal module name recognised by the backend.
    pub const fn as_str(self) -> &'static str {
        match self {
            ModuleName::Modules => "modulos",
            ModuleName::Users => "user",
            ModuleName::Roles => "roles",
            ModuleName::Inventory => "inventario",
            ModuleName::Production => "Produccion",
            ModuleName::Sales => "Ventas",
            ModuleName::Museum => "Museo",
            ModuleName::Rentals => "Alquileres",
            ModuleName::Finance => "Finanzas",
            ModuleName::Monastery => "Monasterio",
            ModuleName::Church => "Iglesia",
        }
    }

    /// Reverse lookup from a backend module name (case-sensitive).
    pub fn from_backend_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }
}

impl AsRef<str> for ModuleName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Permissions
// ============================================================================

/// The four per-module actions a role can be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionAction {
    Read,
    Write,
    Edit,
    Delete,
}

impl PermissionAction {
    pub const ALL: [PermissionAction; 4] = [
        PermissionAction::Read,
        PermissionAction::Write,
        PermissionAction::Edit,
        PermissionAction::Delete,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            PermissionAction::Read => "read",
            PermissionAction::Write => "write",
            PermissionAction::Edit => "edit",
            PermissionAction::Delete => "delete",
        }
    }

    /// Name of the permission flag on the wire (`canRead`, ...).
    pub const fn flag_name(self) -> &'static str {
        match self {
            PermissionAction::Read => "canRead",
            PermissionAction::Write => "canWrite",
            PermissionAction::Edit => "canEdit",
            PermissionAction::Delete => "canDelete",
        }
    }
}

impl fmt::Display for PermissionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown permission action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for PermissionAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "read" | "canread" => Ok(PermissionAction::Read),
            "write" | "canwrite" => Ok(PermissionAction::Write),
            "edit" | "canedit" => Ok(PermissionAction::Edit),
            "delete" | "candelete" => Ok(PermissionAction::Delete),
            _ => Err(UnknownAction(s.to_string())),
        }
    }
}

/// One row of a role's permission table.
///
/// Missing flags deserialize as `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[serde(default, alias = "Id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(alias = "ModuleId")]
    pub module_id: String,
    #[serde(default, alias = "ModuleName", skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
    #[serde(default, alias = "CanRead")]
    pub can_read: bool,
    #[serde(default, alias = "CanWrite")]
    pub can_write: bool,
    #[serde(default, alias = "CanEdit")]
    pub can_edit: bool,
    #[serde(default, alias = "CanDelete")]
    pub can_delete: bool,
}

impl Permission {
    /// A row for `module_id` with every flag cleared.
    pub fn new(module_id: impl Into<String>) -> Self {
        Self {
            id: None,
            module_id: module_id.into(),
            module_name: None,
            can_read: false,
            can_write: false,
            can_edit: false,
            can_delete: false,
        }
    }

    pub fn grant(mut self, action: PermissionAction) -> Self {
        match action {
            PermissionAction::Read => self.can_read = true,
            PermissionAction::Write => self.can_write = true,
            PermissionAction::Edit => self.can_edit = true,
            PermissionAction::Delete => self.can_delete = true,
        }
        self
    }

    pub fn allows(&self, action: PermissionAction) -> bool {
        match action {
            PermissionAction::Read => self.can_read,
            PermissionAction::Write => self.can_write,
            PermissionAction::Edit => self.can_edit,
            PermissionAction::Delete => self.can_delete,
        }
    }
}

// ============================================================================
// Authenticated User
// ============================================================================

/// A role together with the permission rows it carries.
///
/// `permissions` is `None` when the payload had no permission list at all,
/// which is distinct from an empty list only for diagnostics; both grant
/// nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleWithPermissions {
    pub role_id: String,
    pub role_name: String,
    #[serde(default)]
    pub permissions: Option<Vec<Permission>>,
}

/// Identity fields of the logged-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role_id: Option<String>,
    #[serde(default)]
    pub dni: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub active: bool,
}

/// The canonical user record produced at login.
///
/// There is exactly one `role` field; payload casing differences are
/// resolved by [`UserPayload::normalize`] before this type exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub profile: UserProfile,
    #[serde(default)]
    pub role: Option<RoleWithPermissions>,
}

impl AuthenticatedUser {
    /// Permission rows, or `None` when none were loaded.
    pub fn permissions(&self) -> Option<&[Permission]> {
        self.role
            .as_ref()
            .and_then(|r| r.permissions.as_deref())
    }

    pub fn role_name(&self) -> Option<&str> {
        self.role.as_ref().map(|r| r.role_name.as_str())
    }
}
