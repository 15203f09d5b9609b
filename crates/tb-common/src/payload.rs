//! Login payload as the backend sends it.
//!
//! The user object arrives with its role under either `role.permissions`
//! (camelCase) or `Role.Permissions` (PascalCase) depending on the endpoint
//! that produced it. These types accept both and [`UserPayload::normalize`]
//! collapses them into a single [`AuthenticatedUser`].

use serde::{Deserialize, Serialize};

use crate::{AuthenticatedUser, Permission, RoleWithPermissions, UserProfile};

/// Response body of `POST /api/Auth/login`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginResponse {
    #[serde(alias = "Token")]
    pub token: String,
    #[serde(alias = "User")]
    pub user: UserPayload,
}

/// Role object in camelCase form (`role.permissions`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CamelRole {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub permissions: Option<Vec<Permission>>,
}

/// Role object in PascalCase form (`Role.Permissions`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PascalRole {
    #[serde(default, rename = "id", alias = "Id")]
    pub id: Option<String>,
    #[serde(default, rename = "name", alias = "Name")]
    pub name: Option<String>,
    #[serde(default, rename = "Permissions")]
    pub permissions: Option<Vec<Permission>>,
}

/// User object as received, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role_id: Option<String>,
    #[serde(default)]
    pub role_name: Option<String>,
    #[serde(default)]
    pub status: Option<bool>,
    #[serde(default)]
    pub dni: Option<String>,
    #[serde(default, alias = "phoneNumber")]
    pub phonenumber: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<CamelRole>,
    #[serde(default, rename = "Role", skip_serializing_if = "Option::is_none")]
    pub role_pascal: Option<PascalRole>,
}

impl UserPayload {
    /// Collapse both role shapes into the canonical user.
    ///
    /// Each role field is taken from the camelCase object first, then the
    /// PascalCase one, then the flat `roleId`/`roleName` on the user. No role
    /// object at all yields `role: None`.
    pub fn normalize(self) -> AuthenticatedUser {
        let UserPayload {
            id,
            name,
            email,
            role_id,
            role_name,
            status,
            dni,
            phonenumber,
            role,
            role_pascal,
        } = self;

        let has_role = role.is_some() || role_pascal.is_some();
        let camel = role.unwrap_or_default();
        let pascal = role_pascal.unwrap_or_default();

        let role = if has_role {
            Some(RoleWithPermissions {
                role_id: camel
                    .id
                    .or(pascal.id)
                    .or_else(|| role_id.clone())
                    .unwrap_or_default(),
                role_name: camel.name.or(pascal.name).or(role_name).unwrap_or_default(),
                permissions: camel.permissions.or(pascal.permissions),
            })
        } else {
            None
        };

        AuthenticatedUser {
            profile: UserProfile {
                id,
                name,
                email,
                role_id,
                dni,
                phone_number: phonenumber,
                active: status.unwrap_or(true),
            },
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn camel_payload() -> serde_json::Value {
        json!({
            "id": "u1",
            "name": "Ana",
            "email": "ana@example.com",
            "roleId": "r1",
            "status": true,
            "role": {
                "id": "r1",
                "name": "Operador",
                "permissions": [
                    { "id": "p1", "moduleId": "m1", "canRead": true, "canWrite": false, "canEdit": false, "canDelete": false }
                ]
            }
        })
    }

    fn pascal_payload() -> serde_json::Value {
        json!({
            "id": "u1",
            "name": "Ana",
            "email": "ana@example.com",
            "roleId": "r1",
            "status": true,
            "Role": {
                "id": "r1",
                "name": "Operador",
                "Permissions": [
                    { "id": "p1", "moduleId": "m1", "canRead": true, "canWrite": false, "canEdit": false, "canDelete": false }
                ]
            }
        })
    }

    #[test]
    fn test_both_shapes_normalize_identically() {
        let camel: UserPayload = serde_json::from_value(camel_payload()).unwrap();
        let pascal: UserPayload = serde_json::from_value(pascal_payload()).unwrap();

        assert_eq!(camel.normalize(), pascal.normalize());
    }

    #[test]
    fn test_camel_shape_wins_when_both_present() {
        let payload: UserPayload = serde_json::from_value(json!({
            "id": "u1",
            "role": { "id": "r1", "name": "Admin", "permissions": [] },
            "Role": { "id": "r2", "name": "Operador", "Permissions": [{ "moduleId": "m1", "canRead": true }] }
        }))
        .unwrap();

        let user = payload.normalize();
        let role = user.role.as_ref().unwrap();
        assert_eq!(role.role_id, "r1");
        assert_eq!(role.role_name, "Admin");
        assert_eq!(user.permissions(), Some(&[][..]));
    }

    #[test]
    fn test_no_role_means_no_permissions() {
        let payload: UserPayload = serde_json::from_value(json!({
            "id": "u1",
            "name": "Ana",
            "roleId": "r1",
            "roleName": "Operador"
        }))
        .unwrap();

        let user = payload.normalize();
        assert!(user.role.is_none());
        assert!(user.permissions().is_none());
        assert_eq!(user.profile.role_id.as_deref(), Some("r1"));
    }

    #[test]
    fn test_role_without_permission_list() {
        let payload: UserPayload = serde_json::from_value(json!({
            "id": "u1",
            "roleId": "r9",
            "Role": { "name": "Invitado" }
        }))
        .unwrap();

        let user = payload.normalize();
        let role = user.role.as_ref().unwrap();
        assert_eq!(role.role_id, "r9");
        assert_eq!(role.role_name, "Invitado");
        assert!(user.permissions().is_none());
    }

    #[test]
    fn test_pascal_permission_fields_accepted() {
        let payload: UserPayload = serde_json::from_value(json!({
            "id": "u1",
            "Role": {
                "Id": "r1",
                "Name": "Operador",
                "Permissions": [{ "ModuleId": "m1", "CanRead": true, "CanDelete": true }]
            }
        }))
        .unwrap();

        let user = payload.normalize();
        let perms = user.permissions().unwrap();
        assert_eq!(perms[0].module_id, "m1");
        assert!(perms[0].can_read);
        assert!(perms[0].can_delete);
        assert!(!perms[0].can_write);
    }

    #[test]
    fn test_login_response_parses() {
        let body = json!({ "token": "abc", "user": camel_payload() });
        let response: LoginResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.token, "abc");
        assert_eq!(response.user.normalize().role_name(), Some("Operador"));
    }
}
