//! AccessClient against a mocked backend
//!
//! Tests for:
//! - Login payload normalization and bearer auth
//! - Catalog gate (skip, 403, retries)
//! - Guarded module update
//! - Session loss on 401, which also drops the cached catalog

use std::time::Duration;

use serde_json::{json, Value};
use tb_access::{AccessError, CapabilityCheck, DenyReason, FetchError, RetryPolicy, RoleOverride, SessionStore};
use tb_client::{AccessClient, Client, Config, Error};
use tb_common::{ModuleName, PermissionAction, UpdateModulePayload};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn access_client(server: &MockServer) -> AccessClient {
    let config = Config::new(server.uri()).with_retry(3, Duration::from_millis(5));
    let client = Client::new(config, SessionStore::new()).unwrap();
    AccessClient::new(
        client,
        RetryPolicy::new(2, Duration::from_millis(5)),
        Duration::from_secs(300),
        Some(RoleOverride::role_named("Admin")),
    )
}

fn login_body(role_name: &str, permissions: Value) -> Value {
    json!({
        "token": "jwt-1",
        "user": {
            "id": "u1",
            "name": "Ana",
            "email": "ana@example.com",
            "roleId": "r1",
            "status": true,
            "Role": {
                "id": "r1",
                "name": role_name,
                "Permissions": permissions
            }
        }
    })
}

fn catalog_body() -> Value {
    json!([
        { "id": "m0", "name": "modulos" },
        { "id": "m1", "name": "inventario", "description": "Stock", "status": true }
    ])
}

async fn mount_login(server: &MockServer, role_name: &str, permissions: Value) {
    Mock::given(method("POST"))
        .and(path("/api/Auth/login"))
        .and(body_json(json!({ "email": "ana@example.com", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body(role_name, permissions)))
        .expect(1)
        .mount(server)
        .await;
}

fn inventory_reader() -> Value {
    json!([{ "moduleId": "m1", "canRead": true, "canWrite": false, "canEdit": false, "canDelete": false }])
}

#[tokio::test]
async fn test_login_normalizes_and_sends_bearer() {
    let server = MockServer::start().await;
    mount_login(&server, "Operador", inventory_reader()).await;

    Mock::given(method("GET"))
        .and(path("/api/Modules"))
        .and(header("authorization", "Bearer jwt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_body()))
        .expect(1)
        .mount(&server)
        .await;

    let access = access_client(&server);
    let session = access.login("ana@example.com", "secret").await.unwrap();

    assert_eq!(session.role_name(), Some("Operador"));
    assert_eq!(session.permissions().map(|p| p.len()), Some(1));

    let snapshot = access.load_catalog().await;
    assert!(snapshot.is_ready());
    assert!(snapshot.can(ModuleName::Inventory, PermissionAction::Read));
    assert!(!snapshot.can(ModuleName::Inventory, PermissionAction::Write));
    assert_eq!(snapshot.module_id("modulos"), Some("m0"));
}

#[tokio::test]
async fn test_closed_gate_sends_no_catalog_request() {
    let server = MockServer::start().await;
    mount_login(&server, "Operador", json!([{ "moduleId": "m1", "canWrite": true }])).await;

    Mock::given(method("GET"))
        .and(path("/api/Modules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_body()))
        .expect(0)
        .mount(&server)
        .await;

    let access = access_client(&server);
    access.login("ana@example.com", "secret").await.unwrap();
    let snapshot = access.load_catalog().await;

    assert!(!snapshot.has_module_access());
    assert!(!snapshot.is_loading());
    assert!(snapshot.error().is_none());
    assert!(snapshot.modules().is_empty());
}

#[tokio::test]
async fn test_forbidden_catalog_is_empty_without_error() {
    let server = MockServer::start().await;
    mount_login(&server, "Operador", inventory_reader()).await;

    Mock::given(method("GET"))
        .and(path("/api/Modules"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .expect(1)
        .mount(&server)
        .await;

    let access = access_client(&server);
    access.login("ana@example.com", "secret").await.unwrap();
    let snapshot = access.load_catalog().await;

    assert!(snapshot.has_module_access());
    assert!(snapshot.modules().is_empty());
    assert!(snapshot.error().is_none());
    assert!(!snapshot.can(ModuleName::Inventory, PermissionAction::Read));
}

#[tokio::test]
async fn test_server_error_retried_twice_then_reported() {
    let server = MockServer::start().await;
    mount_login(&server, "Operador", inventory_reader()).await;

    Mock::given(method("GET"))
        .and(path("/api/Modules"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(3)
        .mount(&server)
        .await;

    let access = access_client(&server);
    access.login("ana@example.com", "secret").await.unwrap();
    let snapshot = access.load_catalog().await;

    assert!(matches!(snapshot.error(), Some(FetchError::Server { status: 500, .. })));
    assert!(!snapshot.is_loading());
    assert!(!snapshot.can(ModuleName::Inventory, PermissionAction::Read));
}

#[tokio::test]
async fn test_update_refused_without_edit_permission() {
    let server = MockServer::start().await;
    mount_login(&server, "Operador", inventory_reader()).await;

    Mock::given(method("GET"))
        .and(path("/api/Modules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_body()))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/Modules/m1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "m1", "name": "inventario" })))
        .expect(0)
        .mount(&server)
        .await;

    let access = access_client(&server);
    access.login("ana@example.com", "secret").await.unwrap();
    access.load_catalog().await;

    let payload = UpdateModulePayload {
        status: Some(false),
        ..Default::default()
    };
    let err = access.update_module("m1", &payload).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Access(AccessError::Denied {
            reason: DenyReason::NoPermissionEntry,
            ..
        })
    ));
}

#[tokio::test]
async fn test_update_allowed_invalidates_catalog() {
    let server = MockServer::start().await;
    mount_login(
        &server,
        "Operador",
        json!([{ "moduleId": "m0", "canRead": true, "canEdit": true }]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/api/Modules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_body()))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/Modules/m1"))
        .and(body_json(json!({ "status": false })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "m1", "name": "inventario", "status": false })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let access = access_client(&server);
    access.login("ana@example.com", "secret").await.unwrap();
    access.load_catalog().await;
    assert!(access.resolver().catalog().is_fresh());

    let payload = UpdateModulePayload {
        status: Some(false),
        ..Default::default()
    };
    let module = access.update_module("m1", &payload).await.unwrap();

    assert_eq!(module.status, Some(false));
    assert!(!access.resolver().catalog().is_fresh());
}

#[tokio::test]
async fn test_admin_override_allows_update_with_closed_gate() {
    let server = MockServer::start().await;
    mount_login(&server, "Admin", json!([])).await;

    Mock::given(method("PUT"))
        .and(path("/api/Modules/m1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "m1", "name": "inventario" })))
        .expect(1)
        .mount(&server)
        .await;

    let access = access_client(&server);
    access.login("ana@example.com", "secret").await.unwrap();

    assert!(!access.load_catalog().await.has_module_access());
    assert!(access.resolver().can(ModuleName::Finance, PermissionAction::Delete));
    access
        .update_module("m1", &UpdateModulePayload::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unauthorized_ends_session() {
    let server = MockServer::start().await;
    mount_login(&server, "Operador", inventory_reader()).await;

    Mock::given(method("GET"))
        .and(path("/api/Modules"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1..)
        .mount(&server)
        .await;

    let access = access_client(&server);
    access.login("ana@example.com", "secret").await.unwrap();
    access.load_catalog().await;

    assert!(!access.client().sessions().is_authenticated());
    assert!(!access.resolver().can(ModuleName::Inventory, PermissionAction::Read));
}

#[tokio::test]
async fn test_unauthorized_drops_cached_catalog() {
    let server = MockServer::start().await;
    mount_login(&server, "Operador", inventory_reader()).await;

    Mock::given(method("GET"))
        .and(path("/api/Modules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/Modules/m1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1..)
        .mount(&server)
        .await;

    let access = access_client(&server);
    access.login("ana@example.com", "secret").await.unwrap();
    access.load_catalog().await;
    assert!(access.resolver().catalog().snapshot().is_loaded());

    assert!(access.modules().get("m1").await.is_err());

    assert!(!access.client().sessions().is_authenticated());
    assert!(!access.resolver().catalog().snapshot().is_loaded());
    assert!(!access.resolver().catalog().is_fresh());
}

#[tokio::test]
async fn test_failed_login_keeps_no_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/Auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .expect(1)
        .mount(&server)
        .await;

    let access = access_client(&server);
    let err = access.login("ana@example.com", "secret").await.unwrap_err();

    assert!(matches!(err, Error::Authentication(_)));
    assert!(!access.client().sessions().is_authenticated());
}

#[tokio::test]
async fn test_get_module_not_found_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/Modules/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let access = access_client(&server);
    let err = access.modules().get("missing").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}
