//! HTTP-level integration tests for RBAC administration.

mod common;

use axum::http::StatusCode;
use common::{
    admin_token, body_json, delete_auth, get_auth, patch_json_auth, post_json, post_json_auth,
    put_json_auth, register, register_and_login, superuser_token, TEST_PASSWORD,
};
use handcoach_db::repositories::RoleRepo;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Access control
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_player_cannot_reach_admin_routes(pool: PgPool) {
    let app = common::build_test_app(pool);
    let (_, token) = register_and_login(app.clone(), "player@example.com").await;

    for uri in ["/api/v1/admin/users", "/api/v1/admin/roles", "/api/v1/admin/permissions"] {
        let response = get_auth(app.clone(), uri, &token).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(body_json(response).await["code"], "INSUFFICIENT_PERMISSION");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_lists_users(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    register(app.clone(), "someone@example.com").await;
    let (_, token) = admin_token(app.clone(), &pool, "admin@example.com").await;

    let response = get_auth(app, "/api/v1/admin/users?limit=10", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 2);
    assert_eq!(json["data"]["items"].as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Account flags
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_deactivates_user(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let target = register(app.clone(), "target@example.com").await;
    let (admin_id, token) = admin_token(app.clone(), &pool, "admin@example.com").await;

    let uri = format!("/api/v1/admin/users/{target}");
    let body = serde_json::json!({ "is_active": false });
    let response = patch_json_auth(app.clone(), &uri, &token, body.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["is_active"], false);

    let login = serde_json::json!({ "email": "target@example.com", "password": TEST_PASSWORD });
    let response = post_json(app.clone(), "/api/v1/auth/login", login).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Not on yourself.
    let uri = format!("/api/v1/admin/users/{admin_id}");
    let response = patch_json_auth(app, &uri, &token, body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_only_superuser_grants_superuser(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let target = register(app.clone(), "target@example.com").await;
    let (_, admin) = admin_token(app.clone(), &pool, "admin@example.com").await;
    let (_, root) = superuser_token(app.clone(), &pool, "root@example.com").await;

    let uri = format!("/api/v1/admin/users/{target}");
    let body = serde_json::json!({ "is_superuser": true });

    let response = patch_json_auth(app.clone(), &uri, &admin, body.clone()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = patch_json_auth(app, &uri, &root, body).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["is_superuser"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_cannot_modify_superuser(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, admin) = admin_token(app.clone(), &pool, "admin@example.com").await;
    let (root_id, root) = superuser_token(app.clone(), &pool, "root@example.com").await;

    let uri = format!("/api/v1/admin/users/{root_id}");
    for body in [
        serde_json::json!({ "is_active": false }),
        serde_json::json!({ "is_admin": false }),
    ] {
        let response = patch_json_auth(app.clone(), &uri, &admin, body).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["code"], "INSUFFICIENT_PERMISSION");
    }

    // Still an active admin superuser.
    let response = get_auth(app.clone(), "/api/v1/auth/me", &root).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["is_active"], true);
    assert_eq!(json["data"]["is_admin"], true);

    let body = serde_json::json!({ "is_active": false });
    let response = patch_json_auth(app, "/api/v1/admin/users/999999", &admin, body).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_hard_delete_requires_superuser(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let target = register(app.clone(), "target@example.com").await;
    let (_, admin) = admin_token(app.clone(), &pool, "admin@example.com").await;
    let (root_id, root) = superuser_token(app.clone(), &pool, "root@example.com").await;

    let uri = format!("/api/v1/admin/users/{target}");
    let response = delete_auth(app.clone(), &uri, &admin).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = delete_auth(app.clone(), &uri, &root).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = delete_auth(app.clone(), &uri, &root).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = delete_auth(app, &format!("/api/v1/admin/users/{root_id}"), &root).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Roles and permissions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_system_roles_are_immutable(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, token) = admin_token(app.clone(), &pool, "admin@example.com").await;
    let player = RoleRepo::find_by_name(&pool, "player").await.unwrap().unwrap();

    let uri = format!("/api/v1/admin/roles/{}", player.id);
    let response = delete_auth(app.clone(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = serde_json::json!({ "permissions": ["hands:read"] });
    let response = put_json_auth(app, &format!("{uri}/permissions"), &token, body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

/// A custom role grants exactly its permissions to assigned users.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_custom_role_lifecycle(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let student = register(app.clone(), "student@example.com").await;
    let (_, token) = admin_token(app.clone(), &pool, "admin@example.com").await;

    let body = serde_json::json!({ "name": "coach", "description": "Reviews student hands" });
    let response = post_json_auth(app.clone(), "/api/v1/admin/roles", &token, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let role_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let body = serde_json::json!({ "name": "Coach!" });
    let response = post_json_auth(app.clone(), "/api/v1/admin/roles", &token, body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let uri = format!("/api/v1/admin/roles/{role_id}/permissions");
    let body = serde_json::json!({ "permissions": ["hands:read", "made:up"] });
    let response = put_json_auth(app.clone(), &uri, &token, body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = serde_json::json!({ "permissions": ["system:read", "hands:read", "hands:read"] });
    let response = put_json_auth(app.clone(), &uri, &token, body).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 2);

    let uri = format!("/api/v1/admin/users/{student}/roles");
    let body = serde_json::json!({ "role_id": role_id });
    let response = post_json_auth(app.clone(), &uri, &token, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["role_name"], "coach");

    let response = get_auth(
        app.clone(),
        &format!("/api/v1/admin/users/{student}/permissions"),
        &token,
    )
    .await;
    let names = body_json(response).await["data"].clone();
    assert!(names.as_array().unwrap().contains(&serde_json::json!("system:read")));

    let uri = format!("/api/v1/admin/users/{student}/roles/{role_id}");
    let response = delete_auth(app.clone(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = delete_auth(app.clone(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = delete_auth(app, &format!("/api/v1/admin/roles/{role_id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

/// Expired assignments grant nothing.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_expired_assignment_is_ignored(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (viewer, viewer_token) = register_and_login(app.clone(), "temp@example.com").await;
    let (_, token) = admin_token(app.clone(), &pool, "admin@example.com").await;
    let admin_role = RoleRepo::find_by_name(&pool, "admin").await.unwrap().unwrap();

    let body = serde_json::json!({
        "role_id": admin_role.id,
        "expires_at": "2020-01-01T00:00:00Z",
    });
    let uri = format!("/api/v1/admin/users/{viewer}/roles");
    let response = post_json_auth(app.clone(), &uri, &token, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = get_auth(app, "/api/v1/admin/roles", &viewer_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Monitoring
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_monitoring_requires_system_read(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, player) = register_and_login(app.clone(), "player@example.com").await;
    let (_, admin) = admin_token(app.clone(), &pool, "admin@example.com").await;

    let response = get_auth(app.clone(), "/api/v1/monitoring/metrics", &player).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(app.clone(), "/api/v1/monitoring/metrics", &admin).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"]["active_sessions"].as_i64().unwrap() >= 2);

    let response = get_auth(app, "/api/v1/monitoring/system", &admin).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"]["samples"].is_array());
}
