//! HTTP-level integration tests for session tracking.

mod common;

use axum::http::StatusCode;
use common::{
    admin_token, body_json, delete_auth, get_auth, login, post_auth, post_json_auth, register,
    register_and_login,
};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_records_session_details(pool: PgPool) {
    let app = common::build_test_app(pool);
    register(app.clone(), "device@example.com").await;

    let body = serde_json::json!({
        "email": "device@example.com",
        "password": common::TEST_PASSWORD,
        "timezone": "Europe/Berlin",
        "device_info": "Firefox on Linux",
    });
    let response = common::post_json(app.clone(), "/api/v1/auth/login", body).await;
    let auth = body_json(response).await["data"].clone();
    let token = auth["access_token"].as_str().unwrap();

    let response = get_auth(app, "/api/v1/sessions/current", token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], auth["session_id"]);
    assert_eq!(json["data"]["timezone"], "Europe/Berlin");
    assert_eq!(json["data"]["device_info"], "Firefox on Linux");
    assert_eq!(json["data"]["is_active"], true);
    assert!(json["data"].get("refresh_token_hash").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_sessions_newest_first(pool: PgPool) {
    let app = common::build_test_app(pool);
    register(app.clone(), "multi@example.com").await;
    let first = login(app.clone(), "multi@example.com").await;
    let second = login(app.clone(), "multi@example.com").await;
    let token = second["access_token"].as_str().unwrap();

    let response = get_auth(app, "/api/v1/sessions", token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let sessions = json["data"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["id"], second["session_id"]);
    assert_eq!(sessions[1]["id"], first["session_id"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_activity_ping_updates_timezone(pool: PgPool) {
    let app = common::build_test_app(pool);
    let (_, token) = register_and_login(app.clone(), "ping@example.com").await;

    let response = post_auth(app.clone(), "/api/v1/sessions/current/activity", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = serde_json::json!({ "timezone": "America/New_York" });
    let response =
        post_json_auth(app.clone(), "/api/v1/sessions/current/activity", &token, body).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["timezone"], "America/New_York");

    let body = serde_json::json!({ "timezone": "<script>" });
    let response = post_json_auth(app, "/api/v1/sessions/current/activity", &token, body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Ending another of your own sessions revokes it; ending it twice conflicts.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_end_session(pool: PgPool) {
    let app = common::build_test_app(pool);
    register(app.clone(), "end@example.com").await;
    let phone = login(app.clone(), "end@example.com").await;
    let laptop = login(app.clone(), "end@example.com").await;
    let laptop_token = laptop["access_token"].as_str().unwrap();

    let uri = format!("/api/v1/sessions/{}", phone["session_id"]);
    let response = delete_auth(app.clone(), &uri, laptop_token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let phone_token = phone["access_token"].as_str().unwrap();
    let response = get_auth(app.clone(), "/api/v1/sessions/current", phone_token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = delete_auth(app, &uri, laptop_token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cannot_end_foreign_session(pool: PgPool) {
    let app = common::build_test_app(pool);
    register(app.clone(), "victim@example.com").await;
    let victim = login(app.clone(), "victim@example.com").await;
    let (_, attacker) = register_and_login(app.clone(), "attacker@example.com").await;

    let uri = format!("/api/v1/sessions/{}", victim["session_id"]);
    let response = delete_auth(app, &uri, &attacker).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// Idle sessions are ended by the cleanup endpoint, which players may not call.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cleanup_ends_idle_sessions(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (idle_user, player_token) = register_and_login(app.clone(), "idle@example.com").await;
    let (_, admin) = admin_token(app.clone(), &pool, "ops@example.com").await;

    let response = post_auth(app.clone(), "/api/v1/sessions/cleanup", &player_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    sqlx::query(
        "UPDATE user_sessions SET last_activity_at = NOW() - INTERVAL '2 hours' WHERE user_id = $1",
    )
    .bind(idle_user)
    .execute(&pool)
    .await
    .unwrap();

    let response = post_auth(app.clone(), "/api/v1/sessions/cleanup", &admin).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["ended"], 1);

    let response = get_auth(app, "/api/v1/sessions/current", &player_token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
