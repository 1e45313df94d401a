//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{admin_token, body_json, get, get_auth};
use sqlx::PgPool;
use tower::ServiceExt;

#[sqlx::test(migrations = "../../db/migrations")]
async fn health_check_reports_database(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["db_healthy"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_route_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_routes_share_one_metrics_entry(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    for i in 0..5 {
        let response = get(app.clone(), &format!("/scan/{i}/wp-login.php")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
    get(app.clone(), "/health").await;

    let (_, token) = admin_token(app.clone(), &pool, "admin@example.com").await;
    let response = get_auth(app, "/api/v1/monitoring/metrics", &token).await;
    let json = body_json(response).await;
    let routes: Vec<&str> = json["data"]["requests"]["routes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["route"].as_str().unwrap())
        .collect();

    assert!(routes.iter().all(|r| !r.contains("wp-login")), "{routes:?}");
    assert!(routes.contains(&"GET /health"), "{routes:?}");
    let unmatched = json["data"]["requests"]["routes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["route"] == "GET <unmatched>")
        .expect("unmatched bucket");
    assert_eq!(unmatched["count"], 5);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn response_contains_x_request_id_header(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cors_preflight_allows_dev_origin(pool: PgPool) {
    let app = common::build_test_app(pool);

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/hands")
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "GET")
        .header("Access-Control-Request-Headers", "authorization")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let allow_origin = response
        .headers()
        .get("access-control-allow-origin")
        .expect("Missing Access-Control-Allow-Origin header");
    assert_eq!(allow_origin, "http://localhost:5173");
}

/// Past the per-window budget the API answers 429; `/health` stays open.
#[sqlx::test(migrations = "../../db/migrations")]
async fn rate_limit_rejects_excess_requests(pool: PgPool) {
    let mut config = common::test_config();
    config.rate_limit_requests = 2;
    let app = common::build_test_app_with(pool, config);

    for _ in 0..2 {
        let response = get(app.clone(), "/api/v1/auth/me").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = get(app.clone(), "/api/v1/auth/me").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(response).await;
    assert_eq!(json["code"], "RATE_LIMITED");

    let response = get(app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
}
