pub mod admin;
pub mod analysis;
pub mod auth;
pub mod hands;
pub mod health;
pub mod monitoring;
pub mod sessions;
pub mod statistics;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register, /auth/login, /auth/refresh      public
/// /auth/logout, /auth/me                          requires auth
///
/// /hands                                          upload, list, get, delete, reparse
/// /statistics                                     summary, filtered, positions,
///                                                 trends, export, compare, cache
/// /analysis                                       hand analyses and provider status;
///                                                 ollama install/pull (admin only)
/// /users/me                                       profile, password, preferences,
///                                                 stored API keys
/// /sessions                                       own sessions, activity ping,
///                                                 cleanup (sessions:manage)
/// /admin                                          users, roles, permissions,
///                                                 role assignments
/// /monitoring                                     metrics, system (system:read)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/hands", hands::router())
        .nest("/statistics", statistics::router())
        .nest("/analysis", analysis::router())
        .nest("/users/me", users::router())
        .nest("/sessions", sessions::router())
        .nest("/admin", admin::router())
        .nest("/monitoring", monitoring::router())
}
