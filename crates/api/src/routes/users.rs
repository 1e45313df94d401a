use axum::routing::{get, put};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Self-service routes mounted at `/users/me`.
///
/// ```text
/// GET    /                       -> get_me
/// PATCH  /                       -> update_me
/// DELETE /                       -> delete_me
/// PUT    /password               -> change_password
/// GET    /preferences            -> get_preferences
/// PUT    /preferences            -> update_preferences
/// GET    /api-keys               -> list_api_keys
/// PUT    /api-keys/{provider}    -> set_api_key
/// DELETE /api-keys/{provider}    -> delete_api_key
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(users::get_me)
                .patch(users::update_me)
                .delete(users::delete_me),
        )
        .route("/password", put(users::change_password))
        .route(
            "/preferences",
            get(users::get_preferences).put(users::update_preferences),
        )
        .route("/api-keys", get(users::list_api_keys))
        .route(
            "/api-keys/{provider}",
            put(users::set_api_key).delete(users::delete_api_key),
        )
}
