use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::sessions;
use crate::state::AppState;

/// Session routes mounted at `/sessions`.
///
/// ```text
/// GET    /                    -> list_sessions
/// GET    /current             -> current_session
/// POST   /current/activity    -> record_activity
/// POST   /cleanup             -> cleanup_sessions (sessions:manage)
/// DELETE /{id}                -> end_session
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(sessions::list_sessions))
        .route("/current", get(sessions::current_session))
        .route("/current/activity", post(sessions::record_activity))
        .route("/cleanup", post(sessions::cleanup_sessions))
        .route("/{id}", delete(sessions::end_session))
}
