use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::statistics;
use crate::state::AppState;

/// Statistics routes mounted at `/statistics`.
///
/// ```text
/// GET    /summary     -> summary
/// GET    /filtered    -> filtered
/// GET    /positions   -> positions
/// GET    /trends      -> trends (?period=day|week|month)
/// GET    /export      -> export (?format=csv|json)
/// GET    /compare     -> compare (?a_from&a_to&b_from&b_to)
/// DELETE /cache       -> clear_cache
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summary", get(statistics::summary))
        .route("/filtered", get(statistics::filtered))
        .route("/positions", get(statistics::positions))
        .route("/trends", get(statistics::trends))
        .route("/export", get(statistics::export))
        .route("/compare", get(statistics::compare))
        .route("/cache", delete(statistics::clear_cache))
}
