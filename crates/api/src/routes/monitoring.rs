use axum::routing::get;
use axum::Router;

use crate::handlers::monitoring;
use crate::state::AppState;

/// Monitoring routes mounted at `/monitoring`.
///
/// ```text
/// GET /metrics   -> metrics (system:read)
/// GET /system    -> system (system:read)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/metrics", get(monitoring::metrics))
        .route("/system", get(monitoring::system))
}
