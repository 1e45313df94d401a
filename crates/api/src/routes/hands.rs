use axum::routing::{get, post};
use axum::Router;

use crate::handlers::hands;
use crate::state::AppState;

/// Hand history routes mounted at `/hands`.
///
/// ```text
/// POST   /upload         -> upload (multipart `file` or JSON)
/// GET    /               -> list_hands
/// GET    /{id}           -> get_hand
/// DELETE /{id}           -> delete_hand
/// POST   /{id}/reparse   -> reparse_hand
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(hands::upload))
        .route("/", get(hands::list_hands))
        .route("/{id}", get(hands::get_hand).delete(hands::delete_hand))
        .route("/{id}/reparse", post(hands::reparse_hand))
}
