use axum::routing::{get, post};
use axum::Router;

use crate::handlers::analysis;
use crate::state::AppState;

/// AI analysis routes mounted at `/analysis`.
///
/// ```text
/// POST /hands/{id}                    -> analyze_hand
/// GET  /hands/{id}                    -> list_for_hand
/// GET  /{id}                          -> get_analysis
/// GET  /providers                     -> list_providers
/// GET  /providers/{provider}/status   -> provider_status_handler
/// POST /providers/ollama/install      -> install_ollama_handler (admin only)
/// POST /providers/ollama/pull         -> pull_ollama_model (admin only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/hands/{id}",
            get(analysis::list_for_hand).post(analysis::analyze_hand),
        )
        .route("/{id}", get(analysis::get_analysis))
        .route("/providers", get(analysis::list_providers))
        .route(
            "/providers/{provider}/status",
            get(analysis::provider_status_handler),
        )
        .route(
            "/providers/ollama/install",
            post(analysis::install_ollama_handler),
        )
        .route("/providers/ollama/pull", post(analysis::pull_ollama_model))
}
