//! Records every request into the [`MetricsRegistry`](crate::metrics::MetricsRegistry).

use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::state::AppState;

/// Label shared by every request that matched no route, so arbitrary
/// paths cannot add registry entries.
pub const UNMATCHED_ROUTE: &str = "<unmatched>";

pub async fn track(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let route = route_label(&request);

    let started = Instant::now();
    let response = next.run(request).await;
    state
        .metrics
        .record_request(&route, response.status().as_u16(), started.elapsed());
    response
}

/// `METHOD /route/{template}` for matched requests, else the method and
/// [`UNMATCHED_ROUTE`].
pub fn route_label(request: &Request) -> String {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or(UNMATCHED_ROUTE, MatchedPath::as_str);
    format!("{} {route}", request.method())
}
