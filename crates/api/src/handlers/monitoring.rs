//! Handlers for in-process monitoring. Both endpoints need `system:read`.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use handcoach_core::rbac::Requirement;
use handcoach_core::roles::permissions;
use handcoach_db::repositories::SessionRepo;
use serde::Serialize;

use crate::error::AppResult;
use crate::metrics::{MetricsSnapshot, SystemSample};
use crate::middleware::rbac::CurrentUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MonitoringMetrics {
    #[serde(flatten)]
    pub requests: MetricsSnapshot,
    pub active_sessions: i64,
}

#[derive(Debug, Serialize)]
pub struct SystemReport {
    /// Most recent sample, if the sampler has run.
    pub latest: Option<SystemSample>,
    /// Retained samples, oldest first.
    pub samples: Vec<SystemSample>,
}

/// GET /api/v1/monitoring/metrics
///
/// Request counters, uptime and the number of active sessions.
pub async fn metrics(
    current: CurrentUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    current.require(Requirement::Permission(permissions::SYSTEM_READ))?;

    let active_sessions = SessionRepo::count_active(&state.pool).await?;

    Ok(Json(DataResponse {
        data: MonitoringMetrics {
            requests: state.metrics.snapshot(),
            active_sessions,
        },
    }))
}

/// GET /api/v1/monitoring/system
pub async fn system(
    current: CurrentUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    current.require(Requirement::Permission(permissions::SYSTEM_READ))?;

    let samples = state.metrics.recent_samples();
    Ok(Json(DataResponse {
        data: SystemReport {
            latest: samples.last().cloned(),
            samples,
        },
    }))
}
