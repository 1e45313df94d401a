//! Handlers for the `/sessions` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use handcoach_core::error::CoreError;
use handcoach_core::roles::{actions, permissions, resources};
use handcoach_core::rbac::Requirement;
use handcoach_core::session::{validate_timezone, SessionEndReason};
use handcoach_core::types::DbId;
use handcoach_db::models::session::UserSession;
use handcoach_db::repositories::SessionRepo;
use serde::Deserialize;
use serde_json::json;

use crate::background::session_sweeper;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::CurrentUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /sessions/current/activity`.
#[derive(Debug, Default, Deserialize)]
pub struct ActivityRequest {
    pub timezone: Option<String>,
}

/// GET /api/v1/sessions
///
/// The caller's sessions, newest first, including ended ones.
pub async fn list_sessions(
    current: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    current.require_own(resources::SESSIONS, actions::READ)?;

    let sessions =
        SessionRepo::list_for_user(&state.pool, current.id(), params.limit(), params.offset())
            .await?;
    Ok(Json(DataResponse { data: sessions }))
}

/// GET /api/v1/sessions/current
pub async fn current_session(
    current: CurrentUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    current.require_own(resources::SESSIONS, actions::READ)?;

    let session = find_session(&state, current.auth.session_id).await?;
    Ok(Json(DataResponse { data: session }))
}

/// POST /api/v1/sessions/current/activity
///
/// Activity ping. Bumps `last_activity_at` and optionally records the
/// client's timezone.
pub async fn record_activity(
    current: CurrentUser,
    State(state): State<AppState>,
    body: Option<Json<ActivityRequest>>,
) -> AppResult<impl IntoResponse> {
    current.require_own(resources::SESSIONS, actions::UPDATE)?;

    let timezone = body
        .and_then(|Json(b)| b.timezone)
        .as_deref()
        .map(validate_timezone)
        .transpose()?;

    let session = SessionRepo::touch(&state.pool, current.auth.session_id, timezone.as_deref())
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Session has ended".into())))?;

    Ok(Json(DataResponse { data: session }))
}

/// DELETE /api/v1/sessions/{id}
///
/// End a session. Users may end their own; admins may end anyone's.
pub async fn end_session(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let session = find_session(&state, id).await?;
    current.require_owned(resources::SESSIONS, actions::DELETE, session.user_id)?;

    if !SessionRepo::end(&state.pool, id, SessionEndReason::Ended.as_str()).await? {
        return Err(AppError::Core(CoreError::Conflict(
            "Session has already ended".into(),
        )));
    }

    tracing::info!(session_id = id, user_id = current.id(), "Session ended");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/cleanup
///
/// End every session idle past the configured timeout. Returns the count.
pub async fn cleanup_sessions(
    current: CurrentUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    current.require(Requirement::Permission(permissions::SESSIONS_MANAGE))?;

    let timeout = chrono::Duration::minutes(state.config.session_timeout_mins);
    let ended = session_sweeper::sweep_once(&state.pool, timeout).await?;

    tracing::info!(ended, user_id = current.id(), "Manual session cleanup");

    Ok(Json(DataResponse {
        data: json!({ "ended": ended }),
    }))
}

async fn find_session(state: &AppState, id: DbId) -> AppResult<UserSession> {
    SessionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Session",
            id,
        }))
}
