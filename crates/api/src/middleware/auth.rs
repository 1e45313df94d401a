//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use handcoach_core::error::CoreError;
use handcoach_core::types::DbId;
use handcoach_db::repositories::SessionRepo;

use crate::auth::jwt::validate_token;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Authenticated caller extracted from the `Authorization: Bearer` header.
///
/// The token must be valid and its session still active, so a logout or
/// an ended session revokes outstanding access tokens immediately.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    pub session_id: DbId,
    pub role: String,
}

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.into()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("Invalid Authorization format. Expected: Bearer <token>"))?;

        let claims = validate_token(token, &state.config.jwt)
            .map_err(|_| unauthorized("Invalid or expired token"))?;

        ensure_live_session(state, claims.sub, claims.sid).await?;

        Ok(AuthUser {
            user_id: claims.sub,
            session_id: claims.sid,
            role: claims.role,
        })
    }
}

async fn ensure_live_session(state: &AppState, user_id: DbId, session_id: DbId) -> AppResult<()> {
    let session = SessionRepo::find_by_id(&state.pool, session_id).await?;
    match session {
        Some(s) if s.is_active && s.user_id == user_id => Ok(()),
        _ => Err(unauthorized("Session has ended")),
    }
}
