//! Handlers for the `/auth` resource (register, login, refresh, logout, me).
//!
//! A login opens exactly one session row. Refresh rotates the token hash on
//! that same row; logout ends it, which also revokes the access token since
//! [`AuthUser`] checks the session on every request.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use handcoach_core::error::CoreError;
use handcoach_core::roles::{CLAIM_ROLE_SUPERUSER, DEFAULT_ROLE, ROLE_ADMIN};
use handcoach_core::session::{clamp_device_info, validate_timezone, SessionEndReason};
use handcoach_core::types::DbId;
use handcoach_db::models::session::CreateSession;
use handcoach_db::models::user::{CreateUser, User, UserResponse};
use handcoach_db::repositories::{SessionRepo, UserRepo, UserRoleRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rate_limit::ClientIp;
use crate::middleware::rbac::CurrentUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Maximum consecutive failed login attempts before locking the account.
const MAX_FAILED_ATTEMPTS: i32 = 5;

/// Duration in minutes to lock an account after exceeding failed attempts.
const LOCK_DURATION_MINS: i64 = 15;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    pub password: String,
    #[validate(length(max = 200))]
    pub full_name: Option<String>,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 320))]
    pub email: String,
    pub password: String,
    pub timezone: Option<String>,
    pub device_info: Option<String>,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Successful authentication response returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub session_id: DbId,
    pub user: UserInfo,
}

/// Public user info embedded in [`AuthResponse`] and returned by `/me`.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    #[serde(flatten)]
    pub user: UserResponse,
    pub role: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Create an account with the default role. Does not log in.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let email = input.email.trim().to_string();
    if UserRepo::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Core(CoreError::Conflict(
            "An account with this email already exists".into(),
        )));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create_with_role(
        &state.pool,
        &CreateUser {
            email,
            password_hash,
            full_name: input
                .full_name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
        },
        DEFAULT_ROLE,
    )
    .await?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UserResponse::from(&user),
        }),
    ))
}

/// POST /api/v1/auth/login
///
/// Authenticate with email + password and open a session.
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip_address): ClientIp,
    Json(input): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let timezone = input
        .timezone
        .as_deref()
        .map(validate_timezone)
        .transpose()?;

    // 1. Find user by email.
    let user = UserRepo::find_by_email(&state.pool, input.email.trim())
        .await?
        .filter(|u| u.deleted_at.is_none())
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized(INVALID_CREDENTIALS.into())))?;

    // 2. Check if the account is active.
    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    // 3. Check if the account is temporarily locked.
    if let Some(locked_until) = user.locked_until {
        if locked_until > Utc::now() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Account is temporarily locked. Try again later.".into(),
            )));
        }
    }

    // 4. Verify password.
    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        let failures = UserRepo::increment_failed_login(&state.pool, user.id).await?;
        if failures >= MAX_FAILED_ATTEMPTS {
            let lock_until = Utc::now() + chrono::Duration::minutes(LOCK_DURATION_MINS);
            UserRepo::lock_account(&state.pool, user.id, lock_until).await?;
            tracing::warn!(user_id = user.id, failures, "Account locked after failed logins");
        }
        return Err(AppError::Core(CoreError::Unauthorized(
            INVALID_CREDENTIALS.into(),
        )));
    }

    // 5. Reset the failure counter and open the session.
    UserRepo::record_successful_login(&state.pool, user.id).await?;

    let (refresh_plaintext, refresh_hash) = generate_refresh_token();
    let session = SessionRepo::create(
        &state.pool,
        &CreateSession {
            user_id: user.id,
            refresh_token_hash: refresh_hash,
            timezone,
            device_info: input
                .device_info
                .as_deref()
                .map(clamp_device_info)
                .filter(|d| !d.is_empty()),
            ip_address,
            expires_at: refresh_expiry(&state),
        },
    )
    .await?;

    tracing::info!(user_id = user.id, session_id = session.id, "User logged in");

    let response = auth_response(&state, &user, session.id, refresh_plaintext).await?;
    Ok(Json(DataResponse { data: response }))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a refresh token for new tokens. The session row is kept and
/// its token hash rotated, so the old refresh token stops working.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<impl IntoResponse> {
    let invalid = || {
        AppError::Core(CoreError::Unauthorized(
            "Invalid or expired refresh token".into(),
        ))
    };

    let token_hash = hash_refresh_token(&input.refresh_token);
    let session = SessionRepo::find_by_refresh_token_hash(&state.pool, &token_hash)
        .await?
        .ok_or_else(invalid)?;

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .filter(|u| u.deleted_at.is_none())
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    let (refresh_plaintext, refresh_hash) = generate_refresh_token();
    let session = SessionRepo::rotate_refresh_token(
        &state.pool,
        session.id,
        &refresh_hash,
        refresh_expiry(&state),
    )
    .await?
    .ok_or_else(invalid)?;

    let response = auth_response(&state, &user, session.id, refresh_plaintext).await?;
    Ok(Json(DataResponse { data: response }))
}

/// POST /api/v1/auth/logout
///
/// End the caller's current session. Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> AppResult<StatusCode> {
    SessionRepo::end(
        &state.pool,
        auth.session_id,
        SessionEndReason::Logout.as_str(),
    )
    .await?;
    tracing::info!(user_id = auth.user_id, session_id = auth.session_id, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
pub async fn me(current: CurrentUser) -> AppResult<impl IntoResponse> {
    Ok(Json(DataResponse {
        data: UserInfo {
            user: UserResponse::from(&current.user),
            role: current.auth.role,
        },
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn refresh_expiry(state: &AppState) -> chrono::DateTime<Utc> {
    Utc::now() + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days)
}

/// Role name carried in the access token: the account flag when set, else
/// the first assigned role.
async fn display_role(state: &AppState, user: &User) -> AppResult<String> {
    if user.is_superuser {
        return Ok(CLAIM_ROLE_SUPERUSER.to_string());
    }
    if user.is_admin {
        return Ok(ROLE_ADMIN.to_string());
    }
    let now = Utc::now();
    let assignments = UserRoleRepo::list_for_user(&state.pool, user.id).await?;
    Ok(assignments
        .into_iter()
        .find(|a| a.expires_at.map_or(true, |at| at > now))
        .map(|a| a.role_name)
        .unwrap_or_else(|| DEFAULT_ROLE.to_string()))
}

async fn auth_response(
    state: &AppState,
    user: &User,
    session_id: DbId,
    refresh_token: String,
) -> AppResult<AuthResponse> {
    let role = display_role(state, user).await?;
    let access_token = generate_access_token(user.id, session_id, &role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    Ok(AuthResponse {
        access_token,
        refresh_token,
        token_type: "Bearer",
        expires_in: state.config.jwt.access_token_expiry_mins * 60,
        session_id,
        user: UserInfo {
            user: UserResponse::from(user),
            role,
        },
    })
}
