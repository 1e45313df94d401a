//! Self-service handlers under `/users/me`: profile, password,
//! preferences and stored provider API keys.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use handcoach_core::crypto::mask_api_key;
use handcoach_core::error::CoreError;
use handcoach_core::roles::{actions, resources};
use handcoach_db::models::user::UserResponse;
use handcoach_db::repositories::UserRepo;
use handcoach_llm::ProviderKind;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::CurrentUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 200))]
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetApiKeyRequest {
    #[validate(length(min = 8, max = 512))]
    pub api_key: String,
}

/// One hosted provider and whether the caller has stored a key for it.
#[derive(Debug, Serialize)]
pub struct ApiKeyInfo {
    pub provider: ProviderKind,
    pub configured: bool,
    /// Masked form of the stored key, only the last characters visible.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// GET /api/v1/users/me
pub async fn get_me(current: CurrentUser) -> AppResult<impl IntoResponse> {
    current.require_own(resources::USERS, actions::READ)?;
    Ok(Json(DataResponse {
        data: UserResponse::from(&current.user),
    }))
}

/// PATCH /api/v1/users/me
///
/// Update the display name. An empty name clears it.
pub async fn update_me(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateProfileRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    current.require_own(resources::USERS, actions::UPDATE)?;

    let full_name = input
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    let user = UserRepo::update_full_name(&state.pool, current.id(), full_name)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: current.id(),
        }))?;

    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// DELETE /api/v1/users/me
///
/// Close the account: it is deactivated, stored keys are scrubbed and all
/// sessions end. Hands and analyses are kept.
pub async fn delete_me(
    current: CurrentUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    current.require_own(resources::USERS, actions::DELETE)?;

    UserRepo::soft_delete(&state.pool, current.id()).await?;
    tracing::info!(user_id = current.id(), "Account closed");

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/users/me/password
pub async fn change_password(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<impl IntoResponse> {
    current.require_own(resources::USERS, actions::UPDATE)?;

    let valid = verify_password(&input.current_password, &current.user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !valid {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Current password is incorrect".into(),
        )));
    }

    validate_password_strength(&input.new_password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    UserRepo::update_password(&state.pool, current.id(), &hash).await?;

    tracing::info!(user_id = current.id(), "Password changed");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// GET /api/v1/users/me/preferences
pub async fn get_preferences(current: CurrentUser) -> AppResult<impl IntoResponse> {
    current.require_own(resources::USERS, actions::READ)?;
    Ok(Json(DataResponse {
        data: current.user.preferences,
    }))
}

/// PUT /api/v1/users/me/preferences
///
/// Shallow merge into the stored object; keys set to `null` are removed.
pub async fn update_preferences(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(patch): Json<serde_json::Value>,
) -> AppResult<impl IntoResponse> {
    current.require_own(resources::USERS, actions::UPDATE)?;

    if !patch.is_object() {
        return Err(AppError::Core(CoreError::Validation(
            "Preferences must be a JSON object".into(),
        )));
    }

    let merged = UserRepo::merge_preferences(&state.pool, current.id(), &patch)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: current.id(),
        }))?;

    Ok(Json(DataResponse { data: merged }))
}

// ---------------------------------------------------------------------------
// Provider API keys
// ---------------------------------------------------------------------------

/// GET /api/v1/users/me/api-keys
///
/// One entry per hosted provider. Keys are never returned in full.
pub async fn list_api_keys(
    current: CurrentUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    current.require_own(resources::USERS, actions::READ)?;

    let keys: Vec<ApiKeyInfo> = ProviderKind::ALL
        .into_iter()
        .filter(|kind| kind.requires_credential())
        .map(|kind| {
            let sealed = current.user.api_keys.0.get(kind.as_str());
            ApiKeyInfo {
                provider: kind,
                configured: sealed.is_some(),
                hint: sealed
                    .and_then(|s| state.cipher.decrypt(s).ok())
                    .map(|key| mask_api_key(&key)),
            }
        })
        .collect();

    Ok(Json(DataResponse { data: keys }))
}

/// PUT /api/v1/users/me/api-keys/{provider}
///
/// Store (or replace) the caller's key for a hosted provider, encrypted.
pub async fn set_api_key(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Json(input): Json<SetApiKeyRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    current.require_own(resources::USERS, actions::UPDATE)?;

    let kind = hosted_provider(&provider)?;
    let key = input.api_key.trim();
    let sealed = state.cipher.encrypt(key)?;
    UserRepo::set_api_key(&state.pool, current.id(), kind.as_str(), &sealed).await?;

    tracing::info!(user_id = current.id(), provider = %kind, "API key stored");

    Ok(Json(DataResponse {
        data: ApiKeyInfo {
            provider: kind,
            configured: true,
            hint: Some(mask_api_key(key)),
        },
    }))
}

/// DELETE /api/v1/users/me/api-keys/{provider}
pub async fn delete_api_key(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> AppResult<impl IntoResponse> {
    current.require_own(resources::USERS, actions::UPDATE)?;

    let kind = hosted_provider(&provider)?;
    if !UserRepo::remove_api_key(&state.pool, current.id(), kind.as_str()).await? {
        return Err(AppError::Core(CoreError::Validation(format!(
            "No API key stored for {kind}"
        ))));
    }

    tracing::info!(user_id = current.id(), provider = %kind, "API key removed");

    Ok(StatusCode::NO_CONTENT)
}

/// Parse a provider name that accepts stored keys.
fn hosted_provider(name: &str) -> AppResult<ProviderKind> {
    let kind = ProviderKind::from_name(name)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown provider: '{name}'")))?;
    if !kind.requires_credential() {
        return Err(AppError::BadRequest(format!(
            "{kind} runs locally and takes no API key"
        )));
    }
    Ok(kind)
}
