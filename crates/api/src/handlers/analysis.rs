//! Handlers for AI hand analysis and provider management.
//!
//! Analysis calls are synchronous: the request waits for the provider,
//! bounded by the provider's generation timeout, and the result is stored
//! before it is returned.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use handcoach_core::error::CoreError;
use handcoach_core::roles::{actions, resources};
use handcoach_core::types::DbId;
use handcoach_db::models::analysis::CreateAnalysisResult;
use handcoach_db::models::hand::PokerHand;
use handcoach_db::models::user::User;
use handcoach_db::repositories::{AnalysisRepo, HandRepo};
use handcoach_llm::credentials::resolve_credential;
use handcoach_llm::installer::install_ollama;
use handcoach_llm::prompt::{build_hand_prompt, AnalysisFocus, HandContext};
use handcoach_llm::{AnalysisRequest, ProviderKind, StatusReport};
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{CurrentUser, RequireAdmin};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /analysis/hands/{id}`. Every field is optional.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct AnalyzeHandRequest {
    pub provider: Option<ProviderKind>,
    #[validate(length(min = 1, max = 100))]
    pub model: Option<String>,
    pub focus: Option<AnalysisFocus>,
    /// One-off key that takes precedence over the stored one.
    pub api_key: Option<String>,
}

/// Request body for `POST /analysis/providers/ollama/pull`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PullModelRequest {
    #[validate(length(min = 1, max = 100))]
    pub model: Option<String>,
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// POST /api/v1/analysis/hands/{id}
///
/// Ask a provider to coach the hand and persist the answer.
pub async fn analyze_hand(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(hand_id): Path<DbId>,
    Json(input): Json<AnalyzeHandRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    current.require_own(resources::ANALYSIS, actions::CREATE)?;

    let hand = find_hand(&state, hand_id).await?;
    current.require_owned(resources::HANDS, actions::READ, hand.user_id)?;

    let kind = input.provider.unwrap_or(state.config.ai.default_provider);
    let focus = input.focus.unwrap_or_default();
    let stored_key = stored_api_key(&state, &current.user, kind);
    let api_key = resolve_credential(
        kind,
        input.api_key.as_deref(),
        stored_key.as_deref(),
        &state.config.ai,
    )?;

    let prompt = build_hand_prompt(&hand_context(&hand), focus);
    let provider = state.providers.get(kind);
    let output = provider
        .analyze(&AnalysisRequest {
            prompt,
            model: input.model,
            api_key,
        })
        .await?;

    let result = AnalysisRepo::create(
        &state.pool,
        &CreateAnalysisResult {
            hand_id: hand.id,
            user_id: current.id(),
            provider: output.provider.as_str().to_string(),
            model: output.model,
            focus: focus.as_str().to_string(),
            content: output.content,
            prompt_tokens: output.usage.prompt_tokens.map(to_i32),
            completion_tokens: output.usage.completion_tokens.map(to_i32),
            total_tokens: output.usage.total_tokens.map(to_i32),
        },
    )
    .await?;

    tracing::info!(
        hand_id = hand.id,
        user_id = current.id(),
        provider = %kind,
        analysis_id = result.id,
        "Hand analyzed",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: result })))
}

/// GET /api/v1/analysis/hands/{id}
///
/// Every stored analysis of a hand, newest first.
pub async fn list_for_hand(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(hand_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let hand = find_hand(&state, hand_id).await?;
    current.require_owned(resources::ANALYSIS, actions::READ, hand.user_id)?;

    let results = AnalysisRepo::list_for_hand(&state.pool, hand.id).await?;
    Ok(Json(DataResponse { data: results }))
}

/// GET /api/v1/analysis/{id}
pub async fn get_analysis(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let result = AnalysisRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "AnalysisResult",
            id,
        }))?;
    current.require_owned(resources::ANALYSIS, actions::READ, result.user_id)?;

    Ok(Json(DataResponse { data: result }))
}

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// GET /api/v1/analysis/providers
///
/// Status of every provider as seen by the caller (their stored keys
/// count as credentials). Probes run concurrently.
pub async fn list_providers(
    current: CurrentUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    current.require_own(resources::ANALYSIS, actions::READ)?;

    let [ollama, gemini, groq] = ProviderKind::ALL;
    let (a, b, c) = tokio::join!(
        provider_status(&state, &current.user, ollama),
        provider_status(&state, &current.user, gemini),
        provider_status(&state, &current.user, groq),
    );

    Ok(Json(DataResponse {
        data: vec![a, b, c],
    }))
}

/// GET /api/v1/analysis/providers/{provider}/status
pub async fn provider_status_handler(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> AppResult<impl IntoResponse> {
    current.require_own(resources::ANALYSIS, actions::READ)?;

    let kind = parse_provider(&provider)?;
    let report = provider_status(&state, &current.user, kind).await;
    Ok(Json(DataResponse { data: report }))
}

/// POST /api/v1/analysis/providers/ollama/install
///
/// Install the local daemon on the server host. Admin only. On systems
/// without a supported installer the response carries manual instructions.
pub async fn install_ollama_handler(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    tracing::info!(user_id = admin.id(), "Ollama install requested");

    let outcome = install_ollama(state.config.ai.timeouts.install).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /api/v1/analysis/providers/ollama/pull
///
/// Download a model into the local daemon. Admin only.
pub async fn pull_ollama_model(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<PullModelRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    tracing::info!(user_id = admin.id(), model = ?input.model, "Ollama model pull requested");

    let response = state.providers.ollama.pull_model(input.model.as_deref()).await?;
    Ok(Json(DataResponse { data: response }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_hand(state: &AppState, id: DbId) -> AppResult<PokerHand> {
    HandRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PokerHand",
            id,
        }))
}

fn parse_provider(name: &str) -> AppResult<ProviderKind> {
    ProviderKind::from_name(name)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown provider: '{name}'")))
}

/// The user's stored key for `kind`, decrypted. A key that no longer
/// decrypts (rotated secret) is treated as absent.
fn stored_api_key(state: &AppState, user: &User, kind: ProviderKind) -> Option<String> {
    let sealed = user.api_keys.0.get(kind.as_str())?;
    match state.cipher.decrypt(sealed) {
        Ok(key) => Some(key),
        Err(e) => {
            tracing::warn!(user_id = user.id, provider = %kind, error = %e, "Stored API key does not decrypt");
            None
        }
    }
}

async fn provider_status(state: &AppState, user: &User, kind: ProviderKind) -> StatusReport {
    let stored_key = stored_api_key(state, user, kind);
    let api_key = resolve_credential(kind, None, stored_key.as_deref(), &state.config.ai)
        .ok()
        .flatten();
    state.providers.get(kind).status(api_key.as_deref()).await
}

fn hand_context(hand: &PokerHand) -> HandContext {
    HandContext {
        game_type: hand.game_type.clone(),
        stakes: hand.stakes.clone(),
        hero: hand.hero_name.clone(),
        position: hand.position.clone(),
        hole_cards: hand.hole_cards.clone(),
        board: hand.board_cards.clone(),
        actions: hand.actions.0.clone(),
        result: hand.result.clone(),
        pot_size: hand.pot_size,
        net_profit: hand.net_profit,
    }
}

fn to_i32(count: u32) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}
