//! Handlers for uploading, browsing and re-parsing hand histories.

use axum::extract::{FromRequest, Multipart, Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use handcoach_core::error::CoreError;
use handcoach_core::hand_parser::{parse_file, parse_hand, ParseFailure};
use handcoach_core::roles::{actions, resources};
use handcoach_core::statistics::StatsFilter;
use handcoach_core::types::{DbId, Timestamp};
use handcoach_db::models::hand::{HandFilter, NewPokerHand, PokerHand};
use handcoach_db::repositories::HandRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::CurrentUser;
use crate::query::PaginationParams;
use crate::response::{DataResponse, Page};
use crate::state::AppState;

/// Multipart field carrying the uploaded file.
const UPLOAD_FIELD: &str = "file";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// JSON alternative to a multipart upload.
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub filename: Option<String>,
    pub content: String,
}

/// Outcome of ingesting one file.
#[derive(Debug, Serialize)]
pub struct UploadSummary {
    pub filename: Option<String>,
    /// Hand blocks found in the file.
    pub total_blocks: usize,
    pub imported: usize,
    /// Parsed hands already stored for this user.
    pub already_stored: usize,
    /// Hand ids repeated within the file itself.
    pub duplicates: Vec<String>,
    pub failures: Vec<ParseFailure>,
    pub hand_ids: Vec<DbId>,
}

/// Query parameters for `GET /hands`.
#[derive(Debug, Default, Deserialize)]
pub struct HandListParams {
    pub platform: Option<String>,
    pub stakes: Option<String>,
    pub position: Option<String>,
    pub date_from: Option<Timestamp>,
    pub date_to: Option<Timestamp>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl HandListParams {
    fn filter(&self) -> Result<HandFilter, CoreError> {
        let filter = StatsFilter {
            date_from: self.date_from,
            date_to: self.date_to,
            platform: self.platform.clone(),
            stakes: self.stakes.clone(),
            position: self.position.clone(),
            min_hands: None,
        }
        .normalized()?;
        Ok(HandFilter::from(&filter))
    }

    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            limit: self.limit,
            offset: self.offset,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/hands/upload
///
/// Accepts a multipart form with a `file` field or a JSON body
/// `{ filename, content }`. Malformed blocks are skipped and reported;
/// hands already stored are left untouched.
pub async fn upload(
    current: CurrentUser,
    State(state): State<AppState>,
    request: Request,
) -> AppResult<impl IntoResponse> {
    current.require_own(resources::HANDS, actions::CREATE)?;

    let (filename, content) = read_upload(&state, request).await?;
    if content.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Uploaded file is empty".into(),
        )));
    }

    let report = parse_file(&content);
    if report.hands.is_empty() {
        let reason = report
            .failures
            .first()
            .map(|f| f.reason.clone())
            .unwrap_or_else(|| "no hands found".into());
        return Err(AppError::Core(CoreError::Validation(format!(
            "No hands could be parsed: {reason}"
        ))));
    }

    let new_hands: Vec<NewPokerHand> = report.hands.iter().map(NewPokerHand::from_parsed).collect();
    let hand_ids = HandRepo::insert_many(&state.pool, current.id(), &new_hands).await?;

    tracing::info!(
        user_id = current.id(),
        blocks = report.total_blocks(),
        imported = hand_ids.len(),
        failed = report.failures.len(),
        "Hand history uploaded",
    );

    let summary = UploadSummary {
        filename,
        total_blocks: report.total_blocks(),
        imported: hand_ids.len(),
        already_stored: new_hands.len() - hand_ids.len(),
        duplicates: report.duplicates,
        failures: report.failures,
        hand_ids,
    };

    Ok((StatusCode::CREATED, Json(DataResponse { data: summary })))
}

/// GET /api/v1/hands
///
/// The caller's hands, newest first, with optional filters.
pub async fn list_hands(
    current: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<HandListParams>,
) -> AppResult<impl IntoResponse> {
    current.require_own(resources::HANDS, actions::READ)?;

    let filter = params.filter()?;
    let page = params.pagination();
    let (limit, offset) = (page.limit(), page.offset());

    let items = HandRepo::list(&state.pool, current.id(), &filter, limit, offset).await?;
    let total = HandRepo::count(&state.pool, current.id(), &filter).await?;

    Ok(Json(DataResponse {
        data: Page {
            items,
            total,
            limit,
            offset,
        },
    }))
}

/// GET /api/v1/hands/{id}
pub async fn get_hand(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let hand = find_hand(&state, id).await?;
    current.require_owned(resources::HANDS, actions::READ, hand.user_id)?;

    Ok(Json(DataResponse { data: hand }))
}

/// DELETE /api/v1/hands/{id}
///
/// Removes the hand and its analyses.
pub async fn delete_hand(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let hand = find_hand(&state, id).await?;
    current.require_owned(resources::HANDS, actions::DELETE, hand.user_id)?;

    if !HandRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "PokerHand",
            id,
        }));
    }

    tracing::info!(hand_id = id, user_id = current.id(), "Hand deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/hands/{id}/reparse
///
/// Re-run the parser over the stored raw text and overwrite the derived
/// columns. The natural hand id must not change.
pub async fn reparse_hand(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let hand = find_hand(&state, id).await?;
    current.require_owned(resources::HANDS, actions::UPDATE, hand.user_id)?;

    let parsed = parse_hand(&hand.raw_text).map_err(|e| {
        AppError::Core(CoreError::Validation(format!(
            "Stored hand text no longer parses: {e}"
        )))
    })?;
    if parsed.hand_id != hand.hand_id {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Re-parsed hand id '{}' does not match stored '{}'",
            parsed.hand_id, hand.hand_id
        ))));
    }

    let updated = HandRepo::update_parsed(&state.pool, id, &NewPokerHand::from_parsed(&parsed))
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PokerHand",
            id,
        }))?;

    tracing::info!(hand_id = id, user_id = current.id(), "Hand re-parsed");

    Ok(Json(DataResponse { data: updated }))
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

/// Read `(filename, text)` from either a multipart form or a JSON body.
async fn read_upload(state: &AppState, request: Request) -> AppResult<(Option<String>, String)> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if !is_multipart {
        let Json(body) = Json::<UploadRequest>::from_request(request, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        return Ok((body.filename, body.content));
    }

    let mut multipart = Multipart::from_request(request, state)
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|_| AppError::BadRequest("Uploaded file must be UTF-8 text".into()))?;
        return Ok((filename, text));
    }

    Err(AppError::BadRequest(format!(
        "Multipart upload is missing the '{UPLOAD_FIELD}' field"
    )))
}
