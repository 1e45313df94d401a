//! AI analysis result model.

use handcoach_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `analysis_results` table. Append-only.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AnalysisResult {
    pub id: DbId,
    pub hand_id: DbId,
    pub user_id: DbId,
    pub provider: String,
    pub model: String,
    pub focus: String,
    pub content: String,
    pub prompt_tokens: Option<i32>,
    pub completion_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
    pub created_at: Timestamp,
}

#[derive(Debug)]
pub struct CreateAnalysisResult {
    pub hand_id: DbId,
    pub user_id: DbId,
    pub provider: String,
    pub model: String,
    pub focus: String,
    pub content: String,
    pub prompt_tokens: Option<i32>,
    pub completion_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}
