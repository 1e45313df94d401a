//! Repository for the `analysis_results` table.

use handcoach_core::types::DbId;
use sqlx::PgPool;

use crate::models::analysis::{AnalysisResult, CreateAnalysisResult};

const COLUMNS: &str = "id, hand_id, user_id, provider, model, focus, content, \
                        prompt_tokens, completion_tokens, total_tokens, created_at";

/// Append-only store of AI analyses.
pub struct AnalysisRepo;

impl AnalysisRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateAnalysisResult,
    ) -> Result<AnalysisResult, sqlx::Error> {
        let query = format!(
            "INSERT INTO analysis_results
                (hand_id, user_id, provider, model, focus, content,
                 prompt_tokens, completion_tokens, total_tokens)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AnalysisResult>(&query)
            .bind(input.hand_id)
            .bind(input.user_id)
            .bind(&input.provider)
            .bind(&input.model)
            .bind(&input.focus)
            .bind(&input.content)
            .bind(input.prompt_tokens)
            .bind(input.completion_tokens)
            .bind(input.total_tokens)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<AnalysisResult>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM analysis_results WHERE id = $1");
        sqlx::query_as::<_, AnalysisResult>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All analyses of a hand, newest first.
    pub async fn list_for_hand(
        pool: &PgPool,
        hand_id: DbId,
    ) -> Result<Vec<AnalysisResult>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM analysis_results
             WHERE hand_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, AnalysisResult>(&query)
            .bind(hand_id)
            .fetch_all(pool)
            .await
    }
}
