//! Repository for the `statistics_cache` table.

use handcoach_core::types::DbId;
use sqlx::PgPool;

use crate::models::statistics_cache::{StatisticsCacheEntry, UpsertStatisticsCache};

const COLUMNS: &str = "id, user_id, cache_key, filters, metrics, computed_at, valid_until";

const INVALIDATE_USER: &str = "DELETE FROM statistics_cache WHERE user_id = $1";

/// Per-user cache of computed statistics payloads.
pub struct StatisticsCacheRepo;

impl StatisticsCacheRepo {
    /// Find an entry that has not yet expired.
    pub async fn find_valid(
        pool: &PgPool,
        user_id: DbId,
        cache_key: &str,
    ) -> Result<Option<StatisticsCacheEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM statistics_cache
             WHERE user_id = $1 AND cache_key = $2 AND valid_until > NOW()"
        );
        sqlx::query_as::<_, StatisticsCacheEntry>(&query)
            .bind(user_id)
            .bind(cache_key)
            .fetch_optional(pool)
            .await
    }

    /// Insert or refresh an entry.
    pub async fn upsert(
        pool: &PgPool,
        input: &UpsertStatisticsCache,
    ) -> Result<StatisticsCacheEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO statistics_cache (user_id, cache_key, filters, metrics, valid_until)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (user_id, cache_key) DO UPDATE SET
                filters = EXCLUDED.filters,
                metrics = EXCLUDED.metrics,
                computed_at = NOW(),
                valid_until = EXCLUDED.valid_until
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StatisticsCacheEntry>(&query)
            .bind(input.user_id)
            .bind(&input.cache_key)
            .bind(&input.filters)
            .bind(&input.metrics)
            .bind(input.valid_until)
            .fetch_one(pool)
            .await
    }

    /// Drop every cached entry of a user. Returns the number removed.
    pub async fn invalidate_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(INVALIDATE_USER)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Drop a user's entries within an existing transaction, so writes to
    /// their hands and the invalidation commit together.
    pub(crate) async fn invalidate_user_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(INVALIDATE_USER)
            .bind(user_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected())
    }
}
