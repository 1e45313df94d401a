//! Cached statistics model.

use handcoach_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `statistics_cache` table.
#[derive(Debug, Clone, FromRow)]
pub struct StatisticsCacheEntry {
    pub id: DbId,
    pub user_id: DbId,
    pub cache_key: String,
    pub filters: serde_json::Value,
    pub metrics: serde_json::Value,
    pub computed_at: Timestamp,
    pub valid_until: Timestamp,
}

#[derive(Debug)]
pub struct UpsertStatisticsCache {
    pub user_id: DbId,
    pub cache_key: String,
    pub filters: serde_json::Value,
    pub metrics: serde_json::Value,
    pub valid_until: Timestamp,
}
