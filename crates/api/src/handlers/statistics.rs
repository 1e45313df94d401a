//! Handlers for the `/statistics` resource.
//!
//! Metrics are computed in memory from the filtered stats columns of the
//! caller's hands. Summary and filtered results go through the per-user
//! `statistics_cache`, which hand ingestion, re-parse and deletion clear.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use handcoach_core::roles::{actions, resources};
use handcoach_core::statistics::{
    apply_min_hands, calculate_basic_statistics, calculate_positional_statistics,
    calculate_trends, compare_statistics, statistics_to_csv, BasicStatistics, HandSample,
    PositionStatistics, StatisticsComparison, StatsFilter, TrendPeriod, TrendPoint,
    POSITION_MIN_HANDS,
};
use handcoach_core::types::{DbId, Timestamp};
use handcoach_db::models::hand::HandFilter;
use handcoach_db::models::statistics_cache::UpsertStatisticsCache;
use handcoach_db::repositories::{HandRepo, StatisticsCacheRepo};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::CurrentUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub filters: StatsFilter,
    pub stats: BasicStatistics,
    /// `true` when served from the statistics cache.
    pub cached: bool,
}

#[derive(Debug, Serialize)]
pub struct PositionsResponse {
    pub filters: StatsFilter,
    /// Minimum hands a position needed to be reported.
    pub min_hands: u64,
    pub positions: Vec<PositionStatistics>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrendParams {
    pub period: Option<TrendPeriod>,
}

#[derive(Debug, Serialize)]
pub struct TrendsResponse {
    pub period: TrendPeriod,
    pub filters: StatsFilter,
    pub points: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    #[default]
    Json,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    pub format: Option<ExportFormat>,
}

/// Body of a JSON export.
#[derive(Debug, Serialize)]
pub struct StatisticsExport {
    pub generated_at: Timestamp,
    pub filters: StatsFilter,
    pub summary: BasicStatistics,
    pub positions: Vec<PositionStatistics>,
}

/// The two date ranges of `GET /statistics/compare`. Other filters apply
/// to both sides.
#[derive(Debug, Default, Deserialize)]
pub struct CompareParams {
    pub a_from: Option<Timestamp>,
    pub a_to: Option<Timestamp>,
    pub b_from: Option<Timestamp>,
    pub b_to: Option<Timestamp>,
}

#[derive(Debug, Serialize)]
pub struct ComparisonResponse {
    pub a_filters: StatsFilter,
    pub b_filters: StatsFilter,
    #[serde(flatten)]
    pub comparison: StatisticsComparison,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/statistics/summary
///
/// Metrics over every hand of the caller.
pub async fn summary(
    current: CurrentUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    current.require_own(resources::STATISTICS, actions::READ)?;

    let filter = StatsFilter::default();
    let (stats, cached) = cached_summary(&state, current.id(), &filter, "summary").await?;

    Ok(Json(DataResponse {
        data: StatisticsResponse {
            filters: filter,
            stats,
            cached,
        },
    }))
}

/// GET /api/v1/statistics/filtered
///
/// Metrics over the hands matching the query filter set.
pub async fn filtered(
    current: CurrentUser,
    State(state): State<AppState>,
    Query(filter): Query<StatsFilter>,
) -> AppResult<impl IntoResponse> {
    current.require_own(resources::STATISTICS, actions::READ)?;

    let filter = filter.normalized()?;
    let (stats, cached) = cached_summary(&state, current.id(), &filter, "filtered").await?;

    Ok(Json(DataResponse {
        data: StatisticsResponse {
            filters: filter,
            stats,
            cached,
        },
    }))
}

/// GET /api/v1/statistics/positions
pub async fn positions(
    current: CurrentUser,
    State(state): State<AppState>,
    Query(filter): Query<StatsFilter>,
) -> AppResult<impl IntoResponse> {
    current.require_own(resources::STATISTICS, actions::READ)?;

    let filter = filter.normalized()?;
    let min_hands = filter.min_hands.unwrap_or(0).max(POSITION_MIN_HANDS);
    let samples = load_samples(&state, current.id(), &filter).await?;
    let positions = calculate_positional_statistics(&samples, min_hands);

    Ok(Json(DataResponse {
        data: PositionsResponse {
            filters: filter,
            min_hands,
            positions,
        },
    }))
}

/// GET /api/v1/statistics/trends?period=day|week|month
pub async fn trends(
    current: CurrentUser,
    State(state): State<AppState>,
    Query(filter): Query<StatsFilter>,
    Query(params): Query<TrendParams>,
) -> AppResult<impl IntoResponse> {
    current.require_own(resources::STATISTICS, actions::READ)?;

    let filter = filter.normalized()?;
    let period = params.period.unwrap_or_default();
    let samples = load_samples(&state, current.id(), &filter).await?;
    let mut points = calculate_trends(&samples, period);
    if let Some(min_hands) = filter.min_hands {
        for point in &mut points {
            point.stats = apply_min_hands(point.stats.clone(), min_hands);
        }
    }

    Ok(Json(DataResponse {
        data: TrendsResponse {
            period,
            filters: filter,
            points,
        },
    }))
}

/// GET /api/v1/statistics/export?format=csv|json
///
/// Summary plus positional rows as a downloadable attachment.
pub async fn export(
    current: CurrentUser,
    State(state): State<AppState>,
    Query(filter): Query<StatsFilter>,
    Query(params): Query<ExportParams>,
) -> AppResult<Response> {
    current.require_own(resources::STATISTICS, actions::READ)?;

    let filter = filter.normalized()?;
    let samples = load_samples(&state, current.id(), &filter).await?;
    let summary = with_min_hands(calculate_basic_statistics(&samples), &filter);
    let positions = calculate_positional_statistics(
        &samples,
        filter.min_hands.unwrap_or(0).max(POSITION_MIN_HANDS),
    );

    tracing::info!(user_id = current.id(), hands = samples.len(), "Statistics exported");

    let response = match params.format.unwrap_or_default() {
        ExportFormat::Csv => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"statistics.csv\"",
                ),
            ],
            statistics_to_csv(&summary, &positions),
        )
            .into_response(),
        ExportFormat::Json => (
            [(
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"statistics.json\"",
            )],
            Json(StatisticsExport {
                generated_at: Utc::now(),
                filters: filter,
                summary,
                positions,
            }),
        )
            .into_response(),
    };
    Ok(response)
}

/// GET /api/v1/statistics/compare?a_from=&a_to=&b_from=&b_to=
///
/// Metrics for two date ranges and their deltas (`b - a`).
pub async fn compare(
    current: CurrentUser,
    State(state): State<AppState>,
    Query(base): Query<StatsFilter>,
    Query(params): Query<CompareParams>,
) -> AppResult<impl IntoResponse> {
    current.require_own(resources::STATISTICS, actions::READ)?;

    let a_filters = StatsFilter {
        date_from: params.a_from,
        date_to: params.a_to,
        ..base.clone()
    }
    .normalized()?;
    let b_filters = StatsFilter {
        date_from: params.b_from,
        date_to: params.b_to,
        ..base
    }
    .normalized()?;

    let a_samples = load_samples(&state, current.id(), &a_filters).await?;
    let b_samples = load_samples(&state, current.id(), &b_filters).await?;
    let comparison = compare_statistics(
        with_min_hands(calculate_basic_statistics(&a_samples), &a_filters),
        with_min_hands(calculate_basic_statistics(&b_samples), &b_filters),
    );

    Ok(Json(DataResponse {
        data: ComparisonResponse {
            a_filters,
            b_filters,
            comparison,
        },
    }))
}

/// DELETE /api/v1/statistics/cache
pub async fn clear_cache(
    current: CurrentUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    current.require_own(resources::STATISTICS, actions::DELETE)?;

    let invalidated = StatisticsCacheRepo::invalidate_user(&state.pool, current.id()).await?;
    tracing::info!(user_id = current.id(), invalidated, "Statistics cache cleared");

    Ok(Json(DataResponse {
        data: json!({ "invalidated": invalidated }),
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load_samples(
    state: &AppState,
    user_id: DbId,
    filter: &StatsFilter,
) -> AppResult<Vec<HandSample>> {
    let rows = HandRepo::list_stats_rows(&state.pool, user_id, &HandFilter::from(filter)).await?;
    Ok(rows.into_iter().map(HandSample::from).collect())
}

fn with_min_hands(stats: BasicStatistics, filter: &StatsFilter) -> BasicStatistics {
    match filter.min_hands {
        Some(min_hands) => apply_min_hands(stats, min_hands),
        None => stats,
    }
}

/// Basic statistics for `filter`, read through the cache. Returns the
/// metrics and whether they came from the cache. A TTL of zero disables
/// caching.
async fn cached_summary(
    state: &AppState,
    user_id: DbId,
    filter: &StatsFilter,
    scope: &str,
) -> AppResult<(BasicStatistics, bool)> {
    let ttl = state.config.stats_cache_ttl_secs;
    let cache_key = filter.cache_key(scope);

    if ttl > 0 {
        if let Some(entry) = StatisticsCacheRepo::find_valid(&state.pool, user_id, &cache_key).await?
        {
            match serde_json::from_value::<BasicStatistics>(entry.metrics) {
                Ok(stats) => return Ok((stats, true)),
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "Discarding undecodable statistics cache entry");
                }
            }
        }
    }

    let samples = load_samples(state, user_id, filter).await?;
    let stats = with_min_hands(calculate_basic_statistics(&samples), filter);

    if ttl > 0 {
        let to_json = |e: serde_json::Error| AppError::InternalError(format!("Cache encode: {e}"));
        StatisticsCacheRepo::upsert(
            &state.pool,
            &UpsertStatisticsCache {
                user_id,
                cache_key,
                filters: serde_json::to_value(filter).map_err(to_json)?,
                metrics: serde_json::to_value(&stats).map_err(to_json)?,
                valid_until: Utc::now() + chrono::Duration::seconds(ttl),
            },
        )
        .await?;
    }

    Ok((stats, false))
}
