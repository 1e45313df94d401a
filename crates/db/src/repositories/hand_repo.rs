//! Repository for the `poker_hands` table.

use handcoach_core::types::DbId;
use sqlx::PgPool;

use crate::models::hand::{HandFilter, HandStatsRow, NewPokerHand, PokerHand};
use crate::repositories::StatisticsCacheRepo;

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

const COLUMNS: &str = "\
    id, user_id, hand_id, platform, game_type, stakes, small_blind, big_blind, \
    table_name, hero_name, position, hole_cards, board_cards, actions, result, \
    pot_size, net_profit, is_vpip, is_pfr, aggressive_actions, passive_actions, \
    raw_text, played_at, created_at, updated_at";

const STATS_COLUMNS: &str = "\
    position, played_at, is_vpip, is_pfr, aggressive_actions, passive_actions, \
    net_profit, big_blind, result";

/// Owner plus optional filters; parameters `$1..$6`.
const FILTER_CLAUSE: &str = "\
    user_id = $1 \
    AND ($2::TEXT IS NULL OR platform = $2) \
    AND ($3::TEXT IS NULL OR stakes = $3) \
    AND ($4::TEXT IS NULL OR position = $4) \
    AND ($5::TIMESTAMPTZ IS NULL OR played_at >= $5) \
    AND ($6::TIMESTAMPTZ IS NULL OR played_at <= $6)";

// ---------------------------------------------------------------------------
// HandRepo
// ---------------------------------------------------------------------------

/// Provides storage and filtered queries for parsed hands.
pub struct HandRepo;

impl HandRepo {
    /// Insert hands for `user_id` in one transaction.
    ///
    /// Hands whose `(user_id, hand_id)` already exists are skipped. When any
    /// row is inserted the user's statistics cache is cleared in the same
    /// transaction. Returns the ids of the rows actually inserted.
    pub async fn insert_many(
        pool: &PgPool,
        user_id: DbId,
        hands: &[NewPokerHand],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut inserted = Vec::with_capacity(hands.len());

        let query = "INSERT INTO poker_hands (
                user_id, hand_id, platform, game_type, stakes, small_blind, big_blind,
                table_name, hero_name, position, hole_cards, board_cards, actions, result,
                pot_size, net_profit, is_vpip, is_pfr, aggressive_actions, passive_actions,
                raw_text, played_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                     $15, $16, $17, $18, $19, $20, $21, $22)
             ON CONFLICT (user_id, hand_id) DO NOTHING
             RETURNING id";

        for hand in hands {
            let id = sqlx::query_scalar::<_, DbId>(query)
                .bind(user_id)
                .bind(&hand.hand_id)
                .bind(&hand.platform)
                .bind(&hand.game_type)
                .bind(&hand.stakes)
                .bind(hand.small_blind)
                .bind(hand.big_blind)
                .bind(&hand.table_name)
                .bind(&hand.hero_name)
                .bind(&hand.position)
                .bind(&hand.hole_cards)
                .bind(&hand.board_cards)
                .bind(&hand.actions)
                .bind(&hand.result)
                .bind(hand.pot_size)
                .bind(hand.net_profit)
                .bind(hand.is_vpip)
                .bind(hand.is_pfr)
                .bind(hand.aggressive_actions)
                .bind(hand.passive_actions)
                .bind(&hand.raw_text)
                .bind(hand.played_at)
                .fetch_optional(&mut *tx)
                .await?;
            inserted.extend(id);
        }

        if !inserted.is_empty() {
            StatisticsCacheRepo::invalidate_user_inner(&mut tx, user_id).await?;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PokerHand>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM poker_hands WHERE id = $1");
        sqlx::query_as::<_, PokerHand>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's hands, most recently played first.
    pub async fn list(
        pool: &PgPool,
        user_id: DbId,
        filter: &HandFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PokerHand>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM poker_hands WHERE {FILTER_CLAUSE}
             ORDER BY played_at DESC NULLS LAST, id DESC
             LIMIT $7 OFFSET $8"
        );
        sqlx::query_as::<_, PokerHand>(&query)
            .bind(user_id)
            .bind(&filter.platform)
            .bind(&filter.stakes)
            .bind(&filter.position)
            .bind(filter.date_from)
            .bind(filter.date_to)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count a user's hands matching `filter` (for pagination metadata).
    pub async fn count(
        pool: &PgPool,
        user_id: DbId,
        filter: &HandFilter,
    ) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM poker_hands WHERE {FILTER_CLAUSE}");
        sqlx::query_scalar::<_, i64>(&query)
            .bind(user_id)
            .bind(&filter.platform)
            .bind(&filter.stakes)
            .bind(&filter.position)
            .bind(filter.date_from)
            .bind(filter.date_to)
            .fetch_one(pool)
            .await
    }

    /// Fetch the statistics columns of every matching hand.
    pub async fn list_stats_rows(
        pool: &PgPool,
        user_id: DbId,
        filter: &HandFilter,
    ) -> Result<Vec<HandStatsRow>, sqlx::Error> {
        let query = format!(
            "SELECT {STATS_COLUMNS} FROM poker_hands WHERE {FILTER_CLAUSE}
             ORDER BY played_at ASC NULLS LAST"
        );
        sqlx::query_as::<_, HandStatsRow>(&query)
            .bind(user_id)
            .bind(&filter.platform)
            .bind(&filter.stakes)
            .bind(&filter.position)
            .bind(filter.date_from)
            .bind(filter.date_to)
            .fetch_all(pool)
            .await
    }

    /// Overwrite the parsed fields of an existing hand and clear the
    /// owner's statistics cache. `hand_id` and `raw_text` are left unchanged.
    pub async fn update_parsed(
        pool: &PgPool,
        id: DbId,
        hand: &NewPokerHand,
    ) -> Result<Option<PokerHand>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE poker_hands SET
                platform = $2, game_type = $3, stakes = $4, small_blind = $5,
                big_blind = $6, table_name = $7, hero_name = $8, position = $9,
                hole_cards = $10, board_cards = $11, actions = $12, result = $13,
                pot_size = $14, net_profit = $15, is_vpip = $16, is_pfr = $17,
                aggressive_actions = $18, passive_actions = $19, played_at = $20
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, PokerHand>(&query)
            .bind(id)
            .bind(&hand.platform)
            .bind(&hand.game_type)
            .bind(&hand.stakes)
            .bind(hand.small_blind)
            .bind(hand.big_blind)
            .bind(&hand.table_name)
            .bind(&hand.hero_name)
            .bind(&hand.position)
            .bind(&hand.hole_cards)
            .bind(&hand.board_cards)
            .bind(&hand.actions)
            .bind(&hand.result)
            .bind(hand.pot_size)
            .bind(hand.net_profit)
            .bind(hand.is_vpip)
            .bind(hand.is_pfr)
            .bind(hand.aggressive_actions)
            .bind(hand.passive_actions)
            .bind(hand.played_at)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(updated) = &updated {
            StatisticsCacheRepo::invalidate_user_inner(&mut tx, updated.user_id).await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    /// Delete a hand and its analyses, clearing the owner's statistics
    /// cache. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let owner = sqlx::query_scalar::<_, DbId>(
            "DELETE FROM poker_hands WHERE id = $1 RETURNING user_id",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(user_id) = owner {
            StatisticsCacheRepo::invalidate_user_inner(&mut tx, user_id).await?;
        }

        tx.commit().await?;
        Ok(owner.is_some())
    }
}
