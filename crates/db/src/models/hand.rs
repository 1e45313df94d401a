//! Poker hand entity model and DTOs.

use handcoach_core::hand_parser::{HandAction, HandResult, ParsedHand};
use handcoach_core::statistics::{HandSample, StatsFilter};
use handcoach_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// A row from the `poker_hands` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PokerHand {
    pub id: DbId,
    pub user_id: DbId,
    pub hand_id: String,
    pub platform: String,
    pub game_type: String,
    pub stakes: String,
    pub small_blind: f64,
    pub big_blind: f64,
    pub table_name: Option<String>,
    pub hero_name: Option<String>,
    pub position: Option<String>,
    pub hole_cards: Vec<String>,
    pub board_cards: Vec<String>,
    pub actions: Json<Vec<HandAction>>,
    pub result: String,
    pub pot_size: Option<f64>,
    pub net_profit: f64,
    pub is_vpip: bool,
    pub is_pfr: bool,
    pub aggressive_actions: i32,
    pub passive_actions: i32,
    pub raw_text: String,
    pub played_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert/re-parse payload derived from a [`ParsedHand`].
#[derive(Debug, Clone)]
pub struct NewPokerHand {
    pub hand_id: String,
    pub platform: String,
    pub game_type: String,
    pub stakes: String,
    pub small_blind: f64,
    pub big_blind: f64,
    pub table_name: Option<String>,
    pub hero_name: Option<String>,
    pub position: Option<String>,
    pub hole_cards: Vec<String>,
    pub board_cards: Vec<String>,
    pub actions: Json<Vec<HandAction>>,
    pub result: String,
    pub pot_size: Option<f64>,
    pub net_profit: f64,
    pub is_vpip: bool,
    pub is_pfr: bool,
    pub aggressive_actions: i32,
    pub passive_actions: i32,
    pub raw_text: String,
    pub played_at: Option<Timestamp>,
}

impl NewPokerHand {
    pub fn from_parsed(hand: &ParsedHand) -> Self {
        Self {
            hand_id: hand.hand_id.clone(),
            platform: hand.platform.as_str().to_string(),
            game_type: hand.game_type.clone(),
            stakes: hand.stakes.clone(),
            small_blind: hand.small_blind,
            big_blind: hand.big_blind,
            table_name: hand.table_name.clone(),
            hero_name: hand.hero.clone(),
            position: hand.position.clone(),
            hole_cards: hand.hole_cards.clone(),
            board_cards: hand.board.clone(),
            actions: Json(hand.actions.clone()),
            result: hand.result.as_str().to_string(),
            pot_size: hand.pot_size,
            net_profit: hand.net_profit,
            is_vpip: hand.is_vpip,
            is_pfr: hand.is_pfr,
            aggressive_actions: hand.aggressive_actions as i32,
            passive_actions: hand.passive_actions as i32,
            raw_text: hand.raw_text.clone(),
            played_at: hand.played_at,
        }
    }
}

/// Query-string filter for hand listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HandFilter {
    pub platform: Option<String>,
    pub stakes: Option<String>,
    pub position: Option<String>,
    pub date_from: Option<Timestamp>,
    pub date_to: Option<Timestamp>,
}

/// The columns statistics are computed from.
#[derive(Debug, Clone, FromRow)]
pub struct HandStatsRow {
    pub position: Option<String>,
    pub played_at: Option<Timestamp>,
    pub is_vpip: bool,
    pub is_pfr: bool,
    pub aggressive_actions: i32,
    pub passive_actions: i32,
    pub net_profit: f64,
    pub big_blind: f64,
    pub result: String,
}

impl From<HandStatsRow> for HandSample {
    fn from(row: HandStatsRow) -> Self {
        Self {
            position: row.position,
            played_at: row.played_at,
            is_vpip: row.is_vpip,
            is_pfr: row.is_pfr,
            aggressive_actions: row.aggressive_actions.max(0) as u32,
            passive_actions: row.passive_actions.max(0) as u32,
            net_profit: row.net_profit,
            big_blind: row.big_blind,
            won: row.result == HandResult::Won.as_str(),
        }
    }
}

impl From<&StatsFilter> for HandFilter {
    fn from(filter: &StatsFilter) -> Self {
        Self {
            platform: filter.platform.clone(),
            stakes: filter.stakes.clone(),
            position: filter.position.clone(),
            date_from: filter.date_from,
            date_to: filter.date_to,
        }
    }
}
