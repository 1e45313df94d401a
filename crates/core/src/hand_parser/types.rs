//! Structured output of the hand-history parser.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Poker site a hand history was exported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    PokerStars,
    GgPoker,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PokerStars => "pokerstars",
            Self::GgPoker => "ggpoker",
        }
    }

    /// Parse the lowercase wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "pokerstars" => Some(Self::PokerStars),
            "ggpoker" => Some(Self::GgPoker),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Street {
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    PostSmallBlind,
    PostBigBlind,
    PostAnte,
    Post,
    Fold,
    Check,
    Call,
    Bet,
    Raise,
}

impl ActionKind {
    /// Bets and raises.
    pub fn is_aggressive(self) -> bool {
        matches!(self, Self::Bet | Self::Raise)
    }

    /// Money put in by choice rather than by posting.
    pub fn is_voluntary(self) -> bool {
        matches!(self, Self::Call | Self::Bet | Self::Raise)
    }
}

/// One line of betting action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandAction {
    pub street: Street,
    pub player: String,
    pub kind: ActionKind,
    /// Amount named on the line (`calls $2`, `raises $2 to $6` -> 2).
    pub amount: Option<f64>,
    /// Raise target (`to $6`).
    pub to_amount: Option<f64>,
    pub is_all_in: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    pub number: u8,
    pub player: String,
    pub stack: f64,
}

/// Outcome of the hand from the hero's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandResult {
    Won,
    Lost,
    Folded,
    /// No hero could be identified (`Dealt to` line missing).
    Unknown,
}

impl HandResult {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Won => "won",
            Self::Lost => "lost",
            Self::Folded => "folded",
            Self::Unknown => "unknown",
        }
    }
}

/// A fully or partially parsed hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedHand {
    pub hand_id: String,
    pub platform: Platform,
    pub game_type: String,
    /// Display form, e.g. `$0.01/$0.02`. Empty when not found.
    pub stakes: String,
    pub small_blind: f64,
    pub big_blind: f64,
    pub currency: Option<String>,
    pub table_name: Option<String>,
    pub max_seats: Option<u8>,
    pub button_seat: Option<u8>,
    pub seats: Vec<Seat>,
    pub hero: Option<String>,
    pub position: Option<String>,
    pub hole_cards: Vec<String>,
    pub board: Vec<String>,
    pub actions: Vec<HandAction>,
    pub pot_size: Option<f64>,
    pub rake: Option<f64>,
    pub hero_invested: f64,
    pub hero_collected: f64,
    pub net_profit: f64,
    pub result: HandResult,
    pub played_at: Option<Timestamp>,
    pub is_vpip: bool,
    pub is_pfr: bool,
    pub aggressive_actions: u32,
    pub passive_actions: u32,
    /// The block this hand was parsed from, trimmed.
    #[serde(skip)]
    pub raw_text: String,
}

/// Why a block could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unrecognized hand history format")]
    UnrecognizedFormat,

    #[error("hand header has no hand id")]
    MissingHandId,

    #[error("hand block is empty")]
    Empty,
}

/// A block that was skipped during file parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseFailure {
    /// Zero-based index of the block within the file.
    pub index: usize,
    pub reason: String,
}

/// Result of parsing a whole hand-history file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseReport {
    pub hands: Vec<ParsedHand>,
    pub failures: Vec<ParseFailure>,
    /// Hand ids seen more than once; only the first occurrence is kept.
    pub duplicates: Vec<String>,
}

impl ParseReport {
    pub fn total_blocks(&self) -> usize {
        self.hands.len() + self.failures.len() + self.duplicates.len()
    }
}
