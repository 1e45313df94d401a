//! Prompt templates for hand analysis.

use std::fmt::Write as _;

use handcoach_core::hand_parser::{ActionKind, HandAction, Street};
use serde::{Deserialize, Serialize};

/// What the coach should concentrate on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisFocus {
    #[default]
    General,
    Preflop,
    Postflop,
    Mistakes,
}

impl AnalysisFocus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Preflop => "preflop",
            Self::Postflop => "postflop",
            Self::Mistakes => "mistakes",
        }
    }

    fn instruction(self) -> &'static str {
        match self {
            Self::General => {
                "Give an overall assessment of how the hero played this hand, street by street, \
                 and suggest concrete improvements."
            }
            Self::Preflop => {
                "Focus on the preflop decision: hand selection for the position, sizing, and \
                 how ranges interact. Comment on later streets only if preflop play shaped them."
            }
            Self::Postflop => {
                "Focus on flop, turn and river play: board texture, bet sizing, and whether each \
                 bet or call was justified against a reasonable villain range."
            }
            Self::Mistakes => {
                "List the hero's mistakes in this hand in order of cost, explaining for each \
                 what the better line would have been. Say so plainly if the hand was played well."
            }
        }
    }
}

/// The hand fields a prompt is built from.
#[derive(Debug, Clone, Default)]
pub struct HandContext {
    pub game_type: String,
    pub stakes: String,
    pub hero: Option<String>,
    pub position: Option<String>,
    pub hole_cards: Vec<String>,
    pub board: Vec<String>,
    pub actions: Vec<HandAction>,
    pub result: String,
    pub pot_size: Option<f64>,
    pub net_profit: f64,
}

const STREETS: [(Street, &str); 5] = [
    (Street::Preflop, "Preflop"),
    (Street::Flop, "Flop"),
    (Street::Turn, "Turn"),
    (Street::River, "River"),
    (Street::Showdown, "Showdown"),
];

fn describe_action(action: &HandAction) -> String {
    let verb = match action.kind {
        ActionKind::PostSmallBlind => "posts small blind",
        ActionKind::PostBigBlind => "posts big blind",
        ActionKind::PostAnte => "posts ante",
        ActionKind::Post => "posts",
        ActionKind::Fold => "folds",
        ActionKind::Check => "checks",
        ActionKind::Call => "calls",
        ActionKind::Bet => "bets",
        ActionKind::Raise => "raises",
    };
    let mut line = format!("{} {verb}", action.player);
    match (action.kind, action.amount, action.to_amount) {
        (ActionKind::Raise, _, Some(to)) => {
            let _ = write!(line, " to {to:.2}");
        }
        (_, Some(amount), _) => {
            let _ = write!(line, " {amount:.2}");
        }
        _ => {}
    }
    if action.is_all_in {
        line.push_str(" (all-in)");
    }
    line
}

/// Render the coaching prompt for one hand.
pub fn build_hand_prompt(hand: &HandContext, focus: AnalysisFocus) -> String {
    let mut p = String::new();
    let _ = writeln!(
        p,
        "You are an experienced poker coach reviewing a hand played by your student."
    );
    let _ = writeln!(p, "{}\n", focus.instruction());

    let _ = writeln!(p, "Game: {}", non_empty(&hand.game_type, "unknown"));
    let _ = writeln!(p, "Stakes: {}", non_empty(&hand.stakes, "unknown"));
    let _ = writeln!(
        p,
        "Hero: {} in position {}",
        hand.hero.as_deref().unwrap_or("unknown"),
        hand.position.as_deref().unwrap_or("unknown")
    );
    let _ = writeln!(p, "Hole cards: {}", cards(&hand.hole_cards));
    let _ = writeln!(p, "Board: {}", cards(&hand.board));

    let _ = writeln!(p, "\nAction:");
    for (street, label) in STREETS {
        let lines: Vec<String> = hand
            .actions
            .iter()
            .filter(|a| a.street == street)
            .map(describe_action)
            .collect();
        if !lines.is_empty() {
            let _ = writeln!(p, "{label}: {}", lines.join(", "));
        }
    }

    let _ = writeln!(p, "\nResult: {}", non_empty(&hand.result, "unknown"));
    if let Some(pot) = hand.pot_size {
        let _ = writeln!(p, "Pot: {pot:.2}");
    }
    let _ = writeln!(p, "Hero net: {:+.2}", hand.net_profit);
    let _ = write!(p, "\nAnswer in plain prose, under 400 words.");
    p
}

fn non_empty<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

fn cards(cards: &[String]) -> String {
    if cards.is_empty() {
        "none".to_string()
    } else {
        cards.join(" ")
    }
}
