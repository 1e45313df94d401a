//! Aggregate player statistics over stored hands.
//!
//! All functions are single-pass over a slice of [`HandSample`]s and never
//! fail: an empty sample yields zero-valued metrics.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::hand_parser::position::ALL_POSITIONS;
use crate::hand_parser::Platform;
use crate::hashing::sha256_hex;
use crate::types::Timestamp;

/// Positions with fewer qualifying hands are left out of positional stats.
pub const POSITION_MIN_HANDS: u64 = 5;

/// The per-hand fields statistics are computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct HandSample {
    pub position: Option<String>,
    pub played_at: Option<Timestamp>,
    pub is_vpip: bool,
    pub is_pfr: bool,
    pub aggressive_actions: u32,
    pub passive_actions: u32,
    pub net_profit: f64,
    pub big_blind: f64,
    pub won: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicStatistics {
    pub total_hands: u64,
    pub hands_won: u64,
    /// Percent of hands with a voluntary preflop action.
    pub vpip: f64,
    /// Percent of hands with a preflop bet or raise.
    pub pfr: f64,
    /// (bets + raises) / calls.
    pub aggression_factor: f64,
    /// Net profit per 100 hands, in currency units.
    pub win_rate: f64,
    pub bb_per_100: f64,
    pub total_net_profit: f64,
    /// Set by [`apply_min_hands`] when the sample was too small to report.
    #[serde(default)]
    pub insufficient_sample: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionStatistics {
    pub position: String,
    #[serde(flatten)]
    pub stats: BasicStatistics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendPeriod {
    #[default]
    Day,
    Week,
    Month,
}

impl TrendPeriod {
    /// First day of the bucket containing `date`. Weeks start on Monday.
    pub fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => date,
            Self::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
            Self::Month => date.with_day(1).unwrap_or(date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period_start: NaiveDate,
    #[serde(flatten)]
    pub stats: BasicStatistics,
}

/// Metric differences `b - a`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricDeltas {
    pub total_hands: i64,
    pub vpip: f64,
    pub pfr: f64,
    pub aggression_factor: f64,
    pub win_rate: f64,
    pub bb_per_100: f64,
    pub total_net_profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsComparison {
    pub a: BasicStatistics,
    pub b: BasicStatistics,
    pub delta: MetricDeltas,
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Optional narrowing applied before statistics are computed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsFilter {
    pub date_from: Option<Timestamp>,
    pub date_to: Option<Timestamp>,
    pub platform: Option<String>,
    pub stakes: Option<String>,
    pub position: Option<String>,
    pub min_hands: Option<u64>,
}

impl StatsFilter {
    /// Validate and normalize the filter: platform lowercased, position
    /// uppercased, blank strings dropped.
    pub fn normalized(self) -> Result<Self, CoreError> {
        let platform = match non_blank(self.platform) {
            Some(p) => Some(
                Platform::from_name(&p)
                    .ok_or_else(|| CoreError::Validation(format!("Unknown platform: '{p}'")))?
                    .as_str()
                    .to_string(),
            ),
            None => None,
        };

        let position = match non_blank(self.position) {
            Some(p) => {
                let upper = p.to_ascii_uppercase();
                if !ALL_POSITIONS.contains(&upper.as_str()) {
                    return Err(CoreError::Validation(format!("Unknown position: '{p}'")));
                }
                Some(upper)
            }
            None => None,
        };

        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(CoreError::Validation(
                    "date_from must not be after date_to".to_string(),
                ));
            }
        }

        Ok(Self {
            date_from: self.date_from,
            date_to: self.date_to,
            platform,
            stakes: non_blank(self.stakes),
            position,
            min_hands: self.min_hands,
        })
    }

    /// Stable cache key for this filter under `scope` (e.g. `summary`).
    pub fn cache_key(&self, scope: &str) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        sha256_hex(format!("{scope}|{json}").as_bytes())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Calculations
// ---------------------------------------------------------------------------

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        round1(part as f64 / total as f64 * 100.0)
    }
}

/// Compute summary metrics over `hands`.
pub fn calculate_basic_statistics(hands: &[HandSample]) -> BasicStatistics {
    let mut vpip = 0u64;
    let mut pfr = 0u64;
    let mut won = 0u64;
    let mut aggressive = 0u64;
    let mut passive = 0u64;
    let mut net = 0.0;
    let mut big_blinds = 0.0;

    for hand in hands {
        vpip += hand.is_vpip as u64;
        pfr += hand.is_pfr as u64;
        won += hand.won as u64;
        aggressive += hand.aggressive_actions as u64;
        passive += hand.passive_actions as u64;
        net += hand.net_profit;
        if hand.big_blind > 0.0 {
            big_blinds += hand.net_profit / hand.big_blind;
        }
    }

    let total = hands.len() as u64;
    let aggression_factor = match (aggressive, passive) {
        (_, 0) => aggressive as f64,
        (a, p) => round1(a as f64 / p as f64),
    };
    let per_100 = |value: f64| {
        if total == 0 {
            0.0
        } else {
            round1(value / total as f64 * 100.0)
        }
    };

    BasicStatistics {
        total_hands: total,
        hands_won: won,
        vpip: percent(vpip, total),
        pfr: percent(pfr, total),
        aggression_factor,
        win_rate: per_100(net),
        bb_per_100: per_100(big_blinds),
        total_net_profit: round2(net),
        insufficient_sample: false,
    }
}

/// Per-position metrics, in table order.
///
/// Positions with fewer than `max(POSITION_MIN_HANDS, min_hands)` hands are
/// omitted. Hands without a resolved position are ignored.
pub fn calculate_positional_statistics(
    hands: &[HandSample],
    min_hands: u64,
) -> Vec<PositionStatistics> {
    let threshold = min_hands.max(POSITION_MIN_HANDS);

    let mut groups: HashMap<&str, Vec<HandSample>> = HashMap::new();
    for hand in hands {
        if let Some(position) = hand.position.as_deref() {
            groups.entry(position).or_default().push(hand.clone());
        }
    }

    let mut out: Vec<PositionStatistics> = groups
        .into_iter()
        .filter(|(_, group)| group.len() as u64 >= threshold)
        .map(|(position, group)| PositionStatistics {
            position: position.to_string(),
            stats: calculate_basic_statistics(&group),
        })
        .collect();
    out.sort_by_key(|p| {
        ALL_POSITIONS
            .iter()
            .position(|known| *known == p.position)
            .unwrap_or(ALL_POSITIONS.len())
    });
    out
}

/// Bucket hands by `period` of `played_at`, oldest bucket first. Hands
/// without a timestamp are skipped.
pub fn calculate_trends(hands: &[HandSample], period: TrendPeriod) -> Vec<TrendPoint> {
    let mut buckets: BTreeMap<NaiveDate, Vec<HandSample>> = BTreeMap::new();
    for hand in hands {
        if let Some(at) = hand.played_at {
            buckets
                .entry(period.bucket_start(at.date_naive()))
                .or_default()
                .push(hand.clone());
        }
    }

    buckets
        .into_iter()
        .map(|(period_start, group)| TrendPoint {
            period_start,
            stats: calculate_basic_statistics(&group),
        })
        .collect()
}

pub fn compare_statistics(a: BasicStatistics, b: BasicStatistics) -> StatisticsComparison {
    let delta = MetricDeltas {
        total_hands: b.total_hands as i64 - a.total_hands as i64,
        vpip: round1(b.vpip - a.vpip),
        pfr: round1(b.pfr - a.pfr),
        aggression_factor: round1(b.aggression_factor - a.aggression_factor),
        win_rate: round1(b.win_rate - a.win_rate),
        bb_per_100: round1(b.bb_per_100 - a.bb_per_100),
        total_net_profit: round1(b.total_net_profit - a.total_net_profit),
    };
    StatisticsComparison { a, b, delta }
}

/// Blank out the metrics when fewer than `min_hands` hands were sampled.
pub fn apply_min_hands(stats: BasicStatistics, min_hands: u64) -> BasicStatistics {
    if stats.total_hands >= min_hands {
        return stats;
    }
    BasicStatistics {
        total_hands: stats.total_hands,
        insufficient_sample: true,
        ..BasicStatistics::default()
    }
}

const CSV_HEADER: &str =
    "segment,total_hands,hands_won,vpip,pfr,aggression_factor,win_rate,bb_per_100,total_net_profit";

/// Render the summary row followed by one row per position.
pub fn statistics_to_csv(summary: &BasicStatistics, positions: &[PositionStatistics]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    let rows = std::iter::once(("all", summary))
        .chain(positions.iter().map(|p| (p.position.as_str(), &p.stats)));
    for (segment, s) in rows {
        let _ = writeln!(
            out,
            "{segment},{},{},{},{},{},{},{},{}",
            s.total_hands,
            s.hands_won,
            s.vpip,
            s.pfr,
            s.aggression_factor,
            s.win_rate,
            s.bb_per_100,
            s.total_net_profit
        );
    }
    out
}
