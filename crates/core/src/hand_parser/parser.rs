//! Line-oriented parser for a single hand-history block.
//!
//! PokerStars and GGPoker share the same text layout, so one parser handles
//! both; the platform is decided by the header line.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{Datelike, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday};
use regex::Regex;

use super::position::resolve_position;
use super::types::{
    ActionKind, HandAction, HandResult, ParseError, ParsedHand, Platform, Seat, Street,
};
use crate::types::Timestamp;

const MONEY: &str = r"[^\d\s(]*[\d][\d,]*(?:\.\d+)?";

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<site>PokerStars|Poker)\s+(?:Zoom\s+|Home Game\s+)?Hand\s+#(?P<id>[A-Za-z0-9\-]*):\s*(?P<rest>.*)$")
        .expect("valid regex")
});

static GAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<game>Hold'em|Omaha Hi/Lo|Omaha|5 Card Omaha|Razz|7 Card Stud|Stud)\s+(?P<limit>No Limit|Pot Limit|Fixed Limit|Limit)")
        .expect("valid regex")
});

static STAKES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\((?P<sb>{MONEY})/(?P<bb>{MONEY})(?:\s+(?P<cur>[A-Z]{{3}}))?\)"
    ))
    .expect("valid regex")
});

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<ts>\d{4}/\d{2}/\d{2} \d{1,2}:\d{2}:\d{2})(?:\s+(?P<tz>[A-Z]{2,4})\b)?")
        .expect("valid regex")
});

static TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Table '(?P<name>[^']+)'\s+(?:(?P<max>\d+)-max\s+)?(?:\([^)]*\)\s+)?Seat #(?P<button>\d+) is the button")
        .expect("valid regex")
});

static SEAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^Seat (?P<n>\d+): (?P<player>.+?) \((?P<stack>{MONEY}) in chips"
    ))
    .expect("valid regex")
});

static DEALT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Dealt to (?P<player>.+?) \[(?P<cards>[^\]]+)\]").expect("valid regex")
});

static STREET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*\*\* (?P<street>HOLE CARDS|FIRST FLOP|FLOP|TURN|RIVER|SHOW ?DOWN|SUMMARY) \*\*\*(?P<rest>.*)$")
        .expect("valid regex")
});

static CARDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(?P<cards>[^\]]*)\]").expect("valid regex"));

static ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?P<player>.+?): (?P<verb>posts small & big blinds|posts small blind|posts big blind|posts the ante|posts ante|posts|folds|checks|calls|bets|raises)(?:\s+(?P<amt>{MONEY}))?(?:\s+to\s+(?P<to>{MONEY}))?(?P<allin>\s+and is all-in)?"
    ))
    .expect("valid regex")
});

static UNCALLED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^Uncalled bet \((?P<amt>{MONEY})\) returned to (?P<player>.+)$"
    ))
    .expect("valid regex")
});

static COLLECTED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?P<player>.+?) collected (?P<amt>{MONEY}) from (?:the )?(?:side |main )?pot"
    ))
    .expect("valid regex")
});

static TOTAL_POT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^Total pot (?P<amt>{MONEY})(?:.*?\| Rake (?P<rake>{MONEY}))?"
    ))
    .expect("valid regex")
});

static BOARD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Board \[(?P<cards>[^\]]*)\]").expect("valid regex"));

/// Parse a money token such as `$1,250.50` or `€0.02`.
pub(crate) fn parse_money(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse().ok()
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn split_cards(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split_whitespace().map(str::to_string)
}

/// Decide which site produced `block` from its header line.
pub fn detect_platform(block: &str) -> Option<Platform> {
    let first = block.trim_start_matches('\u{feff}').lines().next()?.trim();
    HEADER_RE.captures(first).map(|c| match &c["site"] {
        "PokerStars" => Platform::PokerStars,
        _ => Platform::GgPoker,
    })
}

/// True when `line` opens a new hand.
pub(crate) fn is_header_line(line: &str) -> bool {
    HEADER_RE.is_match(line.trim_start_matches('\u{feff}').trim())
}

/// Chips each player has committed on the current street.
struct StreetLedger {
    street_committed: HashMap<String, f64>,
}

impl StreetLedger {
    fn new() -> Self {
        Self {
            street_committed: HashMap::new(),
        }
    }

    fn new_street(&mut self) {
        self.street_committed.clear();
    }

    /// Record chips a player moves into the pot. Returns the chips added.
    fn commit(&mut self, action: &HandAction) -> f64 {
        let committed = self
            .street_committed
            .entry(action.player.clone())
            .or_insert(0.0);
        let added = match action.kind {
            ActionKind::PostAnte => action.amount.unwrap_or(0.0),
            ActionKind::Raise => match action.to_amount {
                Some(to) => (to - *committed).max(0.0),
                None => action.amount.unwrap_or(0.0),
            },
            ActionKind::Fold | ActionKind::Check => 0.0,
            _ => action.amount.unwrap_or(0.0),
        };
        if action.kind != ActionKind::PostAnte {
            *committed += added;
        }
        added
    }
}

/// Convert a header wall-clock time to UTC using its zone suffix.
///
/// `ET` follows the US Eastern daylight-saving calendar. A missing or
/// unknown suffix is taken as UTC, which is what GGPoker exports use.
fn to_utc(local: NaiveDateTime, zone: Option<&str>) -> Option<Timestamp> {
    let hours = match zone {
        Some("ET") if in_us_daylight_time(local) => -4,
        Some("ET" | "EST") => -5,
        Some("EDT") => -4,
        Some("CET" | "WEST" | "BST") => 1,
        Some("CEST" | "EET") => 2,
        Some("EEST" | "MSK") => 3,
        _ => 0,
    };
    let offset = FixedOffset::east_opt(hours * 3600)?;
    offset
        .from_local_datetime(&local)
        .single()
        .map(|at| at.with_timezone(&Utc))
}

/// US daylight time runs from 02:00 on the second Sunday of March to
/// 02:00 on the first Sunday of November, local time.
fn in_us_daylight_time(local: NaiveDateTime) -> bool {
    let year = local.year();
    let switch = |month, nth| {
        NaiveDate::from_weekday_of_month_opt(year, month, Weekday::Sun, nth)
            .and_then(|day| day.and_hms_opt(2, 0, 0))
    };
    match (switch(3, 2), switch(11, 1)) {
        (Some(start), Some(end)) => local >= start && local < end,
        _ => false,
    }
}

/// Parse a single hand block.
///
/// Only the header and hand id are mandatory; every other field is filled
/// in when present so that truncated exports still yield a record.
pub fn parse_hand(block: &str) -> Result<ParsedHand, ParseError> {
    let block = block.trim_start_matches('\u{feff}').trim();
    let mut lines = block.lines().map(str::trim).filter(|l| !l.is_empty());

    let header = lines.next().ok_or(ParseError::Empty)?;
    let caps = HEADER_RE
        .captures(header)
        .ok_or(ParseError::UnrecognizedFormat)?;
    let hand_id = caps["id"].to_string();
    if hand_id.is_empty() {
        return Err(ParseError::MissingHandId);
    }
    let platform = match &caps["site"] {
        "PokerStars" => Platform::PokerStars,
        _ => Platform::GgPoker,
    };
    let rest = &caps["rest"];

    let game_type = match GAME_RE.captures(rest) {
        Some(g) => format!("{} {}", &g["game"], &g["limit"]),
        None => rest
            .split('(')
            .next()
            .unwrap_or_default()
            .trim()
            .trim_end_matches('-')
            .trim()
            .to_string(),
    };

    let (stakes, small_blind, big_blind, currency) = match STAKES_RE.captures(rest) {
        Some(s) => (
            format!("{}/{}", &s["sb"], &s["bb"]),
            parse_money(&s["sb"]).unwrap_or(0.0),
            parse_money(&s["bb"]).unwrap_or(0.0),
            s.name("cur").map(|m| m.as_str().to_string()),
        ),
        None => (String::new(), 0.0, 0.0, None),
    };

    let played_at = DATE_RE.captures(rest).and_then(|d| {
        NaiveDateTime::parse_from_str(&d["ts"], "%Y/%m/%d %H:%M:%S")
            .ok()
            .and_then(|naive| to_utc(naive, d.name("tz").map(|m| m.as_str())))
    });

    let mut hand = ParsedHand {
        hand_id,
        platform,
        game_type,
        stakes,
        small_blind,
        big_blind,
        currency,
        table_name: None,
        max_seats: None,
        button_seat: None,
        seats: Vec::new(),
        hero: None,
        position: None,
        hole_cards: Vec::new(),
        board: Vec::new(),
        actions: Vec::new(),
        pot_size: None,
        rake: None,
        hero_invested: 0.0,
        hero_collected: 0.0,
        net_profit: 0.0,
        result: HandResult::Unknown,
        played_at,
        is_vpip: false,
        is_pfr: false,
        aggressive_actions: 0,
        passive_actions: 0,
        raw_text: block.to_string(),
    };

    let mut street = Street::Preflop;
    let mut in_summary = false;
    let mut seen_hole_cards = false;
    let mut ledger = StreetLedger::new();
    let mut invested: HashMap<String, f64> = HashMap::new();
    let mut collected: HashMap<String, f64> = HashMap::new();

    for line in lines {
        if let Some(s) = STREET_RE.captures(line) {
            let marker = s["street"].replace(' ', "");
            street = match marker.as_str() {
                "HOLECARDS" => {
                    seen_hole_cards = true;
                    Street::Preflop
                }
                "FLOP" | "FIRSTFLOP" => Street::Flop,
                "TURN" => Street::Turn,
                "RIVER" => Street::River,
                "SHOWDOWN" => Street::Showdown,
                _ => {
                    in_summary = true;
                    street
                }
            };
            ledger.new_street();
            for group in CARDS_RE.captures_iter(&s["rest"]) {
                for card in split_cards(&group["cards"]) {
                    if !hand.board.contains(&card) {
                        hand.board.push(card);
                    }
                }
            }
            continue;
        }

        if in_summary {
            if let Some(t) = TOTAL_POT_RE.captures(line) {
                hand.pot_size = parse_money(&t["amt"]);
                hand.rake = t.name("rake").and_then(|r| parse_money(r.as_str()));
            } else if let Some(b) = BOARD_RE.captures(line) {
                if hand.board.is_empty() {
                    hand.board = split_cards(&b["cards"]).collect();
                }
            }
            continue;
        }

        if !seen_hole_cards {
            if let Some(t) = TABLE_RE.captures(line) {
                hand.table_name = Some(t["name"].to_string());
                hand.max_seats = t.name("max").and_then(|m| m.as_str().parse().ok());
                hand.button_seat = t["button"].parse().ok();
                continue;
            }
            if let Some(s) = SEAT_RE.captures(line) {
                if let Ok(number) = s["n"].parse() {
                    hand.seats.push(Seat {
                        number,
                        player: s["player"].to_string(),
                        stack: parse_money(&s["stack"]).unwrap_or(0.0),
                    });
                }
                continue;
            }
        }

        if let Some(d) = DEALT_RE.captures(line) {
            if hand.hero.is_none() {
                hand.hero = Some(d["player"].to_string());
                hand.hole_cards = split_cards(&d["cards"]).collect();
            }
            continue;
        }

        if let Some(u) = UNCALLED_RE.captures(line) {
            let amount = parse_money(&u["amt"]).unwrap_or(0.0);
            *invested.entry(u["player"].to_string()).or_insert(0.0) -= amount;
            continue;
        }

        if let Some(c) = COLLECTED_RE.captures(line) {
            let amount = parse_money(&c["amt"]).unwrap_or(0.0);
            *collected.entry(c["player"].to_string()).or_insert(0.0) += amount;
            continue;
        }

        if let Some(a) = ACTION_RE.captures(line) {
            let kind = match &a["verb"] {
                "posts small blind" => ActionKind::PostSmallBlind,
                "posts big blind" => ActionKind::PostBigBlind,
                "posts the ante" | "posts ante" => ActionKind::PostAnte,
                "posts small & big blinds" | "posts" => ActionKind::Post,
                "folds" => ActionKind::Fold,
                "checks" => ActionKind::Check,
                "calls" => ActionKind::Call,
                "bets" => ActionKind::Bet,
                _ => ActionKind::Raise,
            };
            let action = HandAction {
                street,
                player: a["player"].to_string(),
                kind,
                amount: a.name("amt").and_then(|m| parse_money(m.as_str())),
                to_amount: a.name("to").and_then(|m| parse_money(m.as_str())),
                is_all_in: a.name("allin").is_some(),
            };
            let added = ledger.commit(&action);
            *invested.entry(action.player.clone()).or_insert(0.0) += added;
            hand.actions.push(action);
        }
    }

    if let Some(hero) = hand.hero.clone() {
        summarize_hero(&mut hand, &hero, &invested, &collected);
    }
    Ok(hand)
}

/// Fill the hero-centric derived fields.
fn summarize_hero(
    hand: &mut ParsedHand,
    hero: &str,
    invested: &HashMap<String, f64>,
    collected: &HashMap<String, f64>,
) {
    if let Some(button) = hand.button_seat {
        hand.position = resolve_position(&hand.seats, button, hero);
    }

    let mut folded = false;
    for action in hand.actions.iter().filter(|a| a.player == hero) {
        if action.street == Street::Preflop {
            hand.is_vpip |= action.kind.is_voluntary();
            hand.is_pfr |= action.kind.is_aggressive();
        }
        if action.kind.is_aggressive() {
            hand.aggressive_actions += 1;
        } else if action.kind == ActionKind::Call {
            hand.passive_actions += 1;
        }
        folded |= action.kind == ActionKind::Fold;
    }

    hand.hero_invested = round_cents(invested.get(hero).copied().unwrap_or(0.0).max(0.0));
    hand.hero_collected = round_cents(collected.get(hero).copied().unwrap_or(0.0));
    hand.net_profit = round_cents(hand.hero_collected - hand.hero_invested);
    hand.result = if hand.hero_collected > 0.0 {
        HandResult::Won
    } else if folded {
        HandResult::Folded
    } else {
        HandResult::Lost
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, "%Y/%m/%d %H:%M:%S").unwrap()
    }

    fn utc(raw: &str) -> Timestamp {
        Utc.from_utc_datetime(&local(raw))
    }

    #[test]
    fn eastern_time_follows_daylight_saving() {
        // Summer: EDT, UTC-4.
        assert_eq!(
            to_utc(local("2026/09/14 20:15:03"), Some("ET")),
            Some(utc("2026/09/15 00:15:03"))
        );
        // Winter: EST, UTC-5.
        assert_eq!(
            to_utc(local("2026/01/02 10:00:00"), Some("ET")),
            Some(utc("2026/01/02 15:00:00"))
        );
    }

    #[test]
    fn daylight_saving_boundaries() {
        // 2026: second Sunday of March is the 8th, first Sunday of November the 1st.
        assert!(!in_us_daylight_time(local("2026/03/08 01:59:59")));
        assert!(in_us_daylight_time(local("2026/03/08 02:00:00")));
        assert!(in_us_daylight_time(local("2026/11/01 01:59:59")));
        assert!(!in_us_daylight_time(local("2026/11/01 02:00:00")));
    }

    #[test]
    fn fixed_zones_and_missing_suffix() {
        assert_eq!(
            to_utc(local("2026/09/14 20:00:00"), Some("CET")),
            Some(utc("2026/09/14 19:00:00"))
        );
        assert_eq!(
            to_utc(local("2026/09/14 20:00:00"), None),
            Some(utc("2026/09/14 20:00:00"))
        );
        assert_eq!(
            to_utc(local("2026/09/14 20:00:00"), Some("UTC")),
            Some(utc("2026/09/14 20:00:00"))
        );
    }

    #[test]
    fn header_time_is_stored_in_utc() {
        let hand = parse_hand(
            "PokerStars Hand #99: Hold'em No Limit ($0.05/$0.10 USD) - 2026/01/02 10:00:00 ET",
        )
        .unwrap();
        assert_eq!(hand.played_at, Some(utc("2026/01/02 15:00:00")));
    }
}
