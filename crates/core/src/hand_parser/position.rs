//! Table position names derived from the button and occupied seats.

use super::types::Seat;

/// Positions between the big blind and the button, by how many seats
/// sit there. Index 0 is unused (three-handed has none).
const MIDDLE_POSITIONS: [&[&str]; 8] = [
    &[],
    &["UTG"],
    &["UTG", "CO"],
    &["UTG", "HJ", "CO"],
    &["UTG", "LJ", "HJ", "CO"],
    &["UTG", "MP", "LJ", "HJ", "CO"],
    &["UTG", "UTG+1", "MP", "LJ", "HJ", "CO"],
    &["UTG", "UTG+1", "UTG+2", "MP", "LJ", "HJ", "CO"],
];

/// Every position name the parser can emit, in table order.
pub const ALL_POSITIONS: [&str; 10] = [
    "UTG", "UTG+1", "UTG+2", "MP", "LJ", "HJ", "CO", "BTN", "SB", "BB",
];

/// Position labels in seating order starting at the button.
fn labels_for(players: usize) -> Vec<&'static str> {
    match players {
        0 | 1 => Vec::new(),
        2 => vec!["BTN", "BB"],
        n => {
            let mut labels = vec!["BTN", "SB", "BB"];
            if let Some(middle) = MIDDLE_POSITIONS.get(n - 3) {
                labels.extend_from_slice(middle);
            }
            labels
        }
    }
}

/// Resolve the position of `player`.
///
/// Seats are ordered clockwise starting with the button. When the button
/// seat is empty the next occupied seat is treated as the button.
pub fn resolve_position(seats: &[Seat], button_seat: u8, player: &str) -> Option<String> {
    let mut ordered: Vec<&Seat> = seats.iter().collect();
    ordered.sort_by_key(|s| s.number);

    let start = ordered
        .iter()
        .position(|s| s.number >= button_seat)
        .unwrap_or(0);
    ordered.rotate_left(start);

    let labels = labels_for(ordered.len());
    ordered
        .iter()
        .position(|s| s.player == player)
        .and_then(|idx| labels.get(idx))
        .map(|label| label.to_string())
}
