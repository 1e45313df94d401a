//! Hand-history text parsing.
//!
//! - [`split_hand_blocks`] cuts an exported file into one block per hand.
//! - [`parse_hand`] turns one block into a [`ParsedHand`].
//! - [`parse_file`] does both, skipping malformed blocks and dropping
//!   duplicate hand ids.

mod parser;
pub mod position;
mod types;

#[cfg(test)]
pub(crate) mod fixtures;

use std::collections::HashSet;

pub use parser::{detect_platform, parse_hand};
pub use types::{
    ActionKind, HandAction, HandResult, ParseError, ParseFailure, ParseReport, ParsedHand,
    Platform, Seat, Street,
};

/// Split an exported file into hand blocks.
///
/// A block starts at each recognized header line and runs until the next
/// one. Text before the first header is ignored.
pub fn split_hand_blocks(text: &str) -> Vec<&str> {
    let mut starts = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if parser::is_header_line(line) {
            starts.push(offset);
        }
        offset += line.len();
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            text[start..end].trim()
        })
        .filter(|block| !block.is_empty())
        .collect()
}

/// Parse every hand in a file.
///
/// Blocks that fail to parse are reported in [`ParseReport::failures`];
/// repeated hand ids are reported in [`ParseReport::duplicates`] and only
/// the first occurrence is kept.
pub fn parse_file(text: &str) -> ParseReport {
    let blocks = split_hand_blocks(text);
    let mut report = ParseReport::default();

    if blocks.is_empty() && !text.trim().is_empty() {
        report.failures.push(ParseFailure {
            index: 0,
            reason: ParseError::UnrecognizedFormat.to_string(),
        });
        return report;
    }

    let mut seen = HashSet::new();
    for (index, block) in blocks.into_iter().enumerate() {
        match parse_hand(block) {
            Ok(hand) => {
                if seen.insert(hand.hand_id.clone()) {
                    report.hands.push(hand);
                } else {
                    report.duplicates.push(hand.hand_id);
                }
            }
            Err(e) => report.failures.push(ParseFailure {
                index,
                reason: e.to_string(),
            }),
        }
    }
    report
}
