//! Deck-list parsing
//!
//! The format is line oriented:
//! - `#DECK: <name>` names the output bundle (first occurrence wins)
//! - `#-` stops parsing; everything below it is ignored
//! - blank lines, `#...` comments and `=...` separators are skipped
//! - `<qty>? <name> [<version>]?` is a card entry, `qty` defaulting to 1

use crate::card::CardRequest;
use crate::names::sanitize_filename;
use regex::Regex;
use std::sync::LazyLock;

static CARD_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)?\s*([^\[]+?)(?:\s*\[(.+?)\])?$").expect("card line pattern is valid")
});

const BASIC_LANDS: &[&str] = &["plains", "island", "swamp", "mountain", "forest"];

const DECK_NAME_PREFIX: &str = "#DECK:";
const STOP_MARKER: &str = "#-";

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub include_basic_lands: bool,
}

/// Result of parsing a whole deck list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeckList {
    /// Sanitized bundle name from `#DECK:`
    pub name: Option<String>,
    pub requests: Vec<CardRequest>,
}

impl DeckList {
    /// Total number of physical cards requested
    pub fn total_quantity(&self) -> usize {
        self.requests.iter().map(|r| r.quantity).sum()
    }
}

/// Parse a deck list. Malformed lines are skipped.
pub fn parse_deck(text: &str, options: &ParseOptions) -> DeckList {
    let mut deck = DeckList::default();

    for line in text.trim_start_matches('\u{feff}').lines() {
        let line = line.trim();

        if line.starts_with(STOP_MARKER) {
            break;
        }

        if let Some(name) = line.strip_prefix(DECK_NAME_PREFIX) {
            if deck.name.is_none() {
                let name = name.trim();
                if !name.is_empty() {
                    deck.name = Some(sanitize_filename(name));
                }
            }
            continue;
        }

        if line.is_empty() || line.starts_with('#') || line.starts_with('=') {
            continue;
        }

        let Some(request) = parse_line(line) else {
            log::debug!("Skipping unparseable deck line: {line}");
            continue;
        };

        if !options.include_basic_lands && is_basic_land(&request.raw_name) {
            log::debug!("Skipping basic land: {}", request.raw_name);
            continue;
        }

        deck.requests.push(request);
    }

    deck
}

/// Parse a single card entry such as `3 Lightning Bolt [2XM]`.
pub fn parse_line(line: &str) -> Option<CardRequest> {
    let caps = CARD_LINE.captures(line.trim())?;

    let name = caps.get(2)?.as_str().trim();
    if name.is_empty() {
        return None;
    }

    let quantity = match caps.get(1) {
        Some(qty) => qty.as_str().parse::<usize>().ok().filter(|&q| q >= 1)?,
        None => 1,
    };

    let version = caps
        .get(3)
        .map(|v| v.as_str().trim().to_string())
        .filter(|v| !v.is_empty());

    Some(CardRequest::new(name, quantity, version))
}

pub fn is_basic_land(name: &str) -> bool {
    let lower = name.to_lowercase();
    BASIC_LANDS.contains(&lower.as_str())
}
