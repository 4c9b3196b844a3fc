//! Topping up the last page with random cards

use crate::cache::ResponseStore;
use crate::card::Card;
use crate::resolver::CardResolver;

/// Random lookups allowed per missing card before giving up
const ATTEMPTS_PER_CARD: usize = 5;

/// Number of extra cards needed so `total` fills whole pages
pub fn cards_needed(total: usize, cards_per_page: usize) -> usize {
    if cards_per_page == 0 {
        return 0;
    }
    (cards_per_page - total % cards_per_page) % cards_per_page
}

/// Append random cards until the printable count is a multiple of
/// `cards_per_page`. Returns how many cards were added.
///
/// Only resolved cards count, each contributing its quantity. Random picks
/// that fail to resolve are retried, up to a fixed number of attempts.
pub fn fill_to_capacity<S: ResponseStore>(
    resolver: &mut CardResolver<S>,
    cards: &mut Vec<Card>,
    cards_per_page: usize,
) -> usize {
    let total: usize = cards.iter().filter(|c| c.is_resolved()).map(|c| c.quantity).sum();
    let needed = cards_needed(total, cards_per_page);
    if needed == 0 {
        return 0;
    }

    log::info!("Filling page with {needed} random card(s)");

    let max_attempts = needed * ATTEMPTS_PER_CARD;
    let mut added = 0;
    let mut attempts = 0;

    while added < needed && attempts < max_attempts {
        attempts += 1;

        let name = match resolver.database_mut().random_name() {
            Ok(Some(name)) => name,
            Ok(None) => continue,
            Err(e) => {
                log::warn!("Random card lookup failed: {e}");
                continue;
            }
        };
        log::info!("Fetched random card: {name}");

        let mut card = Card::new(name, 1, None);
        resolver.resolve(&mut card, false);
        if card.is_resolved() {
            cards.push(card);
            added += 1;
        }
    }

    if added < needed {
        log::warn!("Only {added} of {needed} filler cards could be resolved after {attempts} attempts");
    }

    added
}
