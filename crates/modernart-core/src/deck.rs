//! Deterministic shuffling and dealing.

use crate::card::Card;
use crate::rng::{Seed, SeededRng};
use im::Vector;

/// Cards dealt to each player per round, keyed by player count
const DEAL_TABLE: [(usize, [usize; 3]); 4] = [
    (1, [10, 10, 10]),
    (2, [10, 10, 10]),
    (3, [10, 10, 10]),
    (4, [10, 5, 3]),
];

/// Number of cards each player receives at the start of `round_index`.
///
/// Player counts or rounds outside the table deal nothing.
pub fn cards_to_deal(player_count: usize, round_index: u32) -> usize {
    DEAL_TABLE
        .iter()
        .find(|(players, _)| *players == player_count)
        .and_then(|(_, counts)| counts.get(round_index as usize).copied())
        .unwrap_or(0)
}

/// Shuffle in place, walking forward: position `i` swaps with
/// `floor(rng() * (i + 1))`.
///
/// This is not the textbook back-to-front Fisher-Yates; the client uses this
/// exact walk and decks must match it for a given seed.
pub fn shuffle<T>(items: &mut [T], rng: &mut SeededRng) {
    for i in 0..items.len() {
        let j = rng.below(i + 1);
        items.swap(i, j);
    }
}

/// A full deck shuffled with `seed`
pub fn shuffled_deck(seed: &Seed) -> Vector<Card> {
    let mut rng = SeededRng::new(seed);
    let mut cards: Vec<Card> = Card::full_deck().into_iter().collect();
    shuffle(&mut cards, &mut rng);
    cards.into_iter().collect()
}

/// Take up to `count` cards from the front of `deck`
pub fn draw(deck: &mut Vector<Card>, count: usize) -> Vector<Card> {
    let count = count.min(deck.len());
    let rest = deck.split_off(count);
    std::mem::replace(deck, rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{AuctionType, Color, DECK_SIZE};

    #[test]
    fn test_deal_table() {
        assert_eq!(cards_to_deal(1, 0), 10);
        assert_eq!(cards_to_deal(3, 2), 10);
        assert_eq!(cards_to_deal(4, 0), 10);
        assert_eq!(cards_to_deal(4, 1), 5);
        assert_eq!(cards_to_deal(4, 2), 3);
    }

    #[test]
    fn test_deal_table_out_of_range() {
        assert_eq!(cards_to_deal(0, 0), 0);
        assert_eq!(cards_to_deal(5, 0), 0);
        assert_eq!(cards_to_deal(4, 3), 0);
    }

    #[test]
    fn test_shuffled_deck_matches_client_for_default_seed() {
        let deck = shuffled_deck(&Seed::default());
        let head: Vec<Card> = deck.iter().take(8).copied().collect();
        assert_eq!(
            head,
            vec![
                Card::new(Color::Blue, AuctionType::Hidden),
                Card::new(Color::Yellow, AuctionType::Hidden),
                Card::new(Color::Green, AuctionType::Hidden),
                Card::new(Color::Purple, AuctionType::Hidden),
                Card::new(Color::Red, AuctionType::Hidden),
                Card::new(Color::Red, AuctionType::Hidden),
                Card::new(Color::Purple, AuctionType::Hidden),
                Card::new(Color::Red, AuctionType::Open),
            ]
        );
        assert_eq!(deck[39], Card::new(Color::Blue, AuctionType::Hidden));
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut deck: Vec<Card> = shuffled_deck(&Seed::Text("perm".into())).into_iter().collect();
        let mut full: Vec<Card> = Card::full_deck().into_iter().collect();
        assert_eq!(deck.len(), DECK_SIZE);
        deck.sort();
        full.sort();
        assert_eq!(deck, full);
    }

    #[test]
    fn test_different_seeds_different_decks() {
        assert_ne!(
            shuffled_deck(&Seed::Number(1)),
            shuffled_deck(&Seed::Number(2))
        );
    }

    #[test]
    fn test_draw_takes_from_front() {
        let mut deck = Card::full_deck();
        let hand = draw(&mut deck, 3);
        assert_eq!(hand.len(), 3);
        assert_eq!(hand[0], Card::new(Color::Red, AuctionType::Hidden));
        assert_eq!(deck.len(), 37);
        assert_eq!(deck[0], Card::new(Color::Green, AuctionType::Open));
    }

    #[test]
    fn test_draw_short_deck() {
        let mut deck = Card::full_deck();
        let _ = draw(&mut deck, 38);
        let hand = draw(&mut deck, 5);
        assert_eq!(hand.len(), 2);
        assert!(deck.is_empty());
    }
}
