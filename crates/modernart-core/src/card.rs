//! Paintings and the card palette.
//!
//! Every card is a painting of one of five colors. The auction type printed
//! on the card is carried along with it but does not affect any rule.

use im::Vector;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of copies of each (color, auction type) pair in a full deck
pub const COPIES_PER_CARD: usize = 4;

/// Size of a full deck: 4 copies x 5 colors x 2 auction types
pub const DECK_SIZE: usize = COPIES_PER_CARD * Color::ALL.len() * AuctionType::ALL.len();

/// Painting color.
///
/// The declaration order is the palette order, which also breaks ties when
/// colors are ranked at the end of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
}

impl Color {
    /// All colors in palette order
    pub const ALL: [Color; 5] = [
        Color::Red,
        Color::Green,
        Color::Blue,
        Color::Yellow,
        Color::Purple,
    ];

    /// Lowercase name, as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Yellow => "yellow",
            Color::Purple => "purple",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a painting is meant to be auctioned. Stored but not interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionType {
    /// Sealed bids
    Hidden,
    /// Open outcry
    Open,
}

impl AuctionType {
    /// All auction types
    pub const ALL: [AuctionType; 2] = [AuctionType::Hidden, AuctionType::Open];
}

/// A painting card
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub color: Color,
    pub auction_type: AuctionType,
}

impl Card {
    pub fn new(color: Color, auction_type: AuctionType) -> Self {
        Self {
            color,
            auction_type,
        }
    }

    /// One card of each (color, auction type) pair, color-major
    pub fn distinct() -> impl Iterator<Item = Card> {
        Color::ALL.into_iter().flat_map(|color| {
            AuctionType::ALL
                .into_iter()
                .map(move |auction_type| Card::new(color, auction_type))
        })
    }

    /// The unshuffled full deck: the distinct cards repeated four times
    pub fn full_deck() -> Vector<Card> {
        (0..COPIES_PER_CARD).flat_map(|_| Card::distinct()).collect()
    }
}
