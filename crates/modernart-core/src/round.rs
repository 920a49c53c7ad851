//! Round lifecycle and scoring.
//!
//! A round ends when a sixth painting of a color is offered after five have
//! been sold. Colors are then ranked by paintings sold; the top three are
//! worth 30, 20 and 10 points and every painting a user bought this round
//! scores the value of its color.

use crate::auction::Auction;
use crate::card::{Card, Color};
use crate::user::UserId;
use im::{OrdMap, Vector};
use serde::{Deserialize, Serialize};

/// Sold paintings of one color after which the next offer ends the round
pub const ROUND_CLOSE_THRESHOLD: usize = 5;

/// Points for the first, second and third most sold colors
pub const PLACE_VALUES: [i64; 3] = [30, 20, 10];

/// One user's share of a round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundUser {
    /// Paintings won this round, in purchase order
    #[serde(default)]
    pub acquired_art: Vector<Card>,
    /// Set when the round closes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
}

/// A scoring epoch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    #[serde(default)]
    pub auctions: Vector<Auction>,
    #[serde(default)]
    pub users: OrdMap<UserId, RoundUser>,
    /// Points per color, set when the round closes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub places: Option<OrdMap<Color, i64>>,
    /// The painting whose offer ended the round. It is never auctioned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing_painting: Option<Card>,
}

impl Round {
    /// An empty round with an empty collection for each user
    pub fn new<'a>(user_ids: impl IntoIterator<Item = &'a UserId>) -> Self {
        Self {
            auctions: Vector::new(),
            users: user_ids
                .into_iter()
                .map(|id| (id.clone(), RoundUser::default()))
                .collect(),
            places: None,
            closing_painting: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.places.is_some()
    }

    /// Number of auctions of `color` recorded this round
    pub fn sold_count(&self, color: Color) -> usize {
        self.auctions
            .iter()
            .filter(|auction| auction.painting.color == color)
            .count()
    }

    /// Whether offering a painting of `color` ends the round
    pub fn closes_on(&self, color: Color) -> bool {
        self.sold_count(color) == ROUND_CLOSE_THRESHOLD
    }

    /// Colors sold at least once, most sold first. Equal counts keep palette
    /// order, so the earlier color wins the tie.
    pub fn color_ranking(&self) -> Vec<Color> {
        let mut counts: Vec<(Color, usize)> = Color::ALL
            .iter()
            .map(|&color| (color, self.sold_count(color)))
            .filter(|&(_, count)| count > 0)
            .collect();
        // stable: ties stay in palette order
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.into_iter().map(|(color, _)| color).collect()
    }

    /// Points per color for the current auctions. Every palette color is
    /// present; unplaced colors are worth 0.
    pub fn compute_places(&self) -> OrdMap<Color, i64> {
        let mut places: OrdMap<Color, i64> = Color::ALL.iter().map(|&c| (c, 0)).collect();
        for (color, value) in self.color_ranking().into_iter().zip(PLACE_VALUES) {
            places.insert(color, value);
        }
        places
    }

    /// Record a settled auction: the closed record replaces the trailing
    /// pending one and the painting joins the winner's collection.
    pub fn record_sale(&mut self, closed: Auction, winner: &UserId) {
        let painting = closed.painting;
        match self.auctions.back() {
            Some(last) if last.is_pending() => {
                let idx = self.auctions.len() - 1;
                self.auctions.set(idx, closed);
            }
            _ => self.auctions.push_back(closed),
        }
        self.users
            .entry(winner.clone())
            .or_insert_with(RoundUser::default)
            .acquired_art
            .push_back(painting);
    }

    /// The closed version of this round: places and per-user scores filled
    /// in, with `closing` kept as the round's closing painting
    pub fn close(&self, closing: Card) -> Round {
        let places = self.compute_places();
        let users = self
            .users
            .iter()
            .map(|(id, user)| {
                let score = user
                    .acquired_art
                    .iter()
                    .map(|card| places.get(&card.color).copied().unwrap_or(0))
                    .sum();
                (
                    id.clone(),
                    RoundUser {
                        acquired_art: user.acquired_art.clone(),
                        score: Some(score),
                    },
                )
            })
            .collect();

        Round {
            auctions: self.auctions.clone(),
            users,
            places: Some(places),
            closing_painting: Some(closing),
        }
    }

    /// Score of `user` once the round is closed
    pub fn score_of(&self, user: &str) -> Option<i64> {
        self.users.get(user).and_then(|u| u.score)
    }
}
