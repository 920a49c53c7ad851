//! Auction lifecycle.
//!
//! An auction opens PENDING when a user offers a painting, accepts any number
//! of bids, and is CLOSED explicitly. Nothing closes an auction on a timer.

use crate::card::Card;
use crate::user::UserId;
use serde::{Deserialize, Serialize};

/// Payment recorded when neither a bid nor a fixed price is available
pub const NO_PAYMENT: i64 = -1;

/// Auction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionStatus {
    Pending,
    Closed,
}

/// A single auction of one painting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    pub status: AuctionStatus,
    /// User who offered the painting
    pub auctioneer: UserId,
    pub painting: Card,
    pub highest_bid: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highest_bidder: Option<UserId>,
    /// Fallback payment when nobody bid. No event sets it yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<i64>,
}

impl Auction {
    /// Open a new auction with no bids
    pub fn open(auctioneer: impl Into<UserId>, painting: Card) -> Self {
        Self {
            status: AuctionStatus::Pending,
            auctioneer: auctioneer.into(),
            painting,
            highest_bid: 0,
            highest_bidder: None,
            fixed_price: None,
            winner: None,
            payment: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == AuctionStatus::Pending
    }

    pub fn is_closed(&self) -> bool {
        self.status == AuctionStatus::Closed
    }

    /// Record a bid. Only a strictly higher bid replaces the current one;
    /// returns whether it did.
    pub fn bid(&mut self, bidder: &str, amount: i64) -> bool {
        if amount > self.highest_bid {
            self.highest_bid = amount;
            self.highest_bidder = Some(bidder.to_string());
            true
        } else {
            false
        }
    }

    /// What the winner owes: the highest bid, else a non-zero fixed price,
    /// else [`NO_PAYMENT`]
    pub fn payment_due(&self) -> i64 {
        if self.highest_bid > 0 {
            return self.highest_bid;
        }
        match self.fixed_price {
            Some(price) if price != 0 => price,
            _ => NO_PAYMENT,
        }
    }

    /// The closed record of this auction, or `None` when nobody bid
    pub fn close(&self) -> Option<Auction> {
        let winner = self.highest_bidder.clone()?;
        Some(Auction {
            status: AuctionStatus::Closed,
            winner: Some(winner),
            payment: Some(self.payment_due()),
            ..self.clone()
        })
    }
}
