//! Tunable rules.
//!
//! Defaults reproduce the table rules the client ships with. The alternatives
//! exist for house rules that tables have asked about.

use serde::{Deserialize, Serialize};

/// Money every user holds once the game starts
pub const STARTING_MONEY: i64 = 100;

/// How the payment of a finished auction moves money
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Settlement {
    /// Winner and auctioneer are both debited the payment
    #[default]
    DebitBoth,
    /// Winner pays the auctioneer
    PayAuctioneer,
}

/// Whether `start_auction` needs a previous auction to exist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartAuctionPolicy {
    /// Only a pending auction blocks a new one
    #[default]
    AllowFirst,
    /// A closed auction must already exist
    RequireClosed,
}

/// The rules a game is played under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Rules {
    pub starting_money: i64,
    pub settlement: Settlement,
    pub start_auction: StartAuctionPolicy,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            starting_money: STARTING_MONEY,
            settlement: Settlement::default(),
            start_auction: StartAuctionPolicy::default(),
        }
    }
}

impl Rules {
    /// Parse rules from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
