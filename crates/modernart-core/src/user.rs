//! Players and their holdings.

use crate::card::Card;
use im::Vector;
use serde::{Deserialize, Serialize};

/// Users are keyed by an opaque id handed out by the session layer
pub type UserId = String;

/// A player at the table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    /// May go negative; there is no floor on spending
    #[serde(default)]
    pub money: i64,
    /// Hand, in draw order
    #[serde(default)]
    pub cards: Vector<Card>,
}

impl User {
    /// Create a user with an empty hand and no money
    pub fn new(id: impl Into<UserId>, name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
            money: 0,
            cards: Vector::new(),
        }
    }

    /// Remove and return the card at `idx`, if there is one
    pub fn take_card(&mut self, idx: usize) -> Option<Card> {
        if idx < self.cards.len() {
            Some(self.cards.remove(idx))
        } else {
            None
        }
    }
}
