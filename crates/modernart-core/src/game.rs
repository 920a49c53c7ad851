//! Core game state machine.
//!
//! This module contains the main `GameState` struct, the transition function
//! and the reducer that folds events into successive states.
//!
//! States are values: every transition builds a new `GameState` and leaves the
//! previous one untouched. Collections are persistent (`im`), so a successor
//! shares everything it did not change with its predecessor.

use crate::auction::{Auction, NO_PAYMENT};
use crate::card::Card;
use crate::deck;
use crate::event::{BidParams, Event, EventKind, StartAuctionParams, StepParams, UpdateNameParams};
use crate::round::Round;
use crate::rules::{Rules, Settlement};
use crate::user::{User, UserId};
use crate::validate;
use im::{OrdMap, Vector};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

/// Errors that can occur when applying events
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Game already started")]
    GameAlreadyStarted,

    #[error("No auction")]
    NoAuction,

    #[error("Auction is closed")]
    AuctionClosed,

    #[error("An auction is already in progress")]
    AuctionInProgress,

    #[error("Bid of {bid} does not beat {highest}")]
    BidTooLow { bid: i64, highest: i64 },

    #[error("Auction has no bidder")]
    NoWinner,

    #[error("Cards already dealt this round")]
    RoundAlreadyStarted,

    #[error("Unsupported event: {0}")]
    UnsupportedEvent(String),

    #[error("Unknown user: {0}")]
    UnknownUser(UserId),

    #[error("User {user} has no card at index {idx}")]
    CardIndexOutOfRange { user: UserId, idx: usize },

    #[error("Round {0} does not exist")]
    MissingRound(u32),

    #[error("Settling would overflow the balance of {user}")]
    MoneyOverflow { user: UserId },
}

/// How an error affects the reducer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The validator refused the event
    Invalid,
    /// The event is legal but has nothing to act on
    NotApplicable,
    /// The event refers to state that does not exist
    Fault,
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::GameAlreadyStarted
            | GameError::NoAuction
            | GameError::AuctionClosed
            | GameError::AuctionInProgress => ErrorKind::Invalid,
            GameError::BidTooLow { .. }
            | GameError::NoWinner
            | GameError::RoundAlreadyStarted
            | GameError::UnsupportedEvent(_) => ErrorKind::NotApplicable,
            GameError::UnknownUser(_)
            | GameError::CardIndexOutOfRange { .. }
            | GameError::MissingRound(_)
            | GameError::MoneyOverflow { .. } => ErrorKind::Fault,
        }
    }
}

/// Result of applying one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The successor state
    Applied(GameState),
    /// Refused by the validator, or nothing to do
    Rejected(GameError),
    /// The event referenced missing state
    Faulted(GameError),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    /// The error behind a non-applied outcome
    pub fn error(&self) -> Option<&GameError> {
        match self {
            Outcome::Applied(_) => None,
            Outcome::Rejected(err) | Outcome::Faulted(err) => Some(err),
        }
    }
}

/// An applied event with the time it took effect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub event: Event,
}

/// The complete game state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameState {
    /// Whether `start_game` has been applied
    pub started: bool,
    pub users: OrdMap<UserId, User>,
    pub round_index: u32,
    /// Whether cards have been dealt for the current round
    pub round_started: bool,
    /// Every round so far; only the current one changes
    pub rounds: OrdMap<u32, Round>,
    /// The in-flight auction, or the last one settled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_auction: Option<Auction>,
    /// Undealt cards
    pub deck: Vector<Card>,
    pub log: Vector<LogEntry>,
    pub rules: Rules,
}

impl GameState {
    /// An empty table with default rules
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty table playing by `rules`
    pub fn with_rules(rules: Rules) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }

    pub fn player_count(&self) -> usize {
        self.users.len()
    }

    pub fn get_user(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }

    pub fn current_round(&self) -> Option<&Round> {
        self.rounds.get(&self.round_index)
    }

    /// Cards in the deck, in hands, on auction records and closing rounds.
    /// Always 0 before the first deal and the full deck after it.
    pub fn card_count(&self) -> usize {
        let in_hands: usize = self.users.values().map(|u| u.cards.len()).sum();
        let in_rounds: usize = self
            .rounds
            .values()
            .map(|r| r.auctions.len() + usize::from(r.closing_painting.is_some()))
            .sum();
        self.deck.len() + in_hands + in_rounds
    }

    /// Sum of a user's scores over all closed rounds
    pub fn total_score(&self, user: &str) -> i64 {
        self.rounds.values().filter_map(|r| r.score_of(user)).sum()
    }

    /// Check whether `event` is legal in this state
    pub fn validate(&self, event: &Event) -> Result<(), GameError> {
        validate::validate(self, event)
    }

    pub fn is_valid(&self, event: &Event) -> bool {
        self.validate(event).is_ok()
    }

    /// Apply an event, using the current time for events without a timestamp
    pub fn apply(&self, event: &Event) -> Outcome {
        self.apply_at(event, now_millis())
    }

    /// Validate and transition. `now` stamps the log entry of events that
    /// carry no timestamp.
    pub fn apply_at(&self, event: &Event, now: i64) -> Outcome {
        if let Err(err) = self.validate(event) {
            return Outcome::Rejected(err);
        }

        match self.transition(event) {
            Ok(mut next) => {
                next.log.push_back(LogEntry {
                    timestamp: event.timestamp.unwrap_or(now),
                    event: event.clone(),
                });
                Outcome::Applied(next)
            }
            Err(err) if err.kind() == ErrorKind::Fault => Outcome::Faulted(err),
            Err(err) => Outcome::Rejected(err),
        }
    }

    /// The state after `event`; unchanged if the event is rejected or faults
    pub fn reduce(&self, event: &Event) -> GameState {
        self.reduce_at(event, now_millis())
    }

    /// [`GameState::reduce`] with an explicit clock
    pub fn reduce_at(&self, event: &Event, now: i64) -> GameState {
        match self.apply_at(event, now) {
            Outcome::Applied(next) => {
                debug!(event = event.name(), "applied event");
                next
            }
            Outcome::Rejected(err) if err.kind() == ErrorKind::NotApplicable => {
                debug!(event = event.name(), reason = %err, "nothing to apply");
                self.clone()
            }
            Outcome::Rejected(err) => {
                warn!(event = event.name(), error = %err, "skipping invalid event");
                self.clone()
            }
            Outcome::Faulted(err) => {
                error!(event = event.name(), error = %err, "failed to reduce");
                self.clone()
            }
        }
    }

    /// Fold a sequence of events
    pub fn reduce_all<'a>(&self, events: impl IntoIterator<Item = &'a Event>) -> GameState {
        events
            .into_iter()
            .fold(self.clone(), |state, event| state.reduce(event))
    }

    /// Compute the successor state without validating first
    pub fn transition(&self, event: &Event) -> Result<GameState, GameError> {
        match &event.kind {
            EventKind::StartGame => Ok(self.start_game()),
            EventKind::SubmitBid(params) => self.submit_bid(params),
            EventKind::FinishAuction => self.finish_auction(),
            EventKind::UpdateName(params) => Ok(self.update_name(params)),
            EventKind::Step(params) => self.step(params),
            EventKind::StartAuction(params) => self.start_auction(params),
            EventKind::Unknown { kind, .. } => Err(GameError::UnsupportedEvent(kind.clone())),
        }
    }

    // ==================== Transitions ====================

    fn start_game(&self) -> GameState {
        let money = self.rules.starting_money;
        let mut next = self.clone();
        next.users = self
            .users
            .iter()
            .map(|(id, user)| (id.clone(), User { money, ..user.clone() }))
            .collect();
        next.rounds = OrdMap::unit(0, Round::new(self.users.keys()));
        next.started = true;
        next
    }

    fn submit_bid(&self, params: &BidParams) -> Result<GameState, GameError> {
        let mut auction = self.current_auction.clone().ok_or(GameError::NoAuction)?;
        let highest = auction.highest_bid;
        if !auction.bid(&params.user_id, params.bid_amount) {
            return Err(GameError::BidTooLow {
                bid: params.bid_amount,
                highest,
            });
        }

        let mut next = self.clone();
        if let Some(round) = next.rounds.get_mut(&self.round_index) {
            if let Some(last) = round.auctions.back() {
                if last.is_pending() {
                    let idx = round.auctions.len() - 1;
                    round.auctions.set(idx, auction.clone());
                }
            }
        }
        next.current_auction = Some(auction);
        Ok(next)
    }

    fn finish_auction(&self) -> Result<GameState, GameError> {
        let auction = self.current_auction.as_ref().ok_or(GameError::NoAuction)?;
        let closed = auction.close().ok_or(GameError::NoWinner)?;
        let winner = closed.winner.clone().ok_or(GameError::NoWinner)?;
        let auctioneer = closed.auctioneer.clone();
        let payment = closed.payment.unwrap_or(NO_PAYMENT);

        let winner_money = self
            .users
            .get(&winner)
            .map(|u| u.money)
            .ok_or_else(|| GameError::UnknownUser(winner.clone()))?;
        let auctioneer_money = self
            .users
            .get(&auctioneer)
            .map(|u| u.money)
            .ok_or_else(|| GameError::UnknownUser(auctioneer.clone()))?;
        let mut round = self
            .current_round()
            .cloned()
            .ok_or(GameError::MissingRound(self.round_index))?;

        let overflow = |user: &UserId| GameError::MoneyOverflow { user: user.clone() };

        let mut next = self.clone();
        // Both balances come from the prior state, so a user who buys their
        // own painting is settled once.
        match self.rules.settlement {
            Settlement::DebitBoth => {
                let winner_after = winner_money
                    .checked_sub(payment)
                    .ok_or_else(|| overflow(&winner))?;
                let auctioneer_after = auctioneer_money
                    .checked_sub(payment)
                    .ok_or_else(|| overflow(&auctioneer))?;
                next.set_money(&winner, winner_after);
                next.set_money(&auctioneer, auctioneer_after);
            }
            Settlement::PayAuctioneer => {
                if winner != auctioneer {
                    let winner_after = winner_money
                        .checked_sub(payment)
                        .ok_or_else(|| overflow(&winner))?;
                    let auctioneer_after = auctioneer_money
                        .checked_add(payment)
                        .ok_or_else(|| overflow(&auctioneer))?;
                    next.set_money(&winner, winner_after);
                    next.set_money(&auctioneer, auctioneer_after);
                }
            }
        }

        round.record_sale(closed.clone(), &winner);
        next.rounds.insert(self.round_index, round);
        next.current_auction = Some(closed);

        debug!(%winner, %auctioneer, payment, "auction settled");
        Ok(next)
    }

    fn update_name(&self, params: &UpdateNameParams) -> GameState {
        let user = match self.users.get(&params.id) {
            Some(existing) => User {
                name: params.name.clone(),
                icon: params.icon.clone(),
                ..existing.clone()
            },
            None => User::new(params.id.clone(), params.name.clone(), params.icon.clone()),
        };

        let mut next = self.clone();
        next.users.insert(params.id.clone(), user);
        next
    }

    fn step(&self, params: &StepParams) -> Result<GameState, GameError> {
        if self.round_started {
            return Err(GameError::RoundAlreadyStarted);
        }

        let seed = params.seed.clone().unwrap_or_default();
        // The deck is built and shuffled once, for the first round. Later
        // rounds deal from what is left of it.
        let mut remaining = if self.round_index == 0 {
            deck::shuffled_deck(&seed)
        } else {
            self.deck.clone()
        };
        let count = deck::cards_to_deal(self.player_count(), self.round_index);

        let mut next = self.clone();
        next.users = self
            .users
            .iter()
            .map(|(id, user)| {
                let mut user = user.clone();
                user.cards.append(deck::draw(&mut remaining, count));
                (id.clone(), user)
            })
            .collect();
        next.deck = remaining;
        next.round_started = true;

        info!(
            round = self.round_index,
            players = self.player_count(),
            per_player = count,
            left = next.deck.len(),
            "dealt cards"
        );
        Ok(next)
    }

    fn start_auction(&self, params: &StartAuctionParams) -> Result<GameState, GameError> {
        let mut user = self
            .users
            .get(&params.user_id)
            .cloned()
            .ok_or_else(|| GameError::UnknownUser(params.user_id.clone()))?;
        let card = user
            .take_card(params.idx)
            .ok_or_else(|| GameError::CardIndexOutOfRange {
                user: params.user_id.clone(),
                idx: params.idx,
            })?;
        let round = self
            .current_round()
            .ok_or(GameError::MissingRound(self.round_index))?;

        let mut next = self.clone();
        next.users.insert(params.user_id.clone(), user);

        if round.closes_on(card.color) {
            let closed = round.close(card);
            info!(
                round = self.round_index,
                color = %card.color,
                places = ?closed.places,
                "round closed"
            );
            next.rounds.insert(self.round_index, closed);
            next.round_index = self.round_index + 1;
            next.rounds.insert(next.round_index, Round::new(self.users.keys()));
            next.round_started = false;
            return Ok(next);
        }

        let auction = Auction::open(params.user_id.clone(), card);
        let mut round = round.clone();
        round.auctions.push_back(auction.clone());
        next.rounds.insert(self.round_index, round);
        next.current_auction = Some(auction);
        Ok(next)
    }

    // ==================== Helper Methods ====================

    fn set_money(&mut self, id: &str, money: i64) {
        if let Some(user) = self.users.get_mut(id) {
            user.money = money;
        }
    }
}

/// Milliseconds since the Unix epoch
fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{AuctionType, Color};
    use crate::rng::Seed;

    const NOW: i64 = 1_000;

    fn table(n: usize) -> GameState {
        (1..=n).fold(GameState::new(), |state, i| {
            state.reduce_at(&Event::update_name(format!("u{}", i), format!("P{}", i), ""), NOW)
        })
    }

    fn started(n: usize) -> GameState {
        table(n).reduce_at(&Event::start_game(), NOW)
    }

    fn dealt(n: usize) -> GameState {
        started(n).reduce_at(&Event::step(Some(Seed::Number(1))), NOW)
    }

    fn give(state: &mut GameState, user: &str, cards: &[Color]) {
        let u = state.users.get_mut(user).unwrap();
        u.cards = cards
            .iter()
            .map(|&c| Card::new(c, AuctionType::Open))
            .collect();
    }

    #[test]
    fn test_start_game_sets_money_and_round() {
        let state = started(4);
        assert!(state.started);
        assert!(state.users.values().all(|u| u.money == 100));
        let round = &state.rounds[&0];
        assert!(round.auctions.is_empty());
        assert_eq!(round.users.len(), 4);
    }

    #[test]
    fn test_start_game_twice_is_rejected() {
        let state = started(2);
        let outcome = state.apply_at(&Event::start_game(), NOW);
        assert_eq!(outcome, Outcome::Rejected(GameError::GameAlreadyStarted));
    }

    #[test]
    fn test_update_name_preserves_holdings() {
        let mut state = started(1);
        give(&mut state, "u1", &[Color::Red]);
        let next = state.reduce_at(&Event::update_name("u1", "Renamed", "star"), NOW);
        let user = &next.users["u1"];
        assert_eq!(user.name, "Renamed");
        assert_eq!(user.icon, "star");
        assert_eq!(user.money, 100);
        assert_eq!(user.cards.len(), 1);
    }

    #[test]
    fn test_step_deals_once() {
        let state = dealt(4);
        assert!(state.round_started);
        assert!(state.users.values().all(|u| u.cards.len() == 10));
        assert!(state.deck.is_empty());

        let outcome = state.apply_at(&Event::step(None), NOW);
        assert_eq!(outcome, Outcome::Rejected(GameError::RoundAlreadyStarted));
    }

    #[test]
    fn test_step_with_three_players_leaves_deck() {
        let state = dealt(3);
        assert_eq!(state.deck.len(), 10);
        assert_eq!(state.card_count(), 40);
    }

    #[test]
    fn test_bid_too_low_is_not_applicable() {
        let state = dealt(2)
            .reduce_at(&Event::start_auction("u1", 0), NOW)
            .reduce_at(&Event::submit_bid("u2", 10), NOW);
        let outcome = state.apply_at(&Event::submit_bid("u1", 10), NOW);
        assert_eq!(
            outcome,
            Outcome::Rejected(GameError::BidTooLow { bid: 10, highest: 10 })
        );
    }

    #[test]
    fn test_bids_mirror_round_record() {
        let state = dealt(2)
            .reduce_at(&Event::start_auction("u1", 0), NOW)
            .reduce_at(&Event::submit_bid("u2", 25), NOW);
        let round = state.current_round().unwrap();
        assert_eq!(round.auctions.len(), 1);
        assert_eq!(round.auctions[0].highest_bid, 25);
        assert_eq!(state.current_auction.as_ref(), round.auctions.back());
    }

    #[test]
    fn test_finish_without_bids_is_not_applicable() {
        let state = dealt(2).reduce_at(&Event::start_auction("u1", 0), NOW);
        let outcome = state.apply_at(&Event::finish_auction(), NOW);
        assert_eq!(outcome, Outcome::Rejected(GameError::NoWinner));
    }

    #[test]
    fn test_finish_with_unknown_bidder_faults() {
        let state = dealt(2)
            .reduce_at(&Event::start_auction("u1", 0), NOW)
            .reduce_at(&Event::submit_bid("ghost", 5), NOW);
        let outcome = state.apply_at(&Event::finish_auction(), NOW);
        assert_eq!(
            outcome,
            Outcome::Faulted(GameError::UnknownUser("ghost".into()))
        );
        assert_eq!(state.reduce_at(&Event::finish_auction(), NOW), state);
    }

    #[test]
    fn test_pay_auctioneer_settlement() {
        let mut state = table(2);
        state.rules.settlement = Settlement::PayAuctioneer;
        let state = state
            .reduce_at(&Event::start_game(), NOW)
            .reduce_at(&Event::step(None), NOW)
            .reduce_at(&Event::start_auction("u1", 0), NOW)
            .reduce_at(&Event::submit_bid("u2", 30), NOW)
            .reduce_at(&Event::finish_auction(), NOW);
        assert_eq!(state.users["u1"].money, 130);
        assert_eq!(state.users["u2"].money, 70);
    }

    /// Sell u1's first card to u2 for `amount`
    fn sold(state: GameState, amount: i64) -> GameState {
        state
            .reduce_at(&Event::start_auction("u1", 0), NOW)
            .reduce_at(&Event::submit_bid("u2", amount), NOW)
            .reduce_at(&Event::finish_auction(), NOW)
    }

    #[test]
    fn test_debit_overflow_faults() {
        // the first sale takes u2 to 100 - MAX, the second cannot be paid
        let state = sold(dealt(2), i64::MAX);
        assert_eq!(state.users["u2"].money, 100 - i64::MAX);

        let pending = state
            .reduce_at(&Event::start_auction("u1", 0), NOW)
            .reduce_at(&Event::submit_bid("u2", i64::MAX), NOW);
        assert_eq!(
            pending.apply_at(&Event::finish_auction(), NOW),
            Outcome::Faulted(GameError::MoneyOverflow { user: "u2".into() })
        );
        assert_eq!(pending.reduce_at(&Event::finish_auction(), NOW), pending);
    }

    #[test]
    fn test_pay_auctioneer_overflow_faults() {
        let mut state = table(2);
        state.rules.settlement = Settlement::PayAuctioneer;
        let pending = state
            .reduce_at(&Event::start_game(), NOW)
            .reduce_at(&Event::step(None), NOW)
            .reduce_at(&Event::start_auction("u1", 0), NOW)
            .reduce_at(&Event::submit_bid("u2", i64::MAX), NOW);

        assert_eq!(
            pending.apply_at(&Event::finish_auction(), NOW),
            Outcome::Faulted(GameError::MoneyOverflow { user: "u1".into() })
        );
        assert_eq!(pending.reduce_at(&Event::finish_auction(), NOW), pending);
        assert_eq!(pending.users["u1"].money, 100);
    }

    #[test]
    fn test_buying_own_painting_settles_once() {
        let state = dealt(2)
            .reduce_at(&Event::start_auction("u1", 0), NOW)
            .reduce_at(&Event::submit_bid("u1", 15), NOW)
            .reduce_at(&Event::finish_auction(), NOW);
        assert_eq!(state.users["u1"].money, 85);
        assert_eq!(state.users["u2"].money, 100);
    }

    #[test]
    fn test_start_auction_faults() {
        let state = dealt(2);
        assert_eq!(
            state.apply_at(&Event::start_auction("nobody", 0), NOW),
            Outcome::Faulted(GameError::UnknownUser("nobody".into()))
        );
        assert_eq!(
            state.apply_at(&Event::start_auction("u1", 10), NOW),
            Outcome::Faulted(GameError::CardIndexOutOfRange {
                user: "u1".into(),
                idx: 10
            })
        );
    }

    #[test]
    fn test_start_auction_before_start_game_faults() {
        let mut state = table(1);
        give(&mut state, "u1", &[Color::Red]);
        assert_eq!(
            state.apply_at(&Event::start_auction("u1", 0), NOW),
            Outcome::Faulted(GameError::MissingRound(0))
        );
    }

    #[test]
    fn test_unknown_event_leaves_state() {
        let state = started(2);
        let event = Event::from_json(r#"{"type":"emote","params":{"icon":"wave"}}"#).unwrap();
        assert!(state.is_valid(&event));
        assert_eq!(
            state.apply_at(&event, NOW),
            Outcome::Rejected(GameError::UnsupportedEvent("emote".into()))
        );
    }

    #[test]
    fn test_log_records_applied_events() {
        let state = table(1);
        assert_eq!(state.log.len(), 1);
        assert_eq!(state.log[0].timestamp, NOW);

        let next = state.reduce_at(&Event::start_game().at(42), NOW);
        assert_eq!(next.log.len(), 2);
        assert_eq!(next.log[1].timestamp, 42);
        assert_eq!(next.log[1].event, Event::start_game().at(42));

        // rejected events are not logged
        let again = next.reduce_at(&Event::start_game(), NOW);
        assert_eq!(again.log.len(), 2);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(GameError::AuctionClosed.kind(), ErrorKind::Invalid);
        assert_eq!(GameError::NoWinner.kind(), ErrorKind::NotApplicable);
        // legal no-ops are logged quietly, unlike validator refusals
        assert_eq!(
            GameError::BidTooLow { bid: 5, highest: 5 }.kind(),
            ErrorKind::NotApplicable
        );
        assert_eq!(
            GameError::UnsupportedEvent("emote".into()).kind(),
            ErrorKind::NotApplicable
        );
        assert_eq!(GameError::MissingRound(3).kind(), ErrorKind::Fault);
        assert_eq!(
            GameError::MoneyOverflow { user: "u1".into() }.kind(),
            ErrorKind::Fault
        );
    }

    #[test]
    fn test_state_json_shape() {
        let state = dealt(1);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["started"], true);
        assert_eq!(json["roundIndex"], 0);
        assert_eq!(json["roundStarted"], true);
        assert!(json["rounds"]["0"]["auctions"].is_array());
        assert!(json.get("currentAuction").is_none());
        assert_eq!(json["users"]["u1"]["money"], 100);

        let back: GameState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
