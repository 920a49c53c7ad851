//! Modern Art - rules engine for a painting auction game
//!
//! Players take turns offering paintings from their hand, bid on them, and
//! score at the end of each round by how popular each color turned out to be.
//!
//! # Architecture
//!
//! The engine is a reducer: [`GameState::reduce`] takes a state and an
//! [`Event`] and returns the next state. States are immutable values, so a
//! rejected or faulty event simply yields the state it was applied to.
//! The engine does no I/O and can be compiled to:
//! - Native Rust for server-side hosting and replay
//! - WebAssembly for the browser client
//!
//! # Modules
//!
//! - [`card`]: Palette, paintings and the full deck
//! - [`rng`]: Seeded generator compatible with the client's shuffle
//! - [`deck`]: Shuffling and the per-round deal table
//! - [`auction`]: Auction lifecycle
//! - [`round`]: Round closing and scoring
//! - [`event`]: Event vocabulary and wire format
//! - [`validate`]: Legality checks
//! - [`game`]: Game state, transitions and the reducer

pub mod auction;
pub mod card;
pub mod deck;
pub mod event;
pub mod game;
pub mod rng;
pub mod round;
pub mod rules;
pub mod user;
pub mod validate;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use auction::{Auction, AuctionStatus, NO_PAYMENT};
pub use card::{AuctionType, Card, Color, DECK_SIZE};
pub use event::{Event, EventError, EventKind};
pub use game::{ErrorKind, GameError, GameState, LogEntry, Outcome};
pub use rng::{Seed, SeededRng};
pub use round::{Round, RoundUser, PLACE_VALUES, ROUND_CLOSE_THRESHOLD};
pub use rules::{Rules, Settlement, StartAuctionPolicy, STARTING_MONEY};
pub use user::{User, UserId};
