//! Legality checks run before any transition.
//!
//! The validator only looks at the shape of the state (is the game started,
//! is there an auction and in which status). Whether the event can actually
//! be carried out is left to the transition itself.

use crate::event::{Event, EventKind};
use crate::game::{GameError, GameState};
use crate::rules::StartAuctionPolicy;

/// Check whether `event` may be applied to `state`
pub fn validate(state: &GameState, event: &Event) -> Result<(), GameError> {
    match &event.kind {
        EventKind::StartGame => {
            if state.started {
                return Err(GameError::GameAlreadyStarted);
            }
        }

        EventKind::SubmitBid(_) | EventKind::FinishAuction => match &state.current_auction {
            None => return Err(GameError::NoAuction),
            Some(auction) if auction.is_closed() => return Err(GameError::AuctionClosed),
            Some(_) => {}
        },

        EventKind::StartAuction(_) => match &state.current_auction {
            Some(auction) if auction.is_pending() => {
                return Err(GameError::AuctionInProgress);
            }
            Some(_) => {}
            None => {
                if state.rules.start_auction == StartAuctionPolicy::RequireClosed {
                    return Err(GameError::NoAuction);
                }
            }
        },

        EventKind::UpdateName(_) | EventKind::Step(_) | EventKind::Unknown { .. } => {}
    }

    Ok(())
}
