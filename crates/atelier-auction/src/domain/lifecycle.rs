//! Pure time-based lifecycle computation.
//!
//! The scheduler and the lazy read path both call `due_transition` in a loop
//! under the auction's exclusive section, applying and committing each step
//! until nothing is due. Transitions fire from their source state only, so a
//! repeated sweep over an already-transitioned auction is a no-op.

use super::entities::{Auction, AuctionStatus, Timestamp};

/// A time-based transition the lifecycle machinery can apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Scheduled -> Active: the start time has been reached.
    Open,
    /// Active -> Ended: past end time with reserve satisfied (or absent).
    /// The standing highest bidder, if any, becomes the declared winner.
    CloseSold,
    /// Active -> ReserveNotMet: past end time with the reserve unmet.
    CloseReserveNotMet,
}

/// Computes the next due transition for an auction at `now`, if any.
///
/// Returns at most one step; callers loop until `None` so a Scheduled auction
/// whose end time has also passed opens and closes in one sweep.
#[must_use]
pub fn due_transition(auction: &Auction, now: Timestamp) -> Option<Transition> {
    match auction.status {
        AuctionStatus::Scheduled if now >= auction.start_time => Some(Transition::Open),
        AuctionStatus::Active if auction.is_past_end(now) => {
            if auction.reserve_met() {
                Some(Transition::CloseSold)
            } else {
                Some(Transition::CloseReserveNotMet)
            }
        }
        _ => None,
    }
}

/// Applies a transition to the row and bumps its version stamp. The caller
/// commits the updated row with a version check.
pub fn apply_transition(auction: &mut Auction, transition: Transition) {
    auction.status = match transition {
        Transition::Open => AuctionStatus::Active,
        Transition::CloseSold => AuctionStatus::Ended,
        Transition::CloseReserveNotMet => AuctionStatus::ReserveNotMet,
    };
    auction.version += 1;
}
