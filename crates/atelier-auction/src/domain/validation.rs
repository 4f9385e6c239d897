//! Pure bid acceptance decision.
//!
//! No side effects and no clock access: the caller supplies the auction
//! snapshot and `now`, which makes every rule independently testable.

use super::entities::{Auction, BidOutcome, Money, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a bid was not accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// The auction was not open for bids at arrival time.
    AuctionClosed,
    /// The amount did not clear the required minimum.
    BelowMinimum {
        /// The smallest amount that would have been accepted.
        minimum: Money,
    },
    /// The bidder already holds the standing highest bid and the policy
    /// forbids raising one's own bid.
    AlreadyHighestBidder,
}

impl RejectReason {
    /// The ledger outcome recorded for this rejection. Self-outbid attempts
    /// fall in the below-minimum class.
    #[must_use]
    pub fn outcome(self) -> BidOutcome {
        match self {
            Self::AuctionClosed => BidOutcome::RejectedAuctionClosed,
            Self::BelowMinimum { .. } | Self::AlreadyHighestBidder => {
                BidOutcome::RejectedBelowMinimum
            }
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuctionClosed => write!(f, "auction is not open for bids"),
            Self::BelowMinimum { minimum } => {
                write!(f, "bid must be at least {minimum}")
            }
            Self::AlreadyHighestBidder => write!(f, "bidder already holds the highest bid"),
        }
    }
}

/// Policy knobs the validator consults.
#[derive(Clone, Copy, Debug, Default)]
pub struct BidPolicy {
    /// Whether the standing highest bidder may raise their own bid.
    pub allow_self_outbid: bool,
}

/// The smallest amount a new bid must reach: the starting bid while no bid has
/// been accepted, one increment above the standing price afterwards.
#[must_use]
pub fn required_minimum(auction: &Auction) -> Money {
    if auction.has_bids() {
        auction
            .current_bid
            .checked_add(auction.min_increment)
            // Saturate at the top of the representable range; nothing clears it.
            .unwrap_or(Money::from_cents(u64::MAX))
    } else {
        auction.starting_bid
    }
}

/// Decides whether a proposed bid is acceptable against the given snapshot.
///
/// Rules, in order:
/// 1. The auction must be `Active` with `now` inside `[start_time, end_time)`.
/// 2. The amount must reach `required_minimum`.
/// 3. Unless allowed by policy, the bidder must not already be the standing
///    highest bidder.
pub fn validate_bid(
    auction: &Auction,
    bidder: UserId,
    amount: Money,
    now: Timestamp,
    policy: &BidPolicy,
) -> Result<(), RejectReason> {
    if !auction.is_open_for_bids(now) {
        return Err(RejectReason::AuctionClosed);
    }

    let minimum = required_minimum(auction);
    if amount < minimum {
        return Err(RejectReason::BelowMinimum { minimum });
    }

    if !policy.allow_self_outbid && auction.highest_bidder == Some(bidder) {
        return Err(RejectReason::AlreadyHighestBidder);
    }

    Ok(())
}
