//! Core domain entities for the auction engine.
//!
//! The auction status machine:
//!
//! ```text
//! [SCHEDULED] ──start reached──→ [ACTIVE] ──end, reserve met──→ [ENDED] ──capture──→ [SETTLED]
//!      │                            │
//!      │                            └──end, reserve unmet──→ [RESERVE_NOT_MET]
//!      └────────────seller cancel (no accepted bids)──→ [CANCELLED]
//! ```
//!
//! Rows are never deleted; `Settled` and `Cancelled` are terminal.

// Re-export from atelier-types for convenience
pub use atelier_types::{ArtworkId, AuctionId, BidId, Money, Timestamp, UserId};

use serde::{Deserialize, Serialize};

/// Auction lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionStatus {
    /// Created with a future start time; not yet open for bids.
    Scheduled,
    /// Open for bids.
    Active,
    /// Past end time with reserve satisfied (or no reserve); the highest
    /// bidder, if any, is the declared winner awaiting settlement.
    Ended,
    /// Past end time without meeting the reserve; no winner.
    ReserveNotMet,
    /// Settlement confirmed; fully immutable.
    Settled,
    /// Cancelled by the seller before completion.
    Cancelled,
}

impl AuctionStatus {
    /// Returns true for states that admit no further transition.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Settled | Self::Cancelled)
    }
}

/// A time-bounded sale of one artwork via competitive bidding.
///
/// Mutated only by the bidding coordinator (accepted bids) and the lifecycle
/// scheduler (time transitions), always under the auction's exclusive section
/// and through a version-checked store commit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Auction {
    /// Unique identifier.
    pub id: AuctionId,
    /// The artwork being sold; details live in the catalog.
    pub artwork_id: ArtworkId,
    /// The selling artist.
    pub seller_id: UserId,
    /// Opening price; the first bid may equal it.
    pub starting_bid: Money,
    /// Minimum acceptable final price. None means no reserve.
    pub reserve_price: Option<Money>,
    /// Standing price. Equals `starting_bid` until the first accepted bid.
    pub current_bid: Money,
    /// Smallest allowed step above `current_bid` for a later bid.
    pub min_increment: Money,
    /// When bidding opens (ms since epoch, server clock).
    pub start_time: Timestamp,
    /// When bidding closes. Always after `start_time`.
    pub end_time: Timestamp,
    /// Lifecycle status.
    pub status: AuctionStatus,
    /// Count of accepted bids. Consistent with the ledger.
    pub total_bid_count: u64,
    /// Bidder of the latest accepted bid, if any.
    pub highest_bidder: Option<UserId>,
    /// Optimistic-concurrency stamp; bumped on every committed mutation.
    pub version: u64,
    /// Set once the one-shot ending-soon notification has fired.
    pub ending_soon_notified: bool,
}

impl Auction {
    /// Creates a new auction row. Status is `Active` when `start_time` has
    /// already passed, otherwise `Scheduled`. Schedule and price validation
    /// happens at the engine boundary before this is called.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        artwork_id: ArtworkId,
        seller_id: UserId,
        starting_bid: Money,
        reserve_price: Option<Money>,
        min_increment: Money,
        start_time: Timestamp,
        end_time: Timestamp,
        now: Timestamp,
    ) -> Self {
        let status = if now >= start_time {
            AuctionStatus::Active
        } else {
            AuctionStatus::Scheduled
        };
        Self {
            id: AuctionId::new(),
            artwork_id,
            seller_id,
            starting_bid,
            reserve_price,
            current_bid: starting_bid,
            min_increment,
            start_time,
            end_time,
            status,
            total_bid_count: 0,
            highest_bidder: None,
            version: 1,
            ending_soon_notified: false,
        }
    }

    /// Returns true while the auction accepts bids at `now`.
    #[must_use]
    pub fn is_open_for_bids(&self, now: Timestamp) -> bool {
        self.status == AuctionStatus::Active && now >= self.start_time && now < self.end_time
    }

    /// Returns true once `now` has reached the closing boundary.
    #[must_use]
    pub fn is_past_end(&self, now: Timestamp) -> bool {
        now >= self.end_time
    }

    /// Returns true when at least one bid has been accepted.
    #[must_use]
    pub fn has_bids(&self) -> bool {
        self.total_bid_count > 0
    }

    /// Whether the reserve condition holds for the standing price. An auction
    /// with no accepted bids only satisfies a reserve at or below its
    /// starting bid, since `current_bid` still equals `starting_bid`.
    #[must_use]
    pub fn reserve_met(&self) -> bool {
        match self.reserve_price {
            Some(reserve) => self.current_bid >= reserve,
            None => true,
        }
    }

    /// Applies an accepted bid to the row: price, standing bidder, counter,
    /// and version stamp. The caller has already validated the amount.
    pub fn apply_accepted_bid(&mut self, bidder: UserId, amount: Money) {
        self.current_bid = amount;
        self.highest_bidder = Some(bidder);
        self.total_bid_count += 1;
        self.version += 1;
    }
}

/// Outcome recorded for every bid attempt that reached validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BidOutcome {
    /// The bid committed and became the standing price.
    Accepted,
    /// The bid lost the commit race twice and was never applied.
    RejectedStale,
    /// The amount did not clear the required minimum (or the bidder was
    /// already standing highest under a no-self-outbid policy).
    RejectedBelowMinimum,
    /// The auction was not open for bids at arrival time.
    RejectedAuctionClosed,
}

impl BidOutcome {
    /// Returns true for the accepted outcome.
    #[must_use]
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// One bid attempt. Immutable once written; rejected attempts are recorded
/// alongside accepted ones for audit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bid {
    /// Unique identifier.
    pub id: BidId,
    /// The auction bid on.
    pub auction_id: AuctionId,
    /// Monotonic per-auction sequence across all attempts.
    pub sequence: u64,
    /// Who bid.
    pub bidder_id: UserId,
    /// Offered amount.
    pub amount: Money,
    /// Server arrival time; never client-supplied.
    pub submitted_at: Timestamp,
    /// Validation outcome.
    pub outcome: BidOutcome,
}

impl Bid {
    /// Builds a bid row for the given attempt.
    pub fn new(
        auction_id: AuctionId,
        sequence: u64,
        bidder_id: UserId,
        amount: Money,
        submitted_at: Timestamp,
        outcome: BidOutcome,
    ) -> Self {
        Self {
            id: BidId::new(),
            auction_id,
            sequence,
            bidder_id,
            amount,
            submitted_at,
            outcome,
        }
    }
}

/// Subscription of a user to an auction's events. A weak relation: it confers
/// no ownership and only drives fan-out targeting and the displayed watcher
/// count.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Watch {
    /// The watched auction.
    pub auction_id: AuctionId,
    /// The subscribed user.
    pub watcher_id: UserId,
    /// When the watch was created.
    pub created_at: Timestamp,
}
