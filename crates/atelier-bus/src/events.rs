//! # Marketplace Events
//!
//! Defines all event types that flow through the bus. Every variant is a
//! committed fact: publishers only emit after their state change has been
//! durably applied.

use atelier_types::{ArtworkId, AuctionId, Money, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MarketEvent {
    // =========================================================================
    // LIFECYCLE: emitted by the scheduler (and lazily by reads)
    // =========================================================================
    /// An auction opened for bidding (created active, or Scheduled -> Active).
    AuctionOpened {
        auction_id: AuctionId,
        artwork_id: ArtworkId,
        seller_id: UserId,
        end_time: Timestamp,
    },

    /// An active auction entered the closing window. Emitted once per auction.
    AuctionEndingSoon {
        auction_id: AuctionId,
        end_time: Timestamp,
    },

    /// An auction passed its end time with reserve satisfied (or no reserve).
    /// `winner` is None when no bid was ever accepted.
    AuctionEnded {
        auction_id: AuctionId,
        seller_id: UserId,
        winner: Option<UserId>,
        final_price: Money,
    },

    /// An auction passed its end time without meeting its reserve. No winner.
    ReserveNotMet {
        auction_id: AuctionId,
        seller_id: UserId,
        final_price: Money,
    },

    /// An auction was cancelled by its seller or an admin before completion.
    AuctionCancelled {
        auction_id: AuctionId,
        seller_id: UserId,
    },

    /// Settlement confirmed; the auction is fully immutable from here on.
    AuctionSettled { auction_id: AuctionId },

    // =========================================================================
    // BIDDING: emitted by the coordinator, one per accepted bid
    // =========================================================================
    /// A bid was accepted and committed. `previous_highest` is the bidder who
    /// was standing before this bid, if any.
    BidPlaced {
        auction_id: AuctionId,
        bidder_id: UserId,
        previous_highest: Option<UserId>,
        amount: Money,
        sequence: u64,
    },

    // =========================================================================
    // SETTLEMENT: consumed by the payment collaborator
    // =========================================================================
    /// Winner determined at close; the payment collaborator initiates capture
    /// and calls back to confirm settlement.
    WinnerDetermined {
        auction_id: AuctionId,
        winner: UserId,
        final_price: Money,
    },
}

impl MarketEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::AuctionOpened { .. }
            | Self::AuctionEndingSoon { .. }
            | Self::AuctionEnded { .. }
            | Self::ReserveNotMet { .. }
            | Self::AuctionCancelled { .. }
            | Self::AuctionSettled { .. } => EventTopic::Lifecycle,
            Self::BidPlaced { .. } => EventTopic::Bidding,
            Self::WinnerDetermined { .. } => EventTopic::Settlement,
        }
    }

    /// The auction this event concerns. Per-auction ordering is defined over
    /// events sharing this id.
    #[must_use]
    pub fn auction_id(&self) -> AuctionId {
        match self {
            Self::AuctionOpened { auction_id, .. }
            | Self::AuctionEndingSoon { auction_id, .. }
            | Self::AuctionEnded { auction_id, .. }
            | Self::ReserveNotMet { auction_id, .. }
            | Self::AuctionCancelled { auction_id, .. }
            | Self::AuctionSettled { auction_id }
            | Self::BidPlaced { auction_id, .. }
            | Self::WinnerDetermined { auction_id, .. } => *auction_id,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Auction lifecycle transitions (opened, ending soon, ended, cancelled, settled).
    Lifecycle,
    /// Accepted bids.
    Bidding,
    /// Winner handoff to payment.
    Settlement,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Auctions to include. Empty means all auctions.
    pub auctions: Vec<AuctionId>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            auctions: Vec::new(),
        }
    }

    /// Create a filter for events concerning specific auctions.
    #[must_use]
    pub fn auctions(auctions: Vec<AuctionId>) -> Self {
        Self {
            topics: Vec::new(),
            auctions,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &MarketEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let auction_match = self.auctions.is_empty() || self.auctions.contains(&event.auction_id());

        topic_match && auction_match
    }
}
