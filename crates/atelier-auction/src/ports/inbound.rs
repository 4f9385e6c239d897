//! Inbound (Driving) port for the auction engine.
//!
//! All inputs cross this boundary as strict typed requests; client-supplied
//! timestamps or precomputed "current bid" values never enter the engine.

use crate::domain::entities::{
    ArtworkId, Auction, AuctionId, Bid, Money, Timestamp, UserId,
};
use crate::domain::errors::Result;
use crate::domain::validation::RejectReason;
use async_trait::async_trait;

/// Validated request to open a new auction.
#[derive(Clone, Debug)]
pub struct NewAuctionRequest {
    /// The artwork being sold.
    pub artwork_id: ArtworkId,
    /// The selling artist.
    pub seller_id: UserId,
    /// Opening price; must be positive.
    pub starting_bid: Money,
    /// Minimum acceptable final price. None means no reserve.
    pub reserve_price: Option<Money>,
    /// When bidding opens. None means immediately.
    pub start_time: Option<Timestamp>,
    /// When bidding closes. Must be after the start.
    pub end_time: Timestamp,
    /// Per-auction increment override. None uses the engine default.
    pub min_increment: Option<Money>,
}

/// Synchronous answer to a bid attempt. A rejection is data here, not an
/// error: the caller resubmits a corrected bid.
#[derive(Clone, Debug)]
pub struct BidReceipt {
    /// Whether the bid committed.
    pub accepted: bool,
    /// Why it did not, when `accepted` is false.
    pub reason: Option<RejectReason>,
    /// The standing price after the attempt.
    pub current_bid: Money,
    /// Snapshot of the auction after the attempt.
    pub auction: Auction,
}

/// Read-model view of one auction with its derived watcher count.
#[derive(Clone, Debug)]
pub struct AuctionView {
    /// The auction row, with any overdue lifecycle transition already applied.
    pub auction: Auction,
    /// Number of current watchers.
    pub watcher_count: u64,
}

/// The engine's public API, consumed by the web layer and collaborators.
#[async_trait]
pub trait AuctionEngineApi: Send + Sync {
    /// Opens a new auction. Fails on a non-positive starting bid or an end
    /// time not after the start time.
    async fn create_auction(&self, request: NewAuctionRequest) -> Result<Auction>;

    /// Places a bid. Concurrent calls against the same auction serialize;
    /// rejections come back in the receipt, infrastructure failures as
    /// retryable errors.
    async fn place_bid(
        &self,
        auction_id: AuctionId,
        bidder_id: UserId,
        amount: Money,
    ) -> Result<BidReceipt>;

    /// Reads an auction, lazily applying any overdue lifecycle transition
    /// before returning.
    async fn get_auction(&self, auction_id: AuctionId) -> Result<AuctionView>;

    /// Subscribes a user to the auction's events. Idempotent.
    async fn watch(&self, auction_id: AuctionId, user_id: UserId) -> Result<()>;

    /// Removes a user's subscription. Idempotent.
    async fn unwatch(&self, auction_id: AuctionId, user_id: UserId) -> Result<()>;

    /// Accepted bids oldest first; pass the last seen sequence to resume.
    async fn list_bids(
        &self,
        auction_id: AuctionId,
        after_sequence: Option<u64>,
    ) -> Result<Vec<Bid>>;

    /// Cancels an auction. Only the seller may cancel, and only while no
    /// accepted bid exists unless policy allows otherwise.
    async fn cancel_auction(&self, auction_id: AuctionId, requested_by: UserId)
        -> Result<Auction>;

    /// Payment-collaborator callback confirming capture: advances
    /// Ended -> Settled. Idempotent.
    async fn confirm_settlement(&self, auction_id: AuctionId) -> Result<Auction>;
}
