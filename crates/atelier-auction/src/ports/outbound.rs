//! Outbound (Driven) ports for the auction engine.
//!
//! These traits define dependencies on external systems the engine needs for
//! operation: a clock, the authoritative auction store, and the realtime push
//! transport that carries notifications to users.

use crate::domain::entities::{Auction, AuctionId, Bid, Money, Timestamp, UserId, Watch};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// CLOCK
// =============================================================================

/// Time source for consistent timestamp handling.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Returns the current timestamp in milliseconds.
    fn now(&self) -> Timestamp;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }
}

/// Deterministic time source for tests: fixed until advanced.
pub struct MockTimeSource {
    time: std::sync::atomic::AtomicU64,
}

impl MockTimeSource {
    /// Creates a mock clock at the given instant.
    pub fn new(initial: Timestamp) -> Self {
        Self {
            time: std::sync::atomic::AtomicU64::new(initial),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, ms: u64) {
        self.time.fetch_add(ms, std::sync::atomic::Ordering::SeqCst);
    }

    /// Sets the clock to an absolute instant.
    pub fn set(&self, time: Timestamp) {
        self.time.store(time, std::sync::atomic::Ordering::SeqCst);
    }
}

impl TimeSource for MockTimeSource {
    fn now(&self) -> Timestamp {
        self.time.load(std::sync::atomic::Ordering::SeqCst)
    }
}

// =============================================================================
// AUCTION STORE
// =============================================================================

/// Storage failures surfaced by `AuctionStore` implementations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No row exists for the auction.
    #[error("auction {0} not present in store")]
    AuctionNotFound(AuctionId),

    /// The caller's snapshot was stale: another commit won the race.
    #[error("version conflict on auction {auction_id}: expected {expected}, found {found}")]
    VersionConflict {
        /// The auction in question.
        auction_id: AuctionId,
        /// Version the caller read.
        expected: u64,
        /// Version actually in the store.
        found: u64,
    },

    /// An insert collided with an existing row.
    #[error("auction {0} already exists")]
    DuplicateAuction(AuctionId),

    /// Underlying storage I/O failure. Retryable; nothing was applied.
    #[error("storage I/O failure: {0}")]
    Io(String),

    /// A persisted record failed to decode.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// The full set of rows an accepted bid commits atomically: the bid itself,
/// the updated auction, and the bidder's implicit watch when it did not exist
/// yet. All or nothing.
#[derive(Clone, Debug)]
pub struct BidCommit {
    /// Version the caller read; the commit fails on mismatch.
    pub expected_version: u64,
    /// The auction row with the bid already applied (version bumped).
    pub auction: Auction,
    /// The accepted bid row.
    pub bid: Bid,
    /// Implicit watch to create, if the bidder had none.
    pub watch: Option<Watch>,
}

/// The authoritative record of auctions, bids, and watches.
///
/// Implementations must make every multi-row commit atomic and enforce the
/// `expected_version` check; serialization of writers is the coordinator's
/// job (per-auction exclusive sections), not the store's. Methods are
/// synchronous: they run under the exclusive section and must not perform
/// slow blocking work beyond local storage access.
pub trait AuctionStore: Send + Sync {
    /// Inserts a newly created auction.
    fn insert_auction(&self, auction: Auction) -> Result<(), StoreError>;

    /// Loads the current snapshot of an auction.
    fn auction(&self, id: AuctionId) -> Result<Option<Auction>, StoreError>;

    /// The sequence number the next bid row for this auction must carry.
    fn next_sequence(&self, id: AuctionId) -> Result<u64, StoreError>;

    /// Atomically applies an accepted bid: appends the bid row, replaces the
    /// auction row (version-checked), and creates the implicit watch if
    /// present. Nothing is applied on error.
    fn commit_bid(&self, commit: BidCommit) -> Result<(), StoreError>;

    /// Appends a rejected bid row for audit. Does not touch the auction row.
    fn append_rejected(&self, bid: Bid) -> Result<(), StoreError>;

    /// Replaces the auction row after a lifecycle transition
    /// (version-checked).
    fn commit_transition(&self, expected_version: u64, auction: Auction) -> Result<(), StoreError>;

    /// Accepted bids in arrival order, optionally restarting after a
    /// previously seen sequence.
    fn accepted_bids(
        &self,
        id: AuctionId,
        after_sequence: Option<u64>,
    ) -> Result<Vec<Bid>, StoreError>;

    /// Every recorded attempt in arrival order, rejected ones included.
    fn bid_history(&self, id: AuctionId) -> Result<Vec<Bid>, StoreError>;

    /// Every user who ever attempted a bid on the auction, deduplicated.
    fn distinct_bidders(&self, id: AuctionId) -> Result<Vec<UserId>, StoreError>;

    /// Creates a watch. Returns false when it already existed (idempotent).
    fn add_watch(&self, watch: Watch) -> Result<bool, StoreError>;

    /// Removes a watch. Returns false when none existed (idempotent).
    fn remove_watch(&self, id: AuctionId, user: UserId) -> Result<bool, StoreError>;

    /// Whether the user currently watches the auction.
    fn is_watching(&self, id: AuctionId, user: UserId) -> Result<bool, StoreError>;

    /// All current watchers of the auction.
    fn watchers(&self, id: AuctionId) -> Result<Vec<UserId>, StoreError>;

    /// Current watcher count (derived, never stored on the auction row).
    fn watcher_count(&self, id: AuctionId) -> Result<u64, StoreError>;

    /// Auctions with a time-based transition due at `now`: scheduled ones
    /// whose start has passed and active ones whose end has passed.
    fn due_for_transition(&self, now: Timestamp) -> Result<Vec<AuctionId>, StoreError>;

    /// Active auctions inside the closing window that have not fired their
    /// ending-soon notification yet.
    fn entering_close_window(
        &self,
        now: Timestamp,
        window_ms: u64,
    ) -> Result<Vec<AuctionId>, StoreError>;
}

// =============================================================================
// PUSH TRANSPORT
// =============================================================================

/// What a user is told about an auction they follow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    /// Someone overtook the recipient's standing bid.
    Outbid,
    /// A new bid landed on a watched auction.
    NewBid,
    /// A watched auction is about to close.
    EndingSoon,
    /// The recipient won the auction.
    Won,
    /// The auction closed and the recipient did not win.
    Lost,
    /// The auction closed without meeting its reserve.
    ReserveNotMet,
    /// The auction was cancelled.
    Cancelled,
}

/// One message addressed to one user.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Notification {
    /// Addressee.
    pub recipient: UserId,
    /// The auction the message concerns.
    pub auction_id: AuctionId,
    /// What happened.
    pub kind: NotificationKind,
    /// The relevant amount, when one exists (new price, final price).
    pub amount: Option<Money>,
}

/// Delivery failures from the push transport. Logged by the fan-out, never
/// retried by the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transport could not deliver to the recipient.
    #[error("delivery to {recipient} failed: {reason}")]
    Delivery {
        /// Intended addressee.
        recipient: UserId,
        /// Transport-specific reason.
        reason: String,
    },
}

/// Realtime transport addressed by user id (socket hub stand-in).
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Delivers one notification to its recipient.
    async fn deliver(&self, notification: Notification) -> Result<(), TransportError>;
}
