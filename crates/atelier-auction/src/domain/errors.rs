//! Error types for the auction engine

use super::entities::{AuctionId, AuctionStatus, Timestamp};
use crate::ports::outbound::StoreError;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, AuctionError>;

/// Errors that can occur in engine operations.
///
/// Bid rejections are not errors: `place_bid` reports them synchronously in
/// its receipt. This enum covers schedule/authorization violations, contention
/// failures, and storage faults.
#[derive(Debug, Error)]
pub enum AuctionError {
    /// No auction exists under the given id.
    #[error("auction {0} not found")]
    AuctionNotFound(AuctionId),

    /// Creation request with a non-positive duration.
    #[error("invalid schedule: end time {end} not after start time {start}")]
    InvalidSchedule {
        /// Requested start time.
        start: Timestamp,
        /// Requested end time.
        end: Timestamp,
    },

    /// Creation request with a zero starting bid.
    #[error("starting bid must be positive")]
    ZeroStartingBid,

    /// The selling artist attempted to bid on their own auction.
    #[error("seller may not bid on their own auction {0}")]
    SellerMayNotBid(AuctionId),

    /// Cancellation requested by someone other than the seller.
    #[error("only the seller may cancel auction {0}")]
    NotSeller(AuctionId),

    /// Cancellation forbidden by state or policy.
    #[error("auction {auction_id} cannot be cancelled: {reason}")]
    CancelNotAllowed {
        /// The auction in question.
        auction_id: AuctionId,
        /// Human-readable refusal reason.
        reason: &'static str,
    },

    /// An operation that requires a different lifecycle state.
    #[error("auction {auction_id} is {status:?}; operation requires {required}")]
    WrongStatus {
        /// The auction in question.
        auction_id: AuctionId,
        /// Its current status.
        status: AuctionStatus,
        /// What the operation needed.
        required: &'static str,
    },

    /// The auction's exclusive section could not be acquired in time.
    /// Retryable; no state was applied.
    #[error("timed out waiting for exclusive access to auction {0}")]
    LockTimeout(AuctionId),

    /// The commit lost the version race even after one re-validation.
    /// Retryable; no state was applied.
    #[error("auction {0} was updated concurrently; retry the bid")]
    Contention(AuctionId),

    /// Storage fault.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuctionError {
    /// Check if the caller may simply retry the same call.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::LockTimeout(_) | Self::Contention(_) | Self::Store(StoreError::Io(_))
        )
    }
}
