//! Append-only bid record for one auction.
//!
//! Every attempt that reaches validation lands here, rejected ones included,
//! in arrival order. The ledger is the audit trail and the source for winner
//! determination and fan-out audiences.
//!
//! ## Invariants Enforced
//!
//! - Sequence numbers are assigned densely in append order (checked in
//!   `append()`).
//! - Accepted amounts strictly increase (checked in `append()`).

use super::entities::{Bid, Money, UserId};
use thiserror::Error;

/// Ledger append violations. Under the engine's exclusive sections these are
/// unreachable; they guard against a buggy or bypassing caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A row arrived with a sequence other than the next one.
    #[error("sequence gap: expected {expected}, got {actual}")]
    SequenceGap {
        /// The next sequence the ledger would assign.
        expected: u64,
        /// The sequence carried by the offered row.
        actual: u64,
    },

    /// An accepted row did not raise the price.
    #[error("non-monotonic accepted amount: {proposed} after {last}")]
    NonMonotonicAmount {
        /// Amount of the latest accepted row.
        last: Money,
        /// Amount of the offered row.
        proposed: Money,
    },
}

/// Ordered, append-only record of all bid attempts for one auction.
#[derive(Clone, Debug, Default)]
pub struct AuctionLedger {
    bids: Vec<Bid>,
}

impl AuctionLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The sequence number the next appended row must carry.
    #[must_use]
    pub fn next_sequence(&self) -> u64 {
        self.bids.len() as u64 + 1
    }

    /// Number of rows, rejected attempts included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bids.len()
    }

    /// Returns true when no attempt has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty()
    }

    /// Number of accepted rows.
    #[must_use]
    pub fn accepted_count(&self) -> u64 {
        self.bids.iter().filter(|b| b.outcome.is_accepted()).count() as u64
    }

    /// The latest accepted row, if any.
    #[must_use]
    pub fn last_accepted(&self) -> Option<&Bid> {
        self.bids.iter().rev().find(|b| b.outcome.is_accepted())
    }

    /// Appends a row.
    ///
    /// # Errors
    /// - `SequenceGap` if the row does not carry the next sequence
    /// - `NonMonotonicAmount` if an accepted row does not raise the price
    pub fn append(&mut self, bid: Bid) -> Result<(), LedgerError> {
        let expected = self.next_sequence();
        if bid.sequence != expected {
            return Err(LedgerError::SequenceGap {
                expected,
                actual: bid.sequence,
            });
        }

        if bid.outcome.is_accepted() {
            if let Some(last) = self.last_accepted() {
                if bid.amount <= last.amount {
                    return Err(LedgerError::NonMonotonicAmount {
                        last: last.amount,
                        proposed: bid.amount,
                    });
                }
            }
        }

        self.bids.push(bid);
        Ok(())
    }

    /// Accepted rows in arrival order, optionally restarting after a
    /// previously seen sequence.
    pub fn accepted_after(&self, after_sequence: Option<u64>) -> Vec<Bid> {
        let floor = after_sequence.unwrap_or(0);
        self.bids
            .iter()
            .filter(|b| b.outcome.is_accepted() && b.sequence > floor)
            .cloned()
            .collect()
    }

    /// Every recorded attempt in arrival order, for audit.
    pub fn history(&self) -> Vec<Bid> {
        self.bids.clone()
    }

    /// Every user who ever attempted a bid, deduplicated, in first-seen order.
    pub fn distinct_bidders(&self) -> Vec<UserId> {
        let mut seen = Vec::new();
        for bid in &self.bids {
            if !seen.contains(&bid.bidder_id) {
                seen.push(bid.bidder_id);
            }
        }
        seen
    }

    /// Replays the ledger and confirms accepted amounts strictly increase.
    /// Used by audit paths and tests.
    #[must_use]
    pub fn replay_is_monotonic(&self) -> bool {
        let mut last: Option<Money> = None;
        for bid in self.bids.iter().filter(|b| b.outcome.is_accepted()) {
            if let Some(prev) = last {
                if bid.amount <= prev {
                    return false;
                }
            }
            last = Some(bid.amount);
        }
        true
    }
}
