//! Outer-layer adapters: `AuctionStore` implementations and push transports.

pub mod memory_store;
pub mod push_log;
pub mod rocks_store;

pub use memory_store::MemoryAuctionStore;
pub use push_log::{LoggingPushTransport, RecordingPushTransport};
pub use rocks_store::{RocksAuctionStore, RocksStoreConfig};

use crate::domain::entities::{Auction, UserId, Watch};
use crate::domain::ledger::AuctionLedger;
use crate::ports::outbound::{BidCommit, StoreError};
use std::collections::BTreeMap;

/// One auction's full state as the store adapters hold it: the row, its
/// ledger, and its watch set.
#[derive(Clone, Debug)]
pub(crate) struct AuctionRecord {
    pub auction: Auction,
    pub ledger: AuctionLedger,
    pub watches: BTreeMap<UserId, Watch>,
}

impl AuctionRecord {
    pub fn new(auction: Auction) -> Self {
        Self {
            auction,
            ledger: AuctionLedger::new(),
            watches: BTreeMap::new(),
        }
    }

    /// Fails when the caller's snapshot is stale.
    pub fn check_version(&self, expected: u64) -> Result<(), StoreError> {
        if self.auction.version != expected {
            return Err(StoreError::VersionConflict {
                auction_id: self.auction.id,
                expected,
                found: self.auction.version,
            });
        }
        Ok(())
    }

    /// Applies an accepted-bid commit to this record. The ledger append runs
    /// first and is the only fallible step, so a failure leaves the record
    /// untouched.
    pub fn apply_bid_commit(&mut self, commit: &BidCommit) -> Result<(), StoreError> {
        self.check_version(commit.expected_version)?;
        self.ledger
            .append(commit.bid.clone())
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        self.auction = commit.auction.clone();
        if let Some(watch) = &commit.watch {
            self.watches
                .entry(watch.watcher_id)
                .or_insert_with(|| watch.clone());
        }
        Ok(())
    }
}
