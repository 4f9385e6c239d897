//! In-memory `AuctionStore` adapter.
//!
//! The authoritative store for tests and single-node development. Atomicity
//! comes from holding the map's write lock across every multi-row commit;
//! writer serialization is the coordinator's per-auction section, not this
//! lock.

use super::AuctionRecord;
use crate::domain::entities::{Auction, AuctionId, AuctionStatus, Bid, Timestamp, UserId, Watch};
use crate::ports::outbound::{AuctionStore, BidCommit, StoreError};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Thread-safe in-memory store backed by a `HashMap`.
#[derive(Default)]
pub struct MemoryAuctionStore {
    records: RwLock<HashMap<AuctionId, AuctionRecord>>,
}

impl MemoryAuctionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of auctions held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true when no auction is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Replays a persisted bid row into the working set, whatever its
    /// outcome. Used by durable adapters when rebuilding on open.
    pub(crate) fn restore_bid(&self, bid: Bid) -> Result<(), StoreError> {
        let mut records = self.records.write();
        let record = records
            .get_mut(&bid.auction_id)
            .ok_or(StoreError::AuctionNotFound(bid.auction_id))?;
        record
            .ledger
            .append(bid)
            .map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    /// Replays a persisted watch row into the working set.
    pub(crate) fn restore_watch(&self, watch: Watch) -> Result<(), StoreError> {
        let mut records = self.records.write();
        let record = records
            .get_mut(&watch.auction_id)
            .ok_or(StoreError::AuctionNotFound(watch.auction_id))?;
        record.watches.entry(watch.watcher_id).or_insert(watch);
        Ok(())
    }
}

impl AuctionStore for MemoryAuctionStore {
    fn insert_auction(&self, auction: Auction) -> Result<(), StoreError> {
        let mut records = self.records.write();
        if records.contains_key(&auction.id) {
            return Err(StoreError::DuplicateAuction(auction.id));
        }
        records.insert(auction.id, AuctionRecord::new(auction));
        Ok(())
    }

    fn auction(&self, id: AuctionId) -> Result<Option<Auction>, StoreError> {
        Ok(self.records.read().get(&id).map(|r| r.auction.clone()))
    }

    fn next_sequence(&self, id: AuctionId) -> Result<u64, StoreError> {
        let records = self.records.read();
        let record = records.get(&id).ok_or(StoreError::AuctionNotFound(id))?;
        Ok(record.ledger.next_sequence())
    }

    fn commit_bid(&self, commit: BidCommit) -> Result<(), StoreError> {
        let mut records = self.records.write();
        let id = commit.auction.id;
        let record = records.get_mut(&id).ok_or(StoreError::AuctionNotFound(id))?;
        record.apply_bid_commit(&commit)
    }

    fn append_rejected(&self, bid: Bid) -> Result<(), StoreError> {
        let mut records = self.records.write();
        let record = records
            .get_mut(&bid.auction_id)
            .ok_or(StoreError::AuctionNotFound(bid.auction_id))?;
        record
            .ledger
            .append(bid)
            .map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    fn commit_transition(&self, expected_version: u64, auction: Auction) -> Result<(), StoreError> {
        let mut records = self.records.write();
        let id = auction.id;
        let record = records.get_mut(&id).ok_or(StoreError::AuctionNotFound(id))?;
        record.check_version(expected_version)?;
        record.auction = auction;
        Ok(())
    }

    fn accepted_bids(
        &self,
        id: AuctionId,
        after_sequence: Option<u64>,
    ) -> Result<Vec<Bid>, StoreError> {
        let records = self.records.read();
        let record = records.get(&id).ok_or(StoreError::AuctionNotFound(id))?;
        Ok(record.ledger.accepted_after(after_sequence))
    }

    fn bid_history(&self, id: AuctionId) -> Result<Vec<Bid>, StoreError> {
        let records = self.records.read();
        let record = records.get(&id).ok_or(StoreError::AuctionNotFound(id))?;
        Ok(record.ledger.history())
    }

    fn distinct_bidders(&self, id: AuctionId) -> Result<Vec<UserId>, StoreError> {
        let records = self.records.read();
        let record = records.get(&id).ok_or(StoreError::AuctionNotFound(id))?;
        Ok(record.ledger.distinct_bidders())
    }

    fn add_watch(&self, watch: Watch) -> Result<bool, StoreError> {
        let mut records = self.records.write();
        let record = records
            .get_mut(&watch.auction_id)
            .ok_or(StoreError::AuctionNotFound(watch.auction_id))?;
        match record.watches.entry(watch.watcher_id) {
            std::collections::btree_map::Entry::Occupied(_) => Ok(false),
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(watch);
                Ok(true)
            }
        }
    }

    fn remove_watch(&self, id: AuctionId, user: UserId) -> Result<bool, StoreError> {
        let mut records = self.records.write();
        let record = records.get_mut(&id).ok_or(StoreError::AuctionNotFound(id))?;
        Ok(record.watches.remove(&user).is_some())
    }

    fn is_watching(&self, id: AuctionId, user: UserId) -> Result<bool, StoreError> {
        let records = self.records.read();
        let record = records.get(&id).ok_or(StoreError::AuctionNotFound(id))?;
        Ok(record.watches.contains_key(&user))
    }

    fn watchers(&self, id: AuctionId) -> Result<Vec<UserId>, StoreError> {
        let records = self.records.read();
        let record = records.get(&id).ok_or(StoreError::AuctionNotFound(id))?;
        Ok(record.watches.keys().copied().collect())
    }

    fn watcher_count(&self, id: AuctionId) -> Result<u64, StoreError> {
        let records = self.records.read();
        let record = records.get(&id).ok_or(StoreError::AuctionNotFound(id))?;
        Ok(record.watches.len() as u64)
    }

    fn due_for_transition(&self, now: Timestamp) -> Result<Vec<AuctionId>, StoreError> {
        let records = self.records.read();
        Ok(records
            .values()
            .filter(|r| match r.auction.status {
                AuctionStatus::Scheduled => now >= r.auction.start_time,
                AuctionStatus::Active => r.auction.is_past_end(now),
                _ => false,
            })
            .map(|r| r.auction.id)
            .collect())
    }

    fn entering_close_window(
        &self,
        now: Timestamp,
        window_ms: u64,
    ) -> Result<Vec<AuctionId>, StoreError> {
        let records = self.records.read();
        Ok(records
            .values()
            .filter(|r| {
                let a = &r.auction;
                a.status == AuctionStatus::Active
                    && !a.ending_soon_notified
                    && now < a.end_time
                    && a.end_time.saturating_sub(now) <= window_ms
            })
            .map(|r| r.auction.id)
            .collect())
    }
}
