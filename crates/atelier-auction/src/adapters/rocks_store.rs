//! # RocksDB Storage Adapter
//!
//! Durable `AuctionStore` implementation: every commit lands in an atomic
//! `WriteBatch` before the in-memory working set is updated, so a crash can
//! lose at most an unacknowledged commit, never half of one.
//!
//! ## Column Families
//!
//! - `auctions` - current auction rows, keyed by auction uuid
//! - `bids` - ledger rows, keyed by auction uuid + big-endian sequence
//! - `watches` - watch rows, keyed by auction uuid + watcher uuid
//!
//! The full working set is loaded on open and served from memory; the
//! database is write-through. Writer serialization remains the coordinator's
//! per-auction section, exactly as for the in-memory adapter.

use super::memory_store::MemoryAuctionStore;
use crate::domain::entities::{Auction, AuctionId, Bid, Timestamp, UserId, Watch};
use crate::ports::outbound::{AuctionStore, BidCommit, StoreError};
use rocksdb::{ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, WriteOptions, DB};

/// Column family names
pub const CF_AUCTIONS: &str = "auctions";
pub const CF_BIDS: &str = "bids";
pub const CF_WATCHES: &str = "watches";

/// All column families used by the store
pub const COLUMN_FAMILIES: &[&str] = &[CF_AUCTIONS, CF_BIDS, CF_WATCHES];

/// RocksDB configuration for the auction store
#[derive(Debug, Clone)]
pub struct RocksStoreConfig {
    /// Path to the database directory
    pub path: String,
    /// Enable fsync after each write (default: true for durability)
    pub sync_writes: bool,
}

impl Default for RocksStoreConfig {
    fn default() -> Self {
        Self {
            path: "./data/auctions".to_string(),
            sync_writes: true,
        }
    }
}

impl RocksStoreConfig {
    /// Create config for testing (no sync)
    pub fn for_testing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sync_writes: false,
        }
    }
}

/// RocksDB-backed auction store.
pub struct RocksAuctionStore {
    db: DB,
    cache: MemoryAuctionStore,
    sync_writes: bool,
}

fn io_err(e: rocksdb::Error) -> StoreError {
    StoreError::Io(e.to_string())
}

fn corrupt_err(e: bincode::Error) -> StoreError {
    StoreError::Corrupt(e.to_string())
}

fn auction_key(id: AuctionId) -> [u8; 16] {
    *id.as_uuid().as_bytes()
}

fn bid_key(id: AuctionId, sequence: u64) -> [u8; 24] {
    let mut key = [0u8; 24];
    key[..16].copy_from_slice(id.as_uuid().as_bytes());
    key[16..].copy_from_slice(&sequence.to_be_bytes());
    key
}

fn watch_key(id: AuctionId, user: UserId) -> [u8; 32] {
    let mut key = [0u8; 32];
    key[..16].copy_from_slice(id.as_uuid().as_bytes());
    key[16..].copy_from_slice(user.as_uuid().as_bytes());
    key
}

impl RocksAuctionStore {
    /// Open or create the database and load the working set.
    pub fn open(config: RocksStoreConfig) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(rocksdb::DBCompressionType::Snappy);
                ColumnFamilyDescriptor::new(*name, cf_opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&opts, &config.path, cf_descriptors).map_err(io_err)?;

        let store = Self {
            db,
            cache: MemoryAuctionStore::new(),
            sync_writes: config.sync_writes,
        };
        store.load_working_set()?;
        Ok(store)
    }

    /// Rebuilds the in-memory working set from disk. Bid keys sort by
    /// auction uuid then big-endian sequence, so each auction's ledger
    /// replays in append order.
    fn load_working_set(&self) -> Result<(), StoreError> {
        let auctions_cf = self.cf(CF_AUCTIONS)?;
        for item in self.db.iterator_cf(auctions_cf, IteratorMode::Start) {
            let (_, value) = item.map_err(io_err)?;
            let auction: Auction = bincode::deserialize(&value).map_err(corrupt_err)?;
            self.cache.insert_auction(auction)?;
        }

        let bids_cf = self.cf(CF_BIDS)?;
        for item in self.db.iterator_cf(bids_cf, IteratorMode::Start) {
            let (_, value) = item.map_err(io_err)?;
            let bid: Bid = bincode::deserialize(&value).map_err(corrupt_err)?;
            self.cache.restore_bid(bid)?;
        }

        let watches_cf = self.cf(CF_WATCHES)?;
        for item in self.db.iterator_cf(watches_cf, IteratorMode::Start) {
            let (_, value) = item.map_err(io_err)?;
            let watch: Watch = bincode::deserialize(&value).map_err(corrupt_err)?;
            self.cache.restore_watch(watch)?;
        }

        Ok(())
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Io(format!("missing column family {name}")))
    }

    fn write_opts(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(self.sync_writes);
        opts
    }

    fn write_batch(&self, batch: WriteBatch) -> Result<(), StoreError> {
        self.db.write_opt(batch, &self.write_opts()).map_err(io_err)
    }

    fn put_auction(&self, batch: &mut WriteBatch, auction: &Auction) -> Result<(), StoreError> {
        let value = bincode::serialize(auction).map_err(corrupt_err)?;
        batch.put_cf(self.cf(CF_AUCTIONS)?, auction_key(auction.id), value);
        Ok(())
    }

    fn put_bid(&self, batch: &mut WriteBatch, bid: &Bid) -> Result<(), StoreError> {
        let value = bincode::serialize(bid).map_err(corrupt_err)?;
        batch.put_cf(self.cf(CF_BIDS)?, bid_key(bid.auction_id, bid.sequence), value);
        Ok(())
    }

    fn put_watch(&self, batch: &mut WriteBatch, watch: &Watch) -> Result<(), StoreError> {
        let value = bincode::serialize(watch).map_err(corrupt_err)?;
        batch.put_cf(
            self.cf(CF_WATCHES)?,
            watch_key(watch.auction_id, watch.watcher_id),
            value,
        );
        Ok(())
    }

    /// Confirms the commit would apply cleanly against the working set, so a
    /// batch never reaches disk unless the in-memory apply will succeed.
    fn precheck_bid(&self, commit: &BidCommit) -> Result<(), StoreError> {
        let id = commit.auction.id;
        let current = self
            .cache
            .auction(id)?
            .ok_or(StoreError::AuctionNotFound(id))?;
        if current.version != commit.expected_version {
            return Err(StoreError::VersionConflict {
                auction_id: id,
                expected: commit.expected_version,
                found: current.version,
            });
        }
        let expected_sequence = self.cache.next_sequence(id)?;
        if commit.bid.sequence != expected_sequence {
            return Err(StoreError::Corrupt(format!(
                "bid sequence {} where {} expected",
                commit.bid.sequence, expected_sequence
            )));
        }
        Ok(())
    }
}

impl AuctionStore for RocksAuctionStore {
    fn insert_auction(&self, auction: Auction) -> Result<(), StoreError> {
        if self.cache.auction(auction.id)?.is_some() {
            return Err(StoreError::DuplicateAuction(auction.id));
        }
        let mut batch = WriteBatch::default();
        self.put_auction(&mut batch, &auction)?;
        self.write_batch(batch)?;
        self.cache.insert_auction(auction)
    }

    fn auction(&self, id: AuctionId) -> Result<Option<Auction>, StoreError> {
        self.cache.auction(id)
    }

    fn next_sequence(&self, id: AuctionId) -> Result<u64, StoreError> {
        self.cache.next_sequence(id)
    }

    fn commit_bid(&self, commit: BidCommit) -> Result<(), StoreError> {
        self.precheck_bid(&commit)?;

        let mut batch = WriteBatch::default();
        self.put_auction(&mut batch, &commit.auction)?;
        self.put_bid(&mut batch, &commit.bid)?;
        if let Some(watch) = &commit.watch {
            self.put_watch(&mut batch, watch)?;
        }
        self.write_batch(batch)?;

        self.cache.commit_bid(commit)
    }

    fn append_rejected(&self, bid: Bid) -> Result<(), StoreError> {
        let expected_sequence = self.cache.next_sequence(bid.auction_id)?;
        if bid.sequence != expected_sequence {
            return Err(StoreError::Corrupt(format!(
                "bid sequence {} where {} expected",
                bid.sequence, expected_sequence
            )));
        }

        let mut batch = WriteBatch::default();
        self.put_bid(&mut batch, &bid)?;
        self.write_batch(batch)?;

        self.cache.append_rejected(bid)
    }

    fn commit_transition(&self, expected_version: u64, auction: Auction) -> Result<(), StoreError> {
        let id = auction.id;
        let current = self
            .cache
            .auction(id)?
            .ok_or(StoreError::AuctionNotFound(id))?;
        if current.version != expected_version {
            return Err(StoreError::VersionConflict {
                auction_id: id,
                expected: expected_version,
                found: current.version,
            });
        }

        let mut batch = WriteBatch::default();
        self.put_auction(&mut batch, &auction)?;
        self.write_batch(batch)?;

        self.cache.commit_transition(expected_version, auction)
    }

    fn accepted_bids(
        &self,
        id: AuctionId,
        after_sequence: Option<u64>,
    ) -> Result<Vec<Bid>, StoreError> {
        self.cache.accepted_bids(id, after_sequence)
    }

    fn bid_history(&self, id: AuctionId) -> Result<Vec<Bid>, StoreError> {
        self.cache.bid_history(id)
    }

    fn distinct_bidders(&self, id: AuctionId) -> Result<Vec<UserId>, StoreError> {
        self.cache.distinct_bidders(id)
    }

    fn add_watch(&self, watch: Watch) -> Result<bool, StoreError> {
        if self.cache.is_watching(watch.auction_id, watch.watcher_id)? {
            return Ok(false);
        }
        let mut batch = WriteBatch::default();
        self.put_watch(&mut batch, &watch)?;
        self.write_batch(batch)?;
        self.cache.add_watch(watch)
    }

    fn remove_watch(&self, id: AuctionId, user: UserId) -> Result<bool, StoreError> {
        if !self.cache.is_watching(id, user)? {
            return Ok(false);
        }
        self.db
            .delete_cf(self.cf(CF_WATCHES)?, watch_key(id, user))
            .map_err(io_err)?;
        self.cache.remove_watch(id, user)
    }

    fn is_watching(&self, id: AuctionId, user: UserId) -> Result<bool, StoreError> {
        self.cache.is_watching(id, user)
    }

    fn watchers(&self, id: AuctionId) -> Result<Vec<UserId>, StoreError> {
        self.cache.watchers(id)
    }

    fn watcher_count(&self, id: AuctionId) -> Result<u64, StoreError> {
        self.cache.watcher_count(id)
    }

    fn due_for_transition(&self, now: Timestamp) -> Result<Vec<AuctionId>, StoreError> {
        self.cache.due_for_transition(now)
    }

    fn entering_close_window(
        &self,
        now: Timestamp,
        window_ms: u64,
    ) -> Result<Vec<AuctionId>, StoreError> {
        self.cache.entering_close_window(now, window_ms)
    }
}
