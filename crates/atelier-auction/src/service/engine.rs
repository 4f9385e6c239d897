//! Bidding coordinator.
//!
//! `AuctionEngine` owns the per-auction exclusive sections. Every mutation of
//! an auction (bid commit, lifecycle transition, cancellation, settlement)
//! runs under that auction's section with a bounded wait; reads that can
//! trigger a lazy transition take it too. Events are collected while the
//! section is held and published only after it is released, so no collaborator
//! I/O ever happens inside the critical section.

use crate::config::EngineConfig;
use crate::domain::entities::{
    Auction, AuctionId, AuctionStatus, Bid, BidOutcome, Money, Timestamp, UserId, Watch,
};
use crate::domain::errors::{AuctionError, Result};
use crate::domain::lifecycle::{apply_transition, due_transition, Transition};
use crate::domain::validation::validate_bid;
use crate::ports::inbound::{AuctionEngineApi, AuctionView, BidReceipt, NewAuctionRequest};
use crate::ports::outbound::{AuctionStore, BidCommit, StoreError, TimeSource};
use async_trait::async_trait;
use atelier_bus::{EventPublisher, InMemoryEventBus, MarketEvent};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};

type Section = Arc<tokio::sync::Mutex<()>>;

/// The bidding coordinator and public face of the auction engine.
pub struct AuctionEngine {
    store: Arc<dyn AuctionStore>,
    bus: Arc<InMemoryEventBus>,
    clock: Arc<dyn TimeSource>,
    config: EngineConfig,

    /// One exclusive section per auction. Sections are never nested: a task
    /// holds at most one at a time.
    sections: Mutex<HashMap<AuctionId, Section>>,
}

impl AuctionEngine {
    /// Creates an engine over the given store, bus, and clock.
    pub fn new(
        store: Arc<dyn AuctionStore>,
        bus: Arc<InMemoryEventBus>,
        clock: Arc<dyn TimeSource>,
        config: EngineConfig,
    ) -> Self {
        info!(
            min_increment = %config.default_min_increment,
            lock_wait_ms = config.lock_wait.as_millis() as u64,
            "Initializing auction engine"
        );
        Self {
            store,
            bus,
            clock,
            config,
            sections: Mutex::new(HashMap::new()),
        }
    }

    /// The bus this engine publishes to.
    pub fn bus(&self) -> Arc<InMemoryEventBus> {
        Arc::clone(&self.bus)
    }

    /// The store backing this engine.
    pub fn store(&self) -> Arc<dyn AuctionStore> {
        Arc::clone(&self.store)
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Acquires the auction's exclusive section, waiting at most the
    /// configured bound. Fails fast with a retryable error on timeout.
    async fn acquire(&self, id: AuctionId) -> Result<OwnedMutexGuard<()>> {
        let section = {
            let mut sections = self.sections.lock();
            Arc::clone(sections.entry(id).or_default())
        };
        tokio::time::timeout(self.config.lock_wait, section.lock_owned())
            .await
            .map_err(|_| AuctionError::LockTimeout(id))
    }

    async fn publish_events(&self, events: Vec<MarketEvent>) {
        for event in events {
            self.bus.publish(event).await;
        }
    }

    /// Applies every overdue lifecycle transition for one auction. Must run
    /// under the auction's section. Collected events correspond to committed
    /// transitions only.
    fn apply_due_transitions(
        &self,
        id: AuctionId,
        now: Timestamp,
        events: &mut Vec<MarketEvent>,
    ) -> Result<()> {
        loop {
            let Some(auction) = self.store.auction(id)? else {
                return Ok(());
            };
            let Some(transition) = due_transition(&auction, now) else {
                return Ok(());
            };

            let mut updated = auction.clone();
            apply_transition(&mut updated, transition);
            self.store.commit_transition(auction.version, updated.clone())?;

            match transition {
                Transition::Open => {
                    info!(auction_id = %id, "Auction opened for bidding");
                    events.push(MarketEvent::AuctionOpened {
                        auction_id: id,
                        artwork_id: updated.artwork_id,
                        seller_id: updated.seller_id,
                        end_time: updated.end_time,
                    });
                }
                Transition::CloseSold => {
                    info!(
                        auction_id = %id,
                        winner = ?updated.highest_bidder,
                        final_price = %updated.current_bid,
                        "Auction ended"
                    );
                    events.push(MarketEvent::AuctionEnded {
                        auction_id: id,
                        seller_id: updated.seller_id,
                        winner: updated.highest_bidder,
                        final_price: updated.current_bid,
                    });
                    if let Some(winner) = updated.highest_bidder {
                        events.push(MarketEvent::WinnerDetermined {
                            auction_id: id,
                            winner,
                            final_price: updated.current_bid,
                        });
                    }
                }
                Transition::CloseReserveNotMet => {
                    info!(
                        auction_id = %id,
                        final_price = %updated.current_bid,
                        "Auction ended below reserve"
                    );
                    events.push(MarketEvent::ReserveNotMet {
                        auction_id: id,
                        seller_id: updated.seller_id,
                        final_price: updated.current_bid,
                    });
                }
            }
        }
    }

    /// Fires the one-shot ending-soon notification when the auction is inside
    /// the closing window. Must run under the auction's section.
    fn mark_ending_soon(
        &self,
        id: AuctionId,
        now: Timestamp,
        events: &mut Vec<MarketEvent>,
    ) -> Result<()> {
        let Some(auction) = self.store.auction(id)? else {
            return Ok(());
        };
        let in_window = auction.status == AuctionStatus::Active
            && !auction.ending_soon_notified
            && now < auction.end_time
            && auction.end_time.saturating_sub(now) <= self.config.ending_soon_window_ms;
        if !in_window {
            return Ok(());
        }

        let mut updated = auction.clone();
        updated.ending_soon_notified = true;
        updated.version += 1;
        self.store.commit_transition(auction.version, updated.clone())?;

        events.push(MarketEvent::AuctionEndingSoon {
            auction_id: id,
            end_time: updated.end_time,
        });
        Ok(())
    }

    /// One pass over every auction with time-based work due: overdue
    /// transitions and ending-soon notifications. Returns the number of
    /// events published. A section that cannot be acquired in time is skipped
    /// and revisited on the next pass.
    pub async fn sweep(&self) -> Result<usize> {
        let now = self.clock.now();
        let mut due = self.store.due_for_transition(now)?;
        for id in self
            .store
            .entering_close_window(now, self.config.ending_soon_window_ms)?
        {
            if !due.contains(&id) {
                due.push(id);
            }
        }

        let mut published = 0;
        for id in due {
            let guard = match self.acquire(id).await {
                Ok(guard) => guard,
                Err(AuctionError::LockTimeout(_)) => {
                    warn!(auction_id = %id, "Sweep skipped busy auction");
                    continue;
                }
                Err(e) => return Err(e),
            };

            // Re-read the clock inside the section: the wait may have been long
            let now = self.clock.now();
            let mut events = Vec::new();
            let result = self
                .apply_due_transitions(id, now, &mut events)
                .and_then(|()| self.mark_ending_soon(id, now, &mut events));
            drop(guard);

            if let Err(e) = result {
                warn!(auction_id = %id, error = %e, "Sweep failed for auction");
                continue;
            }
            published += events.len();
            self.publish_events(events).await;
        }
        Ok(published)
    }

    /// Validates, commits, and reports one bid attempt. Must run under the
    /// auction's section.
    fn place_bid_locked(
        &self,
        id: AuctionId,
        bidder: UserId,
        amount: Money,
        now: Timestamp,
        events: &mut Vec<MarketEvent>,
    ) -> Result<BidReceipt> {
        self.apply_due_transitions(id, now, events)?;

        let auction = self
            .store
            .auction(id)?
            .ok_or(AuctionError::AuctionNotFound(id))?;

        // Authorization, not validation: no ledger row is written.
        if bidder == auction.seller_id {
            return Err(AuctionError::SellerMayNotBid(id));
        }

        match validate_bid(&auction, bidder, amount, now, &self.config.bid_policy()) {
            Err(reason) => {
                let sequence = self.store.next_sequence(id)?;
                self.store.append_rejected(Bid::new(
                    id,
                    sequence,
                    bidder,
                    amount,
                    now,
                    reason.outcome(),
                ))?;
                debug!(
                    auction_id = %id,
                    bidder = %bidder,
                    amount = %amount,
                    reason = %reason,
                    "Bid rejected"
                );
                Ok(BidReceipt {
                    accepted: false,
                    reason: Some(reason),
                    current_bid: auction.current_bid,
                    auction,
                })
            }
            Ok(()) => self.commit_accepted(auction, bidder, amount, now, events, false),
        }
    }

    /// Commits an already-validated bid. On a version conflict the snapshot
    /// was stale: re-read and re-validate exactly once; a second conflict
    /// records the attempt as stale and surfaces a retryable error.
    fn commit_accepted(
        &self,
        auction: Auction,
        bidder: UserId,
        amount: Money,
        now: Timestamp,
        events: &mut Vec<MarketEvent>,
        retried: bool,
    ) -> Result<BidReceipt> {
        let id = auction.id;
        let sequence = self.store.next_sequence(id)?;
        let bid = Bid::new(id, sequence, bidder, amount, now, BidOutcome::Accepted);

        let mut updated = auction.clone();
        updated.apply_accepted_bid(bidder, amount);

        // A bidder implicitly watches what they bid on
        let watch = if self.store.is_watching(id, bidder)? {
            None
        } else {
            Some(Watch {
                auction_id: id,
                watcher_id: bidder,
                created_at: now,
            })
        };

        match self.store.commit_bid(BidCommit {
            expected_version: auction.version,
            auction: updated.clone(),
            bid,
            watch,
        }) {
            Ok(()) => {
                info!(
                    auction_id = %id,
                    bidder = %bidder,
                    amount = %amount,
                    sequence,
                    "Bid accepted"
                );
                events.push(MarketEvent::BidPlaced {
                    auction_id: id,
                    bidder_id: bidder,
                    previous_highest: auction.highest_bidder,
                    amount,
                    sequence,
                });
                Ok(BidReceipt {
                    accepted: true,
                    reason: None,
                    current_bid: amount,
                    auction: updated,
                })
            }
            Err(StoreError::VersionConflict { .. }) if !retried => {
                warn!(auction_id = %id, "Bid commit lost version race; re-validating");
                let fresh = self
                    .store
                    .auction(id)?
                    .ok_or(AuctionError::AuctionNotFound(id))?;
                match validate_bid(&fresh, bidder, amount, now, &self.config.bid_policy()) {
                    Err(reason) => {
                        let sequence = self.store.next_sequence(id)?;
                        self.store.append_rejected(Bid::new(
                            id,
                            sequence,
                            bidder,
                            amount,
                            now,
                            reason.outcome(),
                        ))?;
                        Ok(BidReceipt {
                            accepted: false,
                            reason: Some(reason),
                            current_bid: fresh.current_bid,
                            auction: fresh,
                        })
                    }
                    Ok(()) => self.commit_accepted(fresh, bidder, amount, now, events, true),
                }
            }
            Err(StoreError::VersionConflict { .. }) => {
                let sequence = self.store.next_sequence(id)?;
                self.store.append_rejected(Bid::new(
                    id,
                    sequence,
                    bidder,
                    amount,
                    now,
                    BidOutcome::RejectedStale,
                ))?;
                Err(AuctionError::Contention(id))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl AuctionEngineApi for AuctionEngine {
    async fn create_auction(&self, request: NewAuctionRequest) -> Result<Auction> {
        let now = self.clock.now();
        let start_time = request.start_time.unwrap_or(now);

        if request.end_time <= start_time {
            return Err(AuctionError::InvalidSchedule {
                start: start_time,
                end: request.end_time,
            });
        }
        if request.starting_bid.is_zero() {
            return Err(AuctionError::ZeroStartingBid);
        }

        let auction = Auction::new(
            request.artwork_id,
            request.seller_id,
            request.starting_bid,
            request.reserve_price,
            request
                .min_increment
                .unwrap_or(self.config.default_min_increment),
            start_time,
            request.end_time,
            now,
        );
        self.store.insert_auction(auction.clone())?;

        info!(
            auction_id = %auction.id,
            seller = %auction.seller_id,
            starting_bid = %auction.starting_bid,
            status = ?auction.status,
            "Auction created"
        );

        if auction.status == AuctionStatus::Active {
            self.publish_events(vec![MarketEvent::AuctionOpened {
                auction_id: auction.id,
                artwork_id: auction.artwork_id,
                seller_id: auction.seller_id,
                end_time: auction.end_time,
            }])
            .await;
        }
        Ok(auction)
    }

    async fn place_bid(
        &self,
        auction_id: AuctionId,
        bidder_id: UserId,
        amount: Money,
    ) -> Result<BidReceipt> {
        // Fail before touching the section registry for unknown auctions
        if self.store.auction(auction_id)?.is_none() {
            return Err(AuctionError::AuctionNotFound(auction_id));
        }

        let guard = self.acquire(auction_id).await?;
        let now = self.clock.now();
        let mut events = Vec::new();
        let result = self.place_bid_locked(auction_id, bidder_id, amount, now, &mut events);
        drop(guard);

        self.publish_events(events).await;
        result
    }

    async fn get_auction(&self, auction_id: AuctionId) -> Result<AuctionView> {
        if self.store.auction(auction_id)?.is_none() {
            return Err(AuctionError::AuctionNotFound(auction_id));
        }

        let guard = self.acquire(auction_id).await?;
        let now = self.clock.now();
        let mut events = Vec::new();
        let result = (|| {
            self.apply_due_transitions(auction_id, now, &mut events)?;
            let auction = self
                .store
                .auction(auction_id)?
                .ok_or(AuctionError::AuctionNotFound(auction_id))?;
            let watcher_count = self.store.watcher_count(auction_id)?;
            Ok(AuctionView {
                auction,
                watcher_count,
            })
        })();
        drop(guard);

        self.publish_events(events).await;
        result
    }

    async fn watch(&self, auction_id: AuctionId, user_id: UserId) -> Result<()> {
        let created = self.store.add_watch(Watch {
            auction_id,
            watcher_id: user_id,
            created_at: self.clock.now(),
        })?;
        if created {
            debug!(auction_id = %auction_id, user = %user_id, "Watch added");
        }
        Ok(())
    }

    async fn unwatch(&self, auction_id: AuctionId, user_id: UserId) -> Result<()> {
        let removed = self.store.remove_watch(auction_id, user_id)?;
        if removed {
            debug!(auction_id = %auction_id, user = %user_id, "Watch removed");
        }
        Ok(())
    }

    async fn list_bids(
        &self,
        auction_id: AuctionId,
        after_sequence: Option<u64>,
    ) -> Result<Vec<Bid>> {
        Ok(self.store.accepted_bids(auction_id, after_sequence)?)
    }

    async fn cancel_auction(
        &self,
        auction_id: AuctionId,
        requested_by: UserId,
    ) -> Result<Auction> {
        if self.store.auction(auction_id)?.is_none() {
            return Err(AuctionError::AuctionNotFound(auction_id));
        }

        let guard = self.acquire(auction_id).await?;
        let now = self.clock.now();
        let mut events = Vec::new();
        let result = (|| {
            // An overdue close wins over a late cancellation
            self.apply_due_transitions(auction_id, now, &mut events)?;
            let auction = self
                .store
                .auction(auction_id)?
                .ok_or(AuctionError::AuctionNotFound(auction_id))?;

            if requested_by != auction.seller_id {
                return Err(AuctionError::NotSeller(auction_id));
            }
            if !matches!(
                auction.status,
                AuctionStatus::Scheduled | AuctionStatus::Active
            ) {
                return Err(AuctionError::WrongStatus {
                    auction_id,
                    status: auction.status,
                    required: "Scheduled or Active",
                });
            }
            if auction.has_bids() && !self.config.allow_cancel_with_bids {
                return Err(AuctionError::CancelNotAllowed {
                    auction_id,
                    reason: "accepted bids exist",
                });
            }

            let mut updated = auction.clone();
            updated.status = AuctionStatus::Cancelled;
            updated.version += 1;
            self.store.commit_transition(auction.version, updated.clone())?;

            info!(auction_id = %auction_id, "Auction cancelled");
            events.push(MarketEvent::AuctionCancelled {
                auction_id,
                seller_id: updated.seller_id,
            });
            Ok(updated)
        })();
        drop(guard);

        self.publish_events(events).await;
        result
    }

    async fn confirm_settlement(&self, auction_id: AuctionId) -> Result<Auction> {
        if self.store.auction(auction_id)?.is_none() {
            return Err(AuctionError::AuctionNotFound(auction_id));
        }

        let guard = self.acquire(auction_id).await?;
        let now = self.clock.now();
        let mut events = Vec::new();
        let result = (|| {
            self.apply_due_transitions(auction_id, now, &mut events)?;
            let auction = self
                .store
                .auction(auction_id)?
                .ok_or(AuctionError::AuctionNotFound(auction_id))?;

            match auction.status {
                AuctionStatus::Ended => {
                    let mut updated = auction.clone();
                    updated.status = AuctionStatus::Settled;
                    updated.version += 1;
                    self.store.commit_transition(auction.version, updated.clone())?;

                    info!(auction_id = %auction_id, "Auction settled");
                    events.push(MarketEvent::AuctionSettled { auction_id });
                    Ok(updated)
                }
                // Repeated confirmations are no-ops
                AuctionStatus::Settled => Ok(auction),
                _ => Err(AuctionError::WrongStatus {
                    auction_id,
                    status: auction.status,
                    required: "Ended",
                }),
            }
        })();
        drop(guard);

        self.publish_events(events).await;
        result
    }
}
