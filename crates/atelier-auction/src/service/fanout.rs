//! Watcher / notification fan-out.
//!
//! A free-running bus subscriber: for every committed state-change event it
//! derives the audience from the store (distinct bidders unioned with the
//! watch set, minus exclusions) and pushes one notification per recipient
//! through the transport. Delivery is at-least-once and fully decoupled from
//! commits; a failed push is logged and dropped, never retried and never
//! propagated back into the engine.

use crate::ports::outbound::{
    AuctionStore, Notification, NotificationKind, PushTransport, StoreError,
};
use atelier_bus::{EventFilter, InMemoryEventBus, MarketEvent};
use atelier_types::{AuctionId, UserId};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Derives audiences and delivers per-recipient notifications.
pub struct NotificationFanout {
    store: Arc<dyn AuctionStore>,
    transport: Arc<dyn PushTransport>,
}

impl NotificationFanout {
    /// Creates a fan-out over the store and transport.
    pub fn new(store: Arc<dyn AuctionStore>, transport: Arc<dyn PushTransport>) -> Self {
        Self { store, transport }
    }

    /// Spawns the subscriber task. It reads committed events until the bus is
    /// dropped.
    pub fn spawn(self, bus: &InMemoryEventBus) -> JoinHandle<()> {
        let mut subscription = bus.subscribe(EventFilter::all());
        tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                self.dispatch(event).await;
            }
            debug!("Notification fan-out stopped: bus closed");
        })
    }

    /// Handles one event: derive the audience, deliver to each recipient.
    pub async fn dispatch(&self, event: MarketEvent) {
        let notifications = match self.derive(&event) {
            Ok(n) => n,
            Err(e) => {
                warn!(
                    auction_id = %event.auction_id(),
                    error = %e,
                    "Fan-out audience lookup failed"
                );
                return;
            }
        };

        for notification in notifications {
            if let Err(e) = self.transport.deliver(notification.clone()).await {
                warn!(
                    recipient = %notification.recipient,
                    auction_id = %notification.auction_id,
                    error = %e,
                    "Notification delivery failed"
                );
            }
        }
    }

    /// Everyone following the auction: every distinct bidder plus every
    /// watcher, deduplicated.
    fn audience(&self, id: AuctionId) -> Result<Vec<UserId>, StoreError> {
        let mut audience = self.store.distinct_bidders(id)?;
        for watcher in self.store.watchers(id)? {
            if !audience.contains(&watcher) {
                audience.push(watcher);
            }
        }
        Ok(audience)
    }

    /// Maps one committed event to its addressed notifications.
    fn derive(&self, event: &MarketEvent) -> Result<Vec<Notification>, StoreError> {
        let mut notifications = Vec::new();
        match event {
            MarketEvent::BidPlaced {
                auction_id,
                bidder_id,
                previous_highest,
                amount,
                ..
            } => {
                // The overtaken bidder hears "outbid", everyone else "new bid";
                // the actor hears nothing.
                if let Some(previous) = previous_highest {
                    if previous != bidder_id {
                        notifications.push(Notification {
                            recipient: *previous,
                            auction_id: *auction_id,
                            kind: NotificationKind::Outbid,
                            amount: Some(*amount),
                        });
                    }
                }
                for user in self.audience(*auction_id)? {
                    if user == *bidder_id || Some(user) == *previous_highest {
                        continue;
                    }
                    notifications.push(Notification {
                        recipient: user,
                        auction_id: *auction_id,
                        kind: NotificationKind::NewBid,
                        amount: Some(*amount),
                    });
                }
            }

            MarketEvent::AuctionEndingSoon { auction_id, .. } => {
                for user in self.audience(*auction_id)? {
                    notifications.push(Notification {
                        recipient: user,
                        auction_id: *auction_id,
                        kind: NotificationKind::EndingSoon,
                        amount: None,
                    });
                }
            }

            MarketEvent::AuctionEnded {
                auction_id,
                winner,
                final_price,
                ..
            } => {
                if let Some(winner) = winner {
                    notifications.push(Notification {
                        recipient: *winner,
                        auction_id: *auction_id,
                        kind: NotificationKind::Won,
                        amount: Some(*final_price),
                    });
                }
                for user in self.audience(*auction_id)? {
                    if Some(user) == *winner {
                        continue;
                    }
                    notifications.push(Notification {
                        recipient: user,
                        auction_id: *auction_id,
                        kind: NotificationKind::Lost,
                        amount: Some(*final_price),
                    });
                }
            }

            MarketEvent::ReserveNotMet {
                auction_id,
                seller_id,
                final_price,
            } => {
                // The seller and every bidder learn there was no sale
                notifications.push(Notification {
                    recipient: *seller_id,
                    auction_id: *auction_id,
                    kind: NotificationKind::ReserveNotMet,
                    amount: Some(*final_price),
                });
                for bidder in self.store.distinct_bidders(*auction_id)? {
                    notifications.push(Notification {
                        recipient: bidder,
                        auction_id: *auction_id,
                        kind: NotificationKind::ReserveNotMet,
                        amount: Some(*final_price),
                    });
                }
            }

            MarketEvent::AuctionCancelled {
                auction_id,
                seller_id,
            } => {
                for user in self.audience(*auction_id)? {
                    if user == *seller_id {
                        continue;
                    }
                    notifications.push(Notification {
                        recipient: user,
                        auction_id: *auction_id,
                        kind: NotificationKind::Cancelled,
                        amount: None,
                    });
                }
            }

            // Settlement handoff and bookkeeping events carry no user-facing
            // notification.
            MarketEvent::AuctionOpened { .. }
            | MarketEvent::AuctionSettled { .. }
            | MarketEvent::WinnerDetermined { .. } => {}
        }
        Ok(notifications)
    }
}
