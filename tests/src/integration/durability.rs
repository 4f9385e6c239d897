//! # Durability Tests
//!
//! The engine over the RocksDB-backed store: committed bids, watches, and
//! lifecycle state survive a close-and-reopen.

#[cfg(test)]
mod tests {
    use atelier_auction::adapters::{RocksAuctionStore, RocksStoreConfig};
    use atelier_auction::ports::inbound::NewAuctionRequest;
    use atelier_auction::ports::outbound::{AuctionStore, MockTimeSource};
    use atelier_auction::service::AuctionEngine;
    use atelier_auction::{AuctionEngineApi, AuctionStatus, EngineConfig};
    use atelier_bus::InMemoryEventBus;
    use atelier_types::{ArtworkId, AuctionId, Money, UserId};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn engine_over(
        dir: &TempDir,
        initial_time: u64,
    ) -> (Arc<AuctionEngine>, Arc<MockTimeSource>) {
        let path = dir.path().join("auctions").to_string_lossy().to_string();
        let store: Arc<dyn AuctionStore> =
            Arc::new(RocksAuctionStore::open(RocksStoreConfig::for_testing(path)).unwrap());
        let clock = Arc::new(MockTimeSource::new(initial_time));
        let engine = Arc::new(AuctionEngine::new(
            store,
            Arc::new(InMemoryEventBus::new()),
            clock.clone(),
            EngineConfig::for_testing(),
        ));
        (engine, clock)
    }

    async fn seed_auction(engine: &AuctionEngine) -> AuctionId {
        engine
            .create_auction(NewAuctionRequest {
                artwork_id: ArtworkId::new(),
                seller_id: UserId::new(),
                starting_bid: Money::from_cents(1_000),
                reserve_price: None,
                start_time: None,
                end_time: 10_000,
                min_increment: Some(Money::from_cents(100)),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_bids_and_watches_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let bidder = UserId::new();
        let watcher = UserId::new();
        let auction_id;

        {
            let (engine, _) = engine_over(&dir, 1_000);
            auction_id = seed_auction(&engine).await;
            engine.watch(auction_id, watcher).await.unwrap();
            engine
                .place_bid(auction_id, bidder, Money::from_cents(1_000))
                .await
                .unwrap();
            engine
                .place_bid(auction_id, UserId::new(), Money::from_cents(500))
                .await
                .unwrap(); // rejected, still audited
        }

        let (engine, _) = engine_over(&dir, 2_000);
        let view = engine.get_auction(auction_id).await.unwrap();
        assert_eq!(view.auction.current_bid, Money::from_cents(1_000));
        assert_eq!(view.auction.highest_bidder, Some(bidder));
        assert_eq!(view.watcher_count, 2); // explicit watcher + implicit bidder

        let history = engine.store().bid_history(auction_id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(engine.list_bids(auction_id, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bidding_resumes_after_reopen() {
        let dir = TempDir::new().unwrap();
        let auction_id;

        {
            let (engine, _) = engine_over(&dir, 1_000);
            auction_id = seed_auction(&engine).await;
            engine
                .place_bid(auction_id, UserId::new(), Money::from_cents(1_000))
                .await
                .unwrap();
        }

        // A new process picks up where the old one stopped
        let (engine, clock) = engine_over(&dir, 2_000);
        let receipt = engine
            .place_bid(auction_id, UserId::new(), Money::from_cents(1_100))
            .await
            .unwrap();
        assert!(receipt.accepted);
        assert_eq!(receipt.auction.total_bid_count, 2);

        // Close it and confirm the terminal state also persists
        clock.set(10_000);
        engine.sweep().await.unwrap();

        let (engine, _) = engine_over(&dir, 20_000);
        let view = engine.get_auction(auction_id).await.unwrap();
        assert_eq!(view.auction.status, AuctionStatus::Ended);
        assert_eq!(view.auction.current_bid, Money::from_cents(1_100));
    }
}
