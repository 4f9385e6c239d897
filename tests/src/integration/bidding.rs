//! # Concurrent Bidding Tests
//!
//! Exercises the coordinator's serialization guarantee: concurrent bid
//! attempts on one auction never both commit against the same snapshot, the
//! accepted amounts replay strictly increasing, and bids on different
//! auctions do not block each other.

#[cfg(test)]
mod tests {
    use crate::support::Harness;
    use atelier_auction::{AuctionEngineApi, BidOutcome, RejectReason};
    use atelier_types::{Money, UserId};
    use rand::seq::SliceRandom;
    use rand::thread_rng;

    /// Two bidders race with 2000 and 2100 against a standing price of 1000.
    /// Whatever the interleaving: exactly one serialized order exists, the
    /// final price is 2100, and no outcome has both accepted with a lower
    /// final price.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_two_way_race_never_double_commits() {
        for _ in 0..25 {
            let harness = Harness::new();
            let auction = harness.open_auction(1_000, None, 100_000).await;

            let low = UserId::new();
            let high = UserId::new();
            let engine_a = harness.engine.clone();
            let engine_b = harness.engine.clone();
            let id = auction.id;

            let a = tokio::spawn(async move {
                engine_a.place_bid(id, low, Money::from_cents(2_000)).await
            });
            let b = tokio::spawn(async move {
                engine_b.place_bid(id, high, Money::from_cents(2_100)).await
            });

            let receipt_low = a.await.unwrap().unwrap();
            let receipt_high = b.await.unwrap().unwrap();

            // 2100 always clears: it beats both possible standing prices
            assert!(receipt_high.accepted);

            let view = harness.engine.get_auction(id).await.unwrap();
            assert_eq!(view.auction.current_bid, Money::from_cents(2_100));

            if receipt_low.accepted {
                // 2000 ran first; 2100 was evaluated against it
                assert_eq!(view.auction.total_bid_count, 2);
            } else {
                // 2100 ran first; 2000 fell below minimum
                assert!(matches!(
                    receipt_low.reason,
                    Some(RejectReason::BelowMinimum { .. })
                ));
                assert_eq!(view.auction.total_bid_count, 1);
            }

            // Replay the ledger: accepted amounts strictly increase
            let accepted = harness.engine.list_bids(id, None).await.unwrap();
            assert!(accepted.windows(2).all(|w| w[0].amount < w[1].amount));
        }
    }

    /// A pile of concurrent bidders with shuffled amounts. However the
    /// commits interleave, the ledger replays strictly increasing and the
    /// final price equals the largest accepted amount.
    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_many_way_race_keeps_ledger_monotonic() {
        let harness = Harness::new();
        let auction = harness.open_auction(1_000, None, 100_000).await;

        let mut amounts: Vec<u64> = (1..=20).map(|i| 1_000 + i * 150).collect();
        amounts.shuffle(&mut thread_rng());

        let mut handles = Vec::new();
        for cents in amounts {
            let engine = harness.engine.clone();
            let id = auction.id;
            handles.push(tokio::spawn(async move {
                engine
                    .place_bid(id, UserId::new(), Money::from_cents(cents))
                    .await
            }));
        }

        let mut accepted_amounts = Vec::new();
        for handle in handles {
            let receipt = handle.await.unwrap().unwrap();
            if receipt.accepted {
                accepted_amounts.push(receipt.current_bid);
            }
        }

        assert!(!accepted_amounts.is_empty());

        let accepted = harness.engine.list_bids(auction.id, None).await.unwrap();
        assert_eq!(accepted.len(), accepted_amounts.len());
        assert!(accepted.windows(2).all(|w| w[0].amount < w[1].amount));

        let view = harness.engine.get_auction(auction.id).await.unwrap();
        let max_accepted = accepted.last().map(|b| b.amount).unwrap();
        assert_eq!(view.auction.current_bid, max_accepted);
        assert_eq!(view.auction.total_bid_count, accepted.len() as u64);
    }

    /// Bids on different auctions proceed independently: a burst across many
    /// auctions completes with every first bid accepted.
    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_cross_auction_independence() {
        let harness = Harness::new();
        let mut auctions = Vec::new();
        for _ in 0..8 {
            auctions.push(harness.open_auction(1_000, None, 100_000).await);
        }

        let mut handles = Vec::new();
        for auction in &auctions {
            let engine = harness.engine.clone();
            let id = auction.id;
            handles.push(tokio::spawn(async move {
                engine
                    .place_bid(id, UserId::new(), Money::from_cents(1_000))
                    .await
            }));
        }

        for handle in handles {
            assert!(handle.await.unwrap().unwrap().accepted);
        }
    }

    /// Every attempt lands on the audit ledger, rejections included, with
    /// dense per-auction sequences.
    #[tokio::test]
    async fn test_audit_ledger_records_every_attempt() {
        let harness = Harness::new();
        let auction = harness.open_auction(1_000, None, 100_000).await;

        let bidder = UserId::new();
        harness
            .engine
            .place_bid(auction.id, bidder, Money::from_cents(1_000))
            .await
            .unwrap();
        harness
            .engine
            .place_bid(auction.id, UserId::new(), Money::from_cents(1_050))
            .await
            .unwrap(); // below min: rejected
        harness
            .engine
            .place_bid(auction.id, UserId::new(), Money::from_cents(1_100))
            .await
            .unwrap();

        let history = harness.engine.store().bid_history(auction.id).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(
            history.iter().map(|b| b.sequence).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(history[1].outcome, BidOutcome::RejectedBelowMinimum);

        let accepted = harness.engine.list_bids(auction.id, None).await.unwrap();
        assert_eq!(accepted.len(), 2);
    }

    /// An exact-increment bid clears; one cent below does not.
    #[tokio::test]
    async fn test_exact_increment_boundary() {
        let harness = Harness::new();
        let auction = harness.open_auction(1_000, None, 100_000).await;

        harness
            .engine
            .place_bid(auction.id, UserId::new(), Money::from_cents(1_000))
            .await
            .unwrap();

        let below = harness
            .engine
            .place_bid(auction.id, UserId::new(), Money::from_cents(1_099))
            .await
            .unwrap();
        assert!(!below.accepted);
        assert_eq!(
            below.reason,
            Some(RejectReason::BelowMinimum {
                minimum: Money::from_cents(1_100)
            })
        );

        let exact = harness
            .engine
            .place_bid(auction.id, UserId::new(), Money::from_cents(1_100))
            .await
            .unwrap();
        assert!(exact.accepted);
    }
}
