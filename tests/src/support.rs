//! Shared fixtures for integration tests.

use atelier_auction::adapters::{MemoryAuctionStore, RecordingPushTransport};
use atelier_auction::ports::inbound::NewAuctionRequest;
use atelier_auction::ports::outbound::{AuctionStore, MockTimeSource, PushTransport};
use atelier_auction::service::{AuctionEngine, NotificationFanout};
use atelier_auction::{Auction, AuctionEngineApi, EngineConfig};
use atelier_bus::InMemoryEventBus;
use atelier_types::{ArtworkId, Money, Timestamp, UserId};
use std::sync::{Arc, Once};
use tokio::task::JoinHandle;

static TRACING: Once = Once::new();

/// Installs the env-filtered subscriber once per test binary. Run noisy
/// suites with `RUST_LOG=atelier_auction=debug` to watch the engine work.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Everything an integration test needs wired together over the in-memory
/// store: the engine, its deterministic clock, the bus, and a recording
/// transport fed by a spawned fan-out task.
pub struct Harness {
    pub engine: Arc<AuctionEngine>,
    pub clock: Arc<MockTimeSource>,
    pub bus: Arc<InMemoryEventBus>,
    pub transport: Arc<RecordingPushTransport>,
    pub fanout_task: JoinHandle<()>,
}

impl Harness {
    /// Builds a harness at t=1000ms with testing timeouts.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::for_testing())
    }

    /// Builds a harness with a custom engine configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        init_tracing();
        let store: Arc<dyn AuctionStore> = Arc::new(MemoryAuctionStore::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let clock = Arc::new(MockTimeSource::new(1_000));
        let transport = Arc::new(RecordingPushTransport::new());

        let engine = Arc::new(AuctionEngine::new(
            Arc::clone(&store),
            Arc::clone(&bus),
            clock.clone(),
            config,
        ));

        let fanout = NotificationFanout::new(
            store,
            Arc::clone(&transport) as Arc<dyn PushTransport>,
        );
        let fanout_task = fanout.spawn(&bus);

        Self {
            engine,
            clock,
            bus,
            transport,
            fanout_task,
        }
    }

    /// Creates an auction open now, ending at `end_time`.
    pub async fn open_auction(
        &self,
        starting_cents: u64,
        reserve_cents: Option<u64>,
        end_time: Timestamp,
    ) -> Auction {
        self.engine
            .create_auction(NewAuctionRequest {
                artwork_id: ArtworkId::new(),
                seller_id: UserId::new(),
                starting_bid: Money::from_cents(starting_cents),
                reserve_price: reserve_cents.map(Money::from_cents),
                start_time: None,
                end_time,
                min_increment: Some(Money::from_cents(100)),
            })
            .await
            .expect("auction creation")
    }

    /// Polls the recording transport until `predicate` holds or the deadline
    /// passes. Fan-out is asynchronous; tests wait for delivery instead of
    /// assuming it.
    pub async fn wait_for_deliveries<F>(&self, predicate: F) -> bool
    where
        F: Fn(&RecordingPushTransport) -> bool,
    {
        for _ in 0..200 {
            if predicate(&self.transport) {
                return true;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        false
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
