//! Lifecycle sweep loop.
//!
//! Drives time-based transitions at a fixed interval. The sweep itself lives
//! on the engine (it shares the per-auction sections with `place_bid`); this
//! type only owns the ticker task. Reads remain lazily self-correcting, so a
//! stalled sweep degrades freshness, never correctness.

use super::engine::AuctionEngine;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

/// Periodic driver for the engine's lifecycle sweep.
pub struct LifecycleScheduler {
    engine: Arc<AuctionEngine>,
}

impl LifecycleScheduler {
    /// Creates a scheduler over the engine.
    pub fn new(engine: Arc<AuctionEngine>) -> Self {
        Self { engine }
    }

    /// Spawns the sweep loop at the engine's configured interval.
    ///
    /// One instance per deployment: a clustered setup elects a single sweep
    /// owner at the orchestration layer.
    pub fn spawn(self) -> JoinHandle<()> {
        let interval = self.engine.config().sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match self.engine.sweep().await {
                    Ok(published) if published > 0 => {
                        debug!(events = published, "Lifecycle sweep published events");
                    }
                    Ok(_) => {}
                    Err(e) => error!(error = %e, "Lifecycle sweep failed"),
                }
            }
        })
    }
}
