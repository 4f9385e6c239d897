//! Configuration types for the auction engine

use crate::domain::validation::BidPolicy;
use atelier_types::Money;
use serde::Deserialize;
use std::time::Duration;

/// Runtime configuration for the auction engine.
#[derive(Clone, Debug, Deserialize)]
pub struct EngineConfig {
    /// Minimum step above the current bid when an auction does not set its own
    /// increment (integer cents).
    pub default_min_increment: Money,

    /// Maximum time a `place_bid` call waits for an auction's exclusive
    /// section before failing fast with a retryable error.
    #[serde(with = "duration_millis")]
    pub lock_wait: Duration,

    /// Interval between lifecycle sweeps.
    #[serde(with = "duration_millis")]
    pub sweep_interval: Duration,

    /// How long before `end_time` the one-shot ending-soon notification fires
    /// (milliseconds).
    pub ending_soon_window_ms: u64,

    /// Whether the standing highest bidder may raise their own bid.
    pub allow_self_outbid: bool,

    /// Whether a seller may cancel an auction that already has accepted bids.
    pub allow_cancel_with_bids: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_min_increment: Money::from_cents(100), // one currency unit
            lock_wait: Duration::from_secs(3),
            sweep_interval: Duration::from_secs(1),
            ending_soon_window_ms: 60_000, // one minute
            allow_self_outbid: false,
            allow_cancel_with_bids: false,
        }
    }
}

impl EngineConfig {
    /// Creates a config with short waits for testing.
    pub fn for_testing() -> Self {
        Self {
            lock_wait: Duration::from_millis(200),
            sweep_interval: Duration::from_millis(20),
            ending_soon_window_ms: 1_000,
            ..Default::default()
        }
    }

    /// The validator policy slice of this configuration.
    pub fn bid_policy(&self) -> BidPolicy {
        BidPolicy {
            allow_self_outbid: self.allow_self_outbid,
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
