//! # Atelier Bus - Event Bus for Marketplace Components
//!
//! Carries every state-change fact the auction engine produces to whoever
//! cares about it: the notification fan-out, the realtime socket hub, and the
//! payment collaborator.
//!
//! ## Decoupling Rules
//!
//! - The bidding coordinator and lifecycle scheduler publish *after* commit;
//!   they never wait on consumers.
//! - Consumers subscribe with a topic filter and read at their own pace; a
//!   slow consumer lags and drops, it never back-pressures a bid commit.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  Coordinator │                    │   Fan-out    │
//! │  Scheduler   │    publish()       │   Payment    │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, MarketEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before backpressure.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
