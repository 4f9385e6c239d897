//! # Auction Bidding Engine
//!
//! The authoritative component for live artwork auctions: accepts bids,
//! enforces price and timing invariants under concurrent access, determines
//! winners, and fans out state-change events to bidders, watchers, and the
//! selling artist.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Accepted bid amounts strictly increase per auction | `domain/ledger.rs` - `append()` check |
//! | `current_bid >= starting_bid`, monotonically non-decreasing | `domain/validation.rs` + versioned commit |
//! | At most one accepted bid commits per auction at a time | `service/engine.rs` - per-auction mutex |
//! | A bid at the closing boundary is accepted before or rejected after the transition, never both | sweep and `place_bid` share the auction's mutex |
//! | Bid row + auction update commit atomically or not at all | `AuctionStore::commit_bid` contract |
//! | Lifecycle sweeps are idempotent | `domain/lifecycle.rs` - transitions fire from source state only |
//!
//! ## Concurrency Model
//!
//! Bids on different auctions proceed independently. Calls targeting the same
//! auction serialize through that auction's exclusive section, acquired with a
//! bounded wait: a caller that cannot get the section in time fails fast with
//! a retryable error. Locks are never nested across auctions and are held only
//! for validate + commit. Event publication and notification delivery happen
//! strictly after the section is released.
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      OUTER LAYER                                │
//! │  adapters/ - in-memory store, RocksDB store, push transports    │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MIDDLE LAYER                               │
//! │  ports/inbound.rs  - AuctionEngineApi trait                     │
//! │  ports/outbound.rs - AuctionStore, TimeSource, PushTransport    │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      INNER LAYER                                │
//! │  domain/entities.rs   - Auction, Bid, Watch, status machine     │
//! │  domain/ledger.rs     - append-only per-auction bid record      │
//! │  domain/validation.rs - pure bid acceptance decision            │
//! │  domain/lifecycle.rs  - pure time-based transition computation  │
//! │  domain/errors.rs     - AuctionError enum                       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `service` layer ties the three together: `AuctionEngine` (bidding
//! coordinator), `LifecycleScheduler` (interval sweep), and
//! `NotificationFanout` (bus subscriber delivering per-recipient
//! notifications).

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::EngineConfig;
pub use domain::*;
pub use ports::*;
pub use service::{AuctionEngine, LifecycleScheduler, NotificationFanout};
