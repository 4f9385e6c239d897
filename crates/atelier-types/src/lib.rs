//! # Shared Types Crate
//!
//! Cross-crate primitives for the Atelier marketplace: opaque identifiers,
//! fixed-point money, and server timestamps.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every identifier that crosses a crate
//!   boundary is defined here, once.
//! - **Opaque IDs**: auction, bid, user, and artwork identifiers are uuid
//!   newtypes; nothing outside this crate depends on their representation.
//! - **Server Time Only**: all timestamps originate from a server-side
//!   `TimeSource`; client-supplied timestamps are never trusted.

pub mod ids;
pub mod money;
pub mod time;

pub use ids::{ArtworkId, AuctionId, BidId, UserId};
pub use money::Money;
pub use time::Timestamp;
