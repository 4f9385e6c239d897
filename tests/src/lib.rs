//! # Atelier Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── support.rs        # Shared harness: engine + bus + recording transport
//! │
//! └── integration/      # Cross-crate flows
//!     ├── bidding.rs    # Concurrent bid races and serialization guarantees
//!     ├── lifecycle.rs  # Sweep transitions, reserve scenarios, settlement
//!     ├── fanout_flow.rs# Bus-to-notification delivery end to end
//!     └── durability.rs # RocksDB-backed store across reopen
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p atelier-tests
//!
//! # By category
//! cargo test -p atelier-tests integration::bidding::
//! cargo test -p atelier-tests integration::lifecycle::
//! ```

#![allow(dead_code)]

pub mod integration;
pub mod support;
