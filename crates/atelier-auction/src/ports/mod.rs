//! Ports for the auction engine: the driving API trait and the driven
//! dependencies (clock, store, push transport).

pub mod inbound;
pub mod outbound;

pub use inbound::{AuctionEngineApi, AuctionView, BidReceipt, NewAuctionRequest};
pub use outbound::{
    AuctionStore, BidCommit, MockTimeSource, Notification, NotificationKind, PushTransport,
    StoreError, SystemTimeSource, TimeSource, TransportError,
};
