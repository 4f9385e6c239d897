//! Push transport adapters.
//!
//! `LoggingPushTransport` stands in for the realtime socket hub in
//! single-node development; `RecordingPushTransport` captures deliveries for
//! assertions and can simulate per-recipient failures.

use crate::ports::outbound::{Notification, PushTransport, TransportError};
use async_trait::async_trait;
use atelier_types::UserId;
use parking_lot::Mutex;
use tracing::info;

/// Transport that logs each delivery instead of pushing it anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingPushTransport;

#[async_trait]
impl PushTransport for LoggingPushTransport {
    async fn deliver(&self, notification: Notification) -> Result<(), TransportError> {
        info!(
            recipient = %notification.recipient,
            auction_id = %notification.auction_id,
            kind = ?notification.kind,
            amount = ?notification.amount,
            "Notification delivered"
        );
        Ok(())
    }
}

/// Transport that records every delivery for inspection.
#[derive(Default)]
pub struct RecordingPushTransport {
    delivered: Mutex<Vec<Notification>>,
    failing_recipients: Mutex<Vec<UserId>>,
}

impl RecordingPushTransport {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every delivery to `recipient` fail from now on.
    pub fn fail_deliveries_to(&self, recipient: UserId) {
        self.failing_recipients.lock().push(recipient);
    }

    /// Everything delivered so far, in delivery order.
    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered.lock().clone()
    }

    /// Deliveries addressed to one user, in delivery order.
    pub fn delivered_to(&self, recipient: UserId) -> Vec<Notification> {
        self.delivered
            .lock()
            .iter()
            .filter(|n| n.recipient == recipient)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PushTransport for RecordingPushTransport {
    async fn deliver(&self, notification: Notification) -> Result<(), TransportError> {
        if self
            .failing_recipients
            .lock()
            .contains(&notification.recipient)
        {
            return Err(TransportError::Delivery {
                recipient: notification.recipient,
                reason: "socket gone".to_string(),
            });
        }
        self.delivered.lock().push(notification);
        Ok(())
    }
}
