//! Notification boundary.
//!
//! Email/SMS delivery is another system's job. Notifications here are
//! fire-and-forget: implementations swallow and log their own failures, and
//! the orchestrator never lets a notification block or fail a transition.

use async_trait::async_trait;

/// Lifecycle events customers are notified about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyEvent {
    OrderPlaced,
    PaymentConfirmed,
    OrderShipped,
    OrderDelivered,
    OrderCancelled,
}

impl NotifyEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyEvent::OrderPlaced => "order_placed",
            NotifyEvent::PaymentConfirmed => "payment_confirmed",
            NotifyEvent::OrderShipped => "order_shipped",
            NotifyEvent::OrderDelivered => "order_delivered",
            NotifyEvent::OrderCancelled => "order_cancelled",
        }
    }
}

/// Fire-and-forget notification sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends a notification. Must not fail outward; implementations log
    /// their own delivery errors.
    async fn notify(&self, event: NotifyEvent, recipient: &str, payload: serde_json::Value);
}

/// Notifier that only writes structured log events.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: NotifyEvent, recipient: &str, payload: serde_json::Value) {
        tracing::info!(event = event.as_str(), recipient, %payload, "notification");
    }
}
