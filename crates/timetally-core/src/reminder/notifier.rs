//! Delivery seam between the scheduler and whatever transport carries the
//! message to the user.

use async_trait::async_trait;

use crate::storage::UserId;

/// What happened to one delivery attempt. Failure is a value, not an error:
/// the scheduler logs it and moves on, it never aborts the tick loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed(String),
}

/// Transport-side message delivery.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, user: UserId, text: &str) -> DeliveryOutcome;
}
