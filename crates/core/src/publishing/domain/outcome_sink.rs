use thiserror::Error;

use crate::publishing::domain::delivery::DeliverySnapshot;
use crate::shared::outcome::Outcome;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("publish queue is full")]
    QueueFull,
    #[error("publisher is shut down")]
    Closed,
}

/// Where the loop sends each outcome. Must not wait for delivery.
pub trait OutcomeSink: Send {
    fn publish(&self, outcome: &Outcome) -> Result<(), PublishError>;

    /// Waits for queued events to be handled and returns the final
    /// delivery counters. Later publishes fail with [`PublishError::Closed`].
    fn drain(&mut self) -> DeliverySnapshot;
}
