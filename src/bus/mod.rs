//! Message bus seam.
//!
//! The consumer owns the receive loop and hands each delivery body to a
//! [`MessageHandler`], one at a time.

pub mod amqp;

use async_trait::async_trait;

use crate::error::{BusError, Error};

pub use amqp::AmqpConsumer;

/// Per-message callback registered with a consumer.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle one delivery. Errors are logged by the consumer and the
    /// message is dropped.
    async fn handle(&self, body: &[u8]) -> Result<(), Error>;
}

/// A connected consumer that drives a handler until the subscription ends.
#[async_trait]
pub trait MessageSource: Send {
    /// Only returns on failure; a healthy subscription runs forever.
    async fn consume(&mut self, handler: &dyn MessageHandler) -> Result<(), BusError>;
}
