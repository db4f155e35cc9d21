//! # Observer Bus
//!
//! Fan-out of control messages to observers. Every subscriber sees every
//! published message and keeps the ones its filter selects.

use crate::filter::MessageFilter;
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use shared_types::Message;
use tokio::sync::broadcast;
use tracing::trace;

/// Sink for messages leaving a session.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Hand `msg` to the observers. Returns how many were attached.
    async fn publish(&self, msg: Message) -> usize;
}

pub struct InMemoryMessageBus {
    sender: broadcast::Sender<Message>,
}

impl InMemoryMessageBus {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self, filter: MessageFilter) -> Subscription {
        Subscription::new(self.sender.subscribe(), filter)
    }
}

impl Default for InMemoryMessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagePublisher for InMemoryMessageBus {
    async fn publish(&self, msg: Message) -> usize {
        // send only fails when nobody listens
        let observers = self.sender.send(msg).unwrap_or(0);
        trace!(
            message_type = %msg.message_type(),
            sender = msg.sender_id(),
            observers = observers,
            "Message published"
        );
        observers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::message::Payload;
    use shared_types::MessageType;

    #[tokio::test]
    async fn test_publish_without_observers() {
        let bus = InMemoryMessageBus::new();
        assert_eq!(bus.publish(Message::new(Payload::Idle)).await, 0);
    }

    #[tokio::test]
    async fn test_every_observer_counted() {
        let bus = InMemoryMessageBus::default();
        let _all = bus.subscribe(MessageFilter::all());
        let _busy = bus.subscribe(MessageFilter::types(vec![MessageType::Busy]));
        // selection happens when receiving
        assert_eq!(bus.publish(Message::new(Payload::Idle)).await, 2);
    }
}
