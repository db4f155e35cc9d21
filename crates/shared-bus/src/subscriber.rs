//! # Subscriptions
//!
//! Receiving end of the observer bus.

use crate::filter::MessageFilter;
use shared_types::Message;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("Message bus closed")]
    Closed,
}

pub struct Subscription {
    receiver: broadcast::Receiver<Message>,
    filter: MessageFilter,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<Message>, filter: MessageFilter) -> Self {
        Self { receiver, filter }
    }

    /// Wait for the next selected message; `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<Message> {
        loop {
            match self.receiver.recv().await {
                Ok(msg) if self.filter.matches(&msg) => return Some(msg),
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => warn!(missed = missed, "Observer fell behind"),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next selected message that is already queued.
    pub fn try_recv(&mut self) -> Result<Option<Message>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(msg) if self.filter.matches(&msg) => return Ok(Some(msg)),
                Ok(_) => {}
                Err(TryRecvError::Lagged(missed)) => warn!(missed = missed, "Observer fell behind"),
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Closed) => return Err(SubscriptionError::Closed),
            }
        }
    }
}
