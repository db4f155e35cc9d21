//! # Message Queues
//!
//! Named, bounded, single-consumer queues of control messages.
//! A full queue rejects `try_send` instead of growing.

use shared_types::Message;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::trace;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Queue {name} is full")]
    Full { name: String },

    #[error("Queue {name} is closed")]
    Closed { name: String },
}

/// Constructor namespace for queue pairs.
pub struct MessageQueue;

impl MessageQueue {
    /// Create a queue named `name` holding at most `depth` messages.
    #[must_use]
    pub fn bounded(name: &str, depth: usize) -> (QueueSender, QueueReceiver) {
        let (tx, rx) = mpsc::channel(depth.max(1));
        let name: Arc<str> = Arc::from(name);
        (
            QueueSender { name, tx },
            QueueReceiver { rx },
        )
    }
}

/// Sending half. Cheap to clone.
#[derive(Debug, Clone)]
pub struct QueueSender {
    name: Arc<str>,
    tx: mpsc::Sender<Message>,
}

impl QueueSender {
    /// Enqueue without waiting.
    pub fn try_send(&self, msg: Message) -> Result<(), QueueError> {
        self.tx.try_send(msg).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full {
                name: self.name.to_string(),
            },
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed {
                name: self.name.to_string(),
            },
        })?;
        trace!(queue = %self.name, message_type = %msg.message_type(), "Enqueued");
        Ok(())
    }
}

/// Receiving half.
#[derive(Debug)]
pub struct QueueReceiver {
    rx: mpsc::Receiver<Message>,
}

impl QueueReceiver {
    pub fn try_recv(&mut self) -> Option<Message> {
        self.rx.try_recv().ok()
    }

    /// Everything currently queued.
    pub fn drain(&mut self) -> Vec<Message> {
        let mut out = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            out.push(msg);
        }
        out
    }
}
