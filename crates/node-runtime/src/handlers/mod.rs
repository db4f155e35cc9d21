//! # Message Handlers
//!
//! Handlers run for messages whose route says this process handles them.
//! Each returns the messages it wants sent in reply; payload bytes of the
//! byte transfer path travel next to their `SendObject` header.

pub mod barrier;
pub mod objects;

pub use barrier::BarrierHandler;
pub use objects::{ObjectHandler, Received};

use crate::error::RuntimeResult;
use async_trait::async_trait;
use shared_types::{Message, MessageType};

/// A message to send, with the out-of-band bytes that follow it.
#[derive(Debug, Clone, PartialEq)]
pub struct Outgoing {
    pub message: Message,
    pub payload: Option<Vec<u8>>,
}

impl Outgoing {
    #[must_use]
    pub fn with_payload(message: Message, payload: Vec<u8>) -> Self {
        Self {
            message,
            payload: Some(payload),
        }
    }
}

impl From<Message> for Outgoing {
    fn from(message: Message) -> Self {
        Self {
            message,
            payload: None,
        }
    }
}

#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Does this handler act on messages of type `t`?
    fn handles(&self, t: MessageType) -> bool;

    async fn handle(&self, msg: &Message, payload: Option<&[u8]>) -> RuntimeResult<Vec<Outgoing>>;
}
