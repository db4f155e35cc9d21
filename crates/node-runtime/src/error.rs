//! Errors surfaced by the runtime wiring.

use crate::container::ConfigError;
use df_01_routing::RoutingError;
use df_02_shm::{ObjectError, SegmentError};
use df_03_object_transfer::TransferError;
use shared_bus::QueueError;
use shared_types::MessageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Routing: {0}")]
    Routing(#[from] RoutingError),

    #[error("Shared segment: {0}")]
    Segment(#[from] SegmentError),

    #[error("Object: {0}")]
    Object(#[from] ObjectError),

    #[error("Transfer: {0}")]
    Transfer(#[from] TransferError),

    #[error("Message: {0}")]
    Message(#[from] MessageError),

    #[error("Queue: {0}")]
    Queue(#[from] QueueError),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
