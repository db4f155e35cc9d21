//! Error types for object transfers

use df_02_shm::{ObjectError, SegmentError};
use shared_types::{MessageError, MessageType};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// A transfer step was handed a message of another type
    #[error("Expected {expected} message, found {found}")]
    UnexpectedMessage {
        expected: MessageType,
        found: MessageType,
    },

    /// The announcement was already taken or dropped
    #[error("Object {name}: announcement {token} already consumed")]
    AlreadyTaken { name: String, token: u64 },

    /// Neither the handle nor the name resolves here
    #[error("Object {name} not available in segment {segment}")]
    Unavailable { name: String, segment: String },

    /// Received byte count differs from the announced size
    #[error("Object {name}: declared {declared} bytes, received {received}")]
    SizeMismatch {
        name: String,
        declared: u64,
        received: u64,
    },

    /// Deserialized object is not the one announced
    #[error("Expected object {expected}, received {found}")]
    WrongObject { expected: String, found: String },

    /// Completion for an announcement that is not tracked
    #[error("No announcement tracked for {0}")]
    UnknownAnnouncement(Uuid),

    #[error(transparent)]
    Object(#[from] ObjectError),

    #[error(transparent)]
    Segment(#[from] SegmentError),

    #[error(transparent)]
    Message(#[from] MessageError),
}

pub type TransferResult<T> = Result<T, TransferError>;
