//! Error types for routing and coordination

use shared_types::{MessageType, ProcessId};
use thiserror::Error;
use uuid::Uuid;

/// Routing subsystem errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// A message type has no routing entry
    #[error("Message routing table not initialized for {message_type}")]
    MissingRoute { message_type: MessageType },

    /// The message does not belong to this operation
    #[error("Unexpected message type {found}")]
    UnexpectedMessage { found: MessageType },

    /// No barrier with this correlation id is active
    #[error("Unknown barrier {uuid}")]
    UnknownBarrier { uuid: Uuid },

    /// A barrier was started twice
    #[error("Barrier {uuid} already active")]
    DuplicateBarrier { uuid: Uuid },

    /// The sender is not an expected participant of the barrier
    #[error("Process {participant} is not a participant of barrier {uuid}")]
    NotAParticipant { uuid: Uuid, participant: ProcessId },

    /// The barrier ended before it completed
    #[error("Barrier {uuid} cancelled")]
    BarrierCancelled { uuid: Uuid },

    /// The pending queue reached its bound
    #[error("Pending queue full ({capacity} messages)")]
    PendingQueueFull { capacity: usize },
}

/// Result type for routing operations
pub type RoutingResult<T> = Result<T, RoutingError>;
