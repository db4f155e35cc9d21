//! Error types for the shared object store

use shared_types::{ObjectType, ShmHandle};
use thiserror::Error;

/// Segment-level errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentError {
    /// The host cannot back a segment of this size
    #[error("Segment {name}: cannot create {requested} bytes, host limit {limit}")]
    TooLarge {
        name: String,
        requested: usize,
        limit: usize,
    },

    /// Every size of the halving ladder failed
    #[error("Segment {name}: creation failed down to {floor} bytes")]
    Exhausted { name: String, floor: usize },

    /// The segment has no room for another record
    #[error("Segment full: {requested} bytes requested, {available} available")]
    OutOfSpace { requested: usize, available: usize },

    /// The handle does not address a live record
    #[error("Stale or foreign handle {0}")]
    StaleHandle(ShmHandle),

    /// A transfer token was already taken or dropped
    #[error("Transfer token {0} already consumed")]
    TransferConsumed(u64),

    /// More releases than acquisitions
    #[error("Reference count underflow at {0}")]
    RefcountUnderflow(ShmHandle),

    /// A live record already uses the name
    #[error("Object name {0} already in use")]
    NameInUse(String),
}

/// Object-level errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectError {
    /// The object lives in another segment
    #[error("Object {object} is not stored in segment {segment}")]
    ForeignSegment { object: String, segment: String },

    /// No factory registered for the type tag
    #[error("No object type registered for tag {0}")]
    UnregisteredType(i32),

    /// A factory for the type exists already
    #[error("Object type {0} registered twice")]
    DuplicateType(ObjectType),

    /// A typed view was requested for an object of another type
    #[error("Expected object of type {expected}, found {found}")]
    WrongType {
        expected: ObjectType,
        found: ObjectType,
    },

    /// The payload does not fit the object type
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error(transparent)]
    Segment(#[from] SegmentError),
}

/// Result type for object operations
pub type ObjectResult<T> = Result<T, ObjectError>;
