//! # Error Types
//!
//! Errors raised while building, inspecting or encoding control messages.

use crate::ids::Identity;
use crate::message::MessageType;
use crate::parameter::ParameterType;
use thiserror::Error;

/// Errors from typed message construction and access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// A constructor or accessor was handed a message of another type.
    #[error("Unexpected message type: expected {expected}, found {found}")]
    UnexpectedType {
        expected: MessageType,
        found: MessageType,
    },

    /// The identity is not valid for this kind of handshake.
    #[error("Identity {0} not allowed here")]
    InvalidIdentity(Identity),

    /// The parameter type cannot travel in a message.
    #[error("Parameter type {0:?} not supported")]
    UnsupportedParameterType(ParameterType),

    /// A vector value claims more components than it can hold.
    #[error("Vector dimension {dim} exceeds {max}")]
    DimensionOutOfRange { dim: usize, max: usize },
}

/// Errors from the fixed-size wire codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Encoded form does not fit into one message block.
    #[error("Message too large: {size} bytes, block is {max}")]
    Oversize { size: usize, max: usize },

    /// Input is not exactly one message block.
    #[error("Wrong block length: {len} bytes, expected {expected}")]
    WrongLength { len: usize, expected: usize },

    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error("Decoding failed: {0}")]
    Decode(String),
}
