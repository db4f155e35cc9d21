//! # Shared Types Crate
//!
//! Value types that cross process boundaries in the dataflow runtime: process
//! ids and identities, the control [`Message`] envelope with all of its
//! payloads, the fixed-size wire codec, object metadata and type tags, and the
//! parameter and port models modules expose.
//!
//! ## Design Principles
//!
//! - **Plain values**: every message is `Copy` and owns no heap memory, so it
//!   can be queued, replayed and written to a socket as one block.
//! - **Bounded text**: strings are stored inline with a fixed capacity. Longer
//!   input is cut at a character boundary and the cut is recorded.
//! - **Correlated replies**: replies are built from the message they answer.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod bounded;
pub mod codec;
pub mod errors;
pub mod handle;
pub mod ids;
pub mod message;
pub mod meta;
pub mod object_type;
pub mod parameter;
pub mod port;

pub use bounded::BoundedStr;
pub use errors::{CodecError, MessageError};
pub use handle::ShmHandle;
pub use ids::{Identity, ProcessId};
pub use message::{Message, MessageType, Payload};
pub use meta::Meta;
pub use object_type::{ObjectType, ScalarKind};
pub use parameter::{ParamValue, Parameter, ParameterType, Presentation, RangeType};
pub use port::{Port, PortKind};

/// Size in bytes of one encoded control message block.
pub const MESSAGE_SIZE: usize = 4096;

/// Maximum number of labels a choice parameter carries in one message.
pub const MAX_CHOICES: usize = 32;
