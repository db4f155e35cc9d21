//! # df-03-object-transfer
//!
//! Moves objects between processes with `AddObject`, `RequestObject` and
//! `SendObject` messages.
//!
//! ## Paths
//!
//! | Path | When | Steps |
//! |------|------|-------|
//! | handle | sender and receiver share a segment | [`announce`] then [`take_object`] |
//! | bytes | segments differ | [`request_for`], [`answer_request`], [`receive_object`] |
//!
//! Every announcement holds one reference on the object until exactly one
//! of [`take_object`] or [`drop_announcement`] consumes it. The owner keeps
//! a [`Retention`] ledger and settles each announcement when the receiver
//! confirms it with `AddObjectCompleted`.
//!
//! ## Example
//!
//! ```rust,ignore
//! let add = announce(&grid, "grid_out", "grid_in")?;
//! // ... routed to the receiver on the same host ...
//! let grid = take_object(&receiver_shm, &add)?;
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod domain;
pub mod error;

pub use domain::byte_path::{answer_request, receive_object, request_for};
pub use domain::handle_path::{announce, drop_announcement, object_received, take_object};
pub use domain::retention::Retention;
pub use error::{TransferError, TransferResult};
