//! # Dataflow Node Runtime
//!
//! Glue between the routing layer and the shared object model for one
//! process of a dataflow session.
//!
//! ## Structure
//!
//! - `container/` - process configuration and shared context
//! - `handlers/` - object transfer and barrier handlers
//! - `wiring/` - message dispatch and the in-process session
//!
//! ## Message Path
//!
//! ```text
//! received ──▶ Dispatcher ──▶ tracker / pending queue
//!                  │
//!                  ▼ route.handler
//!           MessageHandler ──▶ Outgoing (message + optional payload bytes)
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod container;
pub mod error;
pub mod handlers;
pub mod wiring;

pub use container::{ConfigError, ProcessContext, RuntimeConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use handlers::{BarrierHandler, MessageHandler, ObjectHandler, Outgoing, Received};
pub use wiring::{Delivery, Dispatcher, Node, Session};
