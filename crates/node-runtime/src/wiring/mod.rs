//! Dispatch of received messages and the in-process session harness.

pub mod dispatch;
pub mod node;

pub use dispatch::{Delivery, Dispatcher};
pub use node::{Node, Session};
