//! # Shared Bus - Control Message Transport Inside One Process
//!
//! Two ways of moving [`Message`](shared_types::Message) values between tasks:
//!
//! - [`InMemoryMessageBus`]: broadcast to every subscriber whose
//!   [`MessageFilter`] matches. A session publishes the messages that leave
//!   it here, for observers such as a UI mirror.
//! - [`MessageQueue`]: named, bounded, single consumer. Used for the
//!   new-object notifications of a shared segment.
//!
//! ```text
//! ┌──────────────┐   publish()   ┌──────────────┐  subscribe()  ┌──────────┐
//! │   session    │ ────────────▶ │  Message Bus │ ────────────▶ │ observer │
//! └──────────────┘               └──────────────┘               └──────────┘
//!
//! ┌──────────────┐  try_send()   ┌──────────────┐  drain()      ┌──────────┐
//! │   segment    │ ────────────▶ │ MessageQueue │ ────────────▶ │   node   │
//! └──────────────┘               └──────────────┘               └──────────┘
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod filter;
pub mod publisher;
pub mod queue;
pub mod subscriber;

// Re-export main types
pub use filter::MessageFilter;
pub use publisher::{InMemoryMessageBus, MessagePublisher};
pub use queue::{MessageQueue, QueueError, QueueReceiver, QueueSender};
pub use subscriber::{Subscription, SubscriptionError};

/// Messages buffered per subscriber before it lags.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Default depth of a bounded message queue.
pub const DEFAULT_QUEUE_DEPTH: usize = 256;
