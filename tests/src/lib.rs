//! # Dataflow Core Test Suite
//!
//! Flows that cross crate boundaries, run against an in-memory session.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs            # Session builders
//!     ├── session_state.rs       # Tracker, parked messages, exited modules
//!     ├── same_host_transfer.rs  # Handle path
//!     ├── cross_host_transfer.rs # Byte path
//!     ├── barrier.rs             # Barrier rounds
//!     └── wire.rs                # Codec and observer bus
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p df-tests
//! cargo test -p df-tests integration::barrier::
//! ```

pub mod integration;
