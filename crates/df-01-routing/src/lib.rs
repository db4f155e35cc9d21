//! # df-01-routing
//!
//! Decides, for every control message a process receives, which neighbours it
//! is forwarded to and whether the process handles it itself.
//!
//! ## Overview
//!
//! - **Routing table**: immutable map from [`MessageType`](shared_types::MessageType)
//!   to [`RoutingFlags`], built once per process and checked for completeness.
//! - **Router**: predicates per neighbour class, parameterised by the role of
//!   the local process (UI, hub, slave hub, manager, module).
//! - **State tracker**: replicated view of the session topology, fed by
//!   messages flagged `TRACK`.
//! - **Pending queue**: messages flagged `QUEUE_IF_UNHANDLED` whose
//!   destination is not known yet, replayed after a `TRIGGER_QUEUE` message.
//! - **Barriers**: rendezvous keyed by the correlation id of a `Barrier`.
//!
//! ## Topology
//!
//! ```text
//!                    ┌────────┐
//!                    │   UI   │
//!                    └───┬────┘
//!                  ┌─────┴──────┐
//!                  │ master hub │────────────── slave hubs (one per host)
//!                  └─────┬──────┘                     │
//!                  ┌─────┴──────┐               ┌─────┴──────┐
//!                  │  manager   │               │  manager   │
//!                  └─────┬──────┘               └─────┬──────┘
//!                   modules (ranks)              modules (ranks)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use df_01_routing::{Router, RoutingTable};
//! use shared_types::Identity;
//!
//! let router = Router::new(Identity::Hub, shared_types::ids::MASTER_HUB, 0);
//! let route = router.route(&msg, Identity::Manager, shared_types::ids::MASTER_HUB);
//! if route.handler {
//!     handle(&msg);
//! }
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod domain;
pub mod error;

pub use domain::barrier::{BarrierState, BarrierTracker};
pub use domain::flags::RoutingFlags;
pub use domain::pending::PendingQueue;
pub use domain::router::{Route, Router};
pub use domain::table::{init_routing_table, RoutingTable};
pub use domain::tracker::{ModuleLifecycle, StateTracker, TrackerSnapshot};
pub use error::{RoutingError, RoutingResult};
