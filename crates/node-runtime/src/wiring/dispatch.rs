//! # Message Dispatch
//!
//! Applies the routing decision of a process to one received message:
//!
//! ```text
//! received ──▶ dest exited? ──yes──▶ dropped
//!                  │ no
//!                  ▼
//!     QUEUE_IF_UNHANDLED and unresolvable? ──yes──▶ parked
//!                  │ no
//!                  ▼
//!            route() ──▶ tracker ──▶ TRIGGER_QUEUE? ──▶ replay parked
//! ```
//!
//! Forwarding and handling are left to the caller, guided by the returned
//! [`Delivery`].

use crate::container::ProcessContext;
use df_01_routing::{Route, RoutingFlags};
use df_telemetry::{log_message, process_span};
use shared_types::ids::is_module;
use shared_types::{Identity, Message, MessageType, ProcessId};
use std::sync::Arc;

/// What happened to one received message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delivery {
    /// Forwarding and handling decisions.
    pub route: Route,
    /// Held back until the session state can resolve it.
    pub parked: bool,
    /// Discarded.
    pub dropped: bool,
    /// Earlier parked messages that became resolvable, in arrival order.
    pub replayed: Vec<Message>,
}

impl Delivery {
    fn dropped() -> Self {
        Self {
            dropped: true,
            ..Self::default()
        }
    }

    fn parked() -> Self {
        Self {
            parked: true,
            ..Self::default()
        }
    }
}

pub struct Dispatcher {
    ctx: Arc<ProcessContext>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(ctx: Arc<ProcessContext>) -> Self {
        Self { ctx }
    }

    #[must_use]
    pub fn context(&self) -> &Arc<ProcessContext> {
        &self.ctx
    }

    /// Route `msg` received from a peer of role `sender`, whose hub is `sender_hub`.
    pub fn dispatch(&self, msg: &Message, sender: Identity, sender_hub: ProcessId) -> Delivery {
        let config = self.ctx.config();
        let _span = process_span!("dispatch", id = config.id, rank = config.rank).entered();
        let router = self.ctx.router();
        let flags = router.flags(msg);

        if is_module(msg.dest_id()) && self.ctx.tracker().has_exited(msg.dest_id()) {
            log_message!(warn, msg, "Message for exited module dropped");
            return Delivery::dropped();
        }

        if flags.contains(RoutingFlags::QUEUE_IF_UNHANDLED) && !self.ctx.tracker().can_resolve(msg) {
            return match self.ctx.pending().park(*msg) {
                Ok(()) => {
                    log_message!(debug, msg, "Message parked");
                    Delivery::parked()
                }
                Err(_) => Delivery::dropped(),
            };
        }

        let route = router.route(msg, sender, sender_hub);
        let mut delivery = Delivery {
            route,
            ..Delivery::default()
        };

        if route.tracker {
            self.ctx.tracker_mut().handle(msg);
        }

        if msg.message_type() == MessageType::ModuleExit {
            let discarded = self.ctx.pending().discard_for(msg.sender_id());
            if discarded > 0 {
                log_message!(warn, msg, "Parked messages of exited module discarded", discarded = discarded);
            }
        }

        if flags.contains(RoutingFlags::TRIGGER_QUEUE) {
            let tracker = self.ctx.tracker();
            delivery.replayed = self.ctx.pending().replay_resolved(&tracker);
        }

        log_message!(trace, msg, "Message dispatched", forwards = route.forwards(), handler = route.handler);
        delivery
    }
}
