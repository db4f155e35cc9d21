//! # In-Process Session
//!
//! A [`Node`] is one process: its context, dispatcher and handlers. A
//! [`Session`] connects nodes directly by process id and pumps messages
//! until no node has anything left to send. Messages a module addresses to
//! its local manager are relayed by the manager of the sender's host when
//! the session has one; everything else goes straight to its destination.

use super::dispatch::Dispatcher;
use crate::container::{ProcessContext, RuntimeConfig};
use crate::error::RuntimeResult;
use crate::handlers::{BarrierHandler, MessageHandler, ObjectHandler, Outgoing};
use df_01_routing::RoutingFlags;
use df_02_shm::SegmentRegistry;
use df_telemetry::log_message;
use parking_lot::Mutex;
use shared_bus::{InMemoryMessageBus, MessagePublisher, QueueReceiver};
use shared_types::ids::{is_module, BROADCAST, MASTER_HUB, NEXT_HOP};
use shared_types::{Identity, Message, ProcessId};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct Node {
    dispatcher: Dispatcher,
    objects: Arc<ObjectHandler>,
    barrier: Arc<BarrierHandler>,
    handlers: Vec<Arc<dyn MessageHandler>>,
    notifications: Mutex<QueueReceiver>,
    relayed: AtomicUsize,
}

impl Node {
    pub fn new(config: RuntimeConfig, segments: Arc<SegmentRegistry>) -> RuntimeResult<Self> {
        let (ctx, notifications) = ProcessContext::new(config, segments)?;
        let objects = Arc::new(ObjectHandler::new(ctx.clone()));
        let barrier = Arc::new(BarrierHandler::new(ctx.clone()));
        let handlers: Vec<Arc<dyn MessageHandler>> = vec![objects.clone(), barrier.clone()];
        Ok(Self {
            dispatcher: Dispatcher::new(ctx),
            objects,
            barrier,
            handlers,
            notifications: Mutex::new(notifications),
            relayed: AtomicUsize::new(0),
        })
    }

    #[must_use]
    pub fn id(&self) -> ProcessId {
        self.ctx().config().id
    }

    #[must_use]
    pub fn identity(&self) -> Identity {
        self.ctx().config().identity
    }

    #[must_use]
    pub fn ctx(&self) -> &Arc<ProcessContext> {
        self.dispatcher.context()
    }

    #[must_use]
    pub fn objects(&self) -> &ObjectHandler {
        &self.objects
    }

    #[must_use]
    pub fn barrier(&self) -> &BarrierHandler {
        &self.barrier
    }

    /// New-object notifications published since the last call.
    pub fn drain_notifications(&self) -> Vec<Message> {
        self.notifications.lock().drain()
    }

    /// Number of messages this node relayed for its modules.
    #[must_use]
    pub fn relayed(&self) -> usize {
        self.relayed.load(Ordering::Relaxed)
    }

    /// Pass a message from a local module on to its destination.
    ///
    /// Returns `None` when the message was parked or dropped here.
    pub fn relay(&self, item: Outgoing) -> Option<Outgoing> {
        let delivery = self.dispatcher.dispatch(&item.message, Identity::Module, self.id());
        if delivery.dropped || delivery.parked {
            return None;
        }
        log_message!(debug, item.message, "Message relayed");
        self.relayed.fetch_add(1, Ordering::Relaxed);
        Some(item)
    }

    /// Dispatch `msg` and run the handlers its route selects. Parked
    /// messages released on the way are processed too.
    pub async fn deliver(
        &self,
        msg: &Message,
        payload: Option<&[u8]>,
        sender: Identity,
        sender_hub: ProcessId,
    ) -> RuntimeResult<Vec<Outgoing>> {
        let mut work = VecDeque::from([*msg]);
        let mut out = Vec::new();
        let mut payload = payload;
        while let Some(current) = work.pop_front() {
            let delivery = self.dispatcher.dispatch(&current, sender, sender_hub);
            work.extend(delivery.replayed);
            if delivery.dropped || delivery.parked || !delivery.route.handler {
                continue;
            }
            for handler in &self.handlers {
                if handler.handles(current.message_type()) {
                    out.extend(handler.handle(&current, payload).await?);
                }
            }
            payload = None;
        }
        Ok(out)
    }
}

/// Nodes of one session, addressed by process id.
#[derive(Default)]
pub struct Session {
    nodes: BTreeMap<ProcessId, Arc<Node>>,
    /// Managers by host.
    managers: BTreeMap<String, Arc<Node>>,
    /// Receives every message that leaves the session.
    observer: Option<Arc<InMemoryMessageBus>>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish messages leaving the session on `bus`.
    #[must_use]
    pub fn with_observer(mut self, bus: Arc<InMemoryMessageBus>) -> Self {
        self.observer = Some(bus);
        self
    }

    pub fn add(&mut self, node: Node) -> Arc<Node> {
        let node = Arc::new(node);
        self.nodes.insert(node.id(), node.clone());
        node
    }

    /// Add the manager of the modules on its host.
    pub fn add_manager(&mut self, node: Node) -> Arc<Node> {
        let node = Arc::new(node);
        self.managers
            .insert(node.ctx().config().host.clone(), node.clone());
        node
    }

    /// Manager that relays `item` from its sending module, if any.
    fn relay_for(&self, item: &Outgoing) -> Option<&Arc<Node>> {
        let msg = &item.message;
        if !is_module(msg.sender_id()) || !is_module(msg.dest_id()) {
            return None;
        }
        let sender = self.nodes.get(&msg.sender_id())?;
        let manager = self.managers.get(&sender.ctx().config().host)?;
        manager
            .ctx()
            .router()
            .flags(msg)
            .contains(RoutingFlags::DEST_LOCAL_MANAGER)
            .then_some(manager)
    }

    /// Role the receiver sees for messages from `origin`.
    fn peer_identity(&self, origin: ProcessId) -> Identity {
        if is_module(origin) {
            return Identity::Manager;
        }
        self.nodes
            .get(&origin)
            .map_or(Identity::Unknown, |n| n.identity())
    }

    fn hubs(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.nodes
            .values()
            .filter(|n| matches!(n.identity(), Identity::Hub | Identity::SlaveHub))
    }

    /// Deliver `initial` and everything sent in response until quiet.
    ///
    /// Messages for the next hop and broadcasts go to every hub of the
    /// session. Returns the messages that left the session: broadcasts and
    /// messages for unknown processes.
    pub async fn pump(&self, initial: Vec<Outgoing>) -> RuntimeResult<Vec<Message>> {
        let mut queue: VecDeque<(Outgoing, bool)> = initial.into_iter().map(|o| (o, false)).collect();
        let mut left = Vec::new();
        while let Some((item, relayed)) = queue.pop_front() {
            if !relayed {
                if let Some(manager) = self.relay_for(&item) {
                    queue.extend(manager.relay(item).map(|o| (o, true)));
                    continue;
                }
            }
            let msg = item.message;
            let dest = msg.dest_id();
            let targets: Vec<Arc<Node>> = if msg.is_broadcast() || dest == BROADCAST || dest == NEXT_HOP {
                self.hubs()
                    .filter(|n| n.id() != msg.sender_id())
                    .cloned()
                    .collect()
            } else {
                self.nodes.get(&dest).cloned().into_iter().collect()
            };
            if targets.is_empty() || msg.is_broadcast() || dest == BROADCAST {
                log_message!(debug, msg, "Message left the session");
                if let Some(bus) = &self.observer {
                    bus.publish(msg).await;
                }
                left.push(msg);
            }

            let sender = self.peer_identity(msg.sender_id());
            for node in targets {
                match node
                    .deliver(&msg, item.payload.as_deref(), sender, MASTER_HUB)
                    .await
                {
                    Ok(replies) => queue.extend(replies.into_iter().map(|o| (o, false))),
                    Err(e) => {
                        warn!(dest = node.id(), error = %e, "Delivery failed");
                        return Err(e);
                    }
                }
            }
        }
        debug!(left = left.len(), "Session quiet");
        Ok(left)
    }
}
