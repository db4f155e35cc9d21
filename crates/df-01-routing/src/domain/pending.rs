//! Pending-message queue
//!
//! Messages flagged `QUEUE_IF_UNHANDLED` that refer to modules, ports or
//! parameters the tracker does not know yet are parked here. After a message
//! flagged `TRIGGER_QUEUE` has been tracked, everything that became
//! resolvable is released in arrival order.

use super::tracker::StateTracker;
use crate::error::{RoutingError, RoutingResult};
use shared_types::{Message, ProcessId};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Default bound of parked messages.
pub const DEFAULT_PENDING_CAPACITY: usize = 1024;

#[derive(Debug)]
pub struct PendingQueue {
    queue: VecDeque<Message>,
    capacity: usize,
}

impl Default for PendingQueue {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_PENDING_CAPACITY)
    }
}

impl PendingQueue {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            capacity,
        }
    }

    /// Park `msg` until it becomes resolvable.
    pub fn park(&mut self, msg: Message) -> RoutingResult<()> {
        if self.queue.len() >= self.capacity {
            warn!(
                message_type = %msg.message_type(),
                capacity = self.capacity,
                "Pending queue full, message dropped"
            );
            return Err(RoutingError::PendingQueueFull {
                capacity: self.capacity,
            });
        }
        debug!(message_type = %msg.message_type(), uuid = %msg.uuid(), "Message parked");
        self.queue.push_back(msg);
        Ok(())
    }

    /// Remove and return every message `tracker` can now resolve.
    pub fn replay_resolved(&mut self, tracker: &StateTracker) -> Vec<Message> {
        let (ready, waiting): (Vec<Message>, Vec<Message>) = self
            .queue
            .drain(..)
            .partition(|m| tracker.can_resolve(m));
        self.queue = waiting.into();
        if !ready.is_empty() {
            debug!(
                released = ready.len(),
                waiting = self.queue.len(),
                "Pending messages released"
            );
        }
        ready
    }

    /// Forget parked messages that involve an exited module.
    pub fn discard_for(&mut self, module: ProcessId) -> usize {
        let before = self.queue.len();
        self.queue.retain(|m| !involves(m, module));
        before - self.queue.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

fn involves(msg: &Message, module: ProcessId) -> bool {
    if msg.dest_id() == module {
        return true;
    }
    if let Some(c) = msg.as_connection() {
        return c.module_a == module || c.module_b == module;
    }
    if let Some(set) = msg.as_set_parameter() {
        return set.module == module;
    }
    msg.as_set_parameter_choices()
        .is_some_and(|set| set.module == module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::ids::MASTER_HUB;
    use shared_types::message::{AddPort, Connection, Spawn, Started};
    use shared_types::port::PortKind;
    use shared_types::Port;

    fn add_module(tracker: &mut StateTracker, id: ProcessId, port: &str, kind: PortKind) {
        let mut spawn = Spawn::new(MASTER_HUB, "Mod", 1, 0, 1);
        spawn.spawn_id = id;
        tracker.handle(&Message::new(spawn));
        let mut started = Message::new(Started { name: "Mod".into() });
        started.set_sender_id(id);
        tracker.handle(&started);
        let mut add = Message::new(AddPort::new(&Port::new(id, port, kind, 0)));
        add.set_sender_id(id);
        tracker.handle(&add);
    }

    #[test]
    fn test_replay_after_ports_known() {
        let mut tracker = StateTracker::new();
        let mut pending = PendingQueue::default();
        let connect = Message::connect(Connection::new(5, "out", 7, "in"));

        assert!(!tracker.can_resolve(&connect));
        pending.park(connect).unwrap();

        add_module(&mut tracker, 5, "out", PortKind::Output);
        assert!(pending.replay_resolved(&tracker).is_empty());
        assert_eq!(pending.len(), 1);

        add_module(&mut tracker, 7, "in", PortKind::Input);
        let ready = pending.replay_resolved(&tracker);
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].uuid(), connect.uuid());
        assert!(pending.is_empty());
    }

    #[test]
    fn test_bounded() {
        let mut pending = PendingQueue::with_capacity(1);
        let c = Connection::new(5, "out", 7, "in");
        pending.park(Message::connect(c)).unwrap();
        assert_eq!(
            pending.park(Message::connect(c)),
            Err(RoutingError::PendingQueueFull { capacity: 1 })
        );
    }

    #[test]
    fn test_discard_for_exited_module() {
        let mut pending = PendingQueue::default();
        pending
            .park(Message::connect(Connection::new(5, "out", 7, "in")))
            .unwrap();
        pending
            .park(Message::connect(Connection::new(8, "out", 9, "in")))
            .unwrap();
        assert_eq!(pending.discard_for(7), 1);
        assert_eq!(pending.len(), 1);
    }
}
