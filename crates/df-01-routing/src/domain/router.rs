//! Role-based forwarding and handling decisions
//!
//! A [`Router`] is bound to the identity, id and rank of the local process.
//! Each predicate answers whether a received message goes to one neighbour
//! class. The predicates are independent: one message may go to the UI, a
//! peer hub and the local handler at once.
//!
//! | Predicate | Meaningful on |
//! |-----------|---------------|
//! | `to_ui` | hubs |
//! | `to_master_hub` | slave hubs |
//! | `to_slave_hub` | master hub |
//! | `to_manager` | hubs |
//! | `to_module` | managers |
//! | `to_tracker` | hubs |
//! | `to_handler` | every role |

use super::flags::RoutingFlags;
use super::table::RoutingTable;
use shared_types::ids::{BROADCAST, FOR_BROADCAST, MASTER_HUB, MODULE_BASE, NEXT_HOP, UI};
use shared_types::{Identity, Message, ProcessId};
use tracing::trace;

/// Outcome of all predicates for one message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Route {
    pub ui: bool,
    pub master_hub: bool,
    pub slave_hub: bool,
    pub manager: bool,
    pub module: bool,
    pub tracker: bool,
    pub handler: bool,
}

impl Route {
    /// Is the message forwarded anywhere?
    #[must_use]
    pub fn forwards(&self) -> bool {
        self.ui || self.master_hub || self.slave_hub || self.manager || self.module
    }
}

/// Routing decisions of one process.
#[derive(Debug, Clone, Copy)]
pub struct Router {
    identity: Identity,
    id: ProcessId,
    rank: i32,
    table: &'static RoutingTable,
}

impl Router {
    /// Router on the process-wide table.
    #[must_use]
    pub fn new(identity: Identity, id: ProcessId, rank: i32) -> Self {
        Self::with_table(identity, id, rank, RoutingTable::global())
    }

    #[must_use]
    pub fn with_table(
        identity: Identity,
        id: ProcessId,
        rank: i32,
        table: &'static RoutingTable,
    ) -> Self {
        Self {
            identity,
            id,
            rank,
            table,
        }
    }

    #[must_use]
    pub fn identity(&self) -> Identity {
        self.identity
    }

    #[must_use]
    pub fn id(&self) -> ProcessId {
        self.id
    }

    #[must_use]
    pub fn rank(&self) -> i32 {
        self.rank
    }

    /// Routing flags of `msg`.
    #[must_use]
    pub fn flags(&self, msg: &Message) -> RoutingFlags {
        self.table.flags(msg.message_type())
    }

    fn any(&self, msg: &Message, f: RoutingFlags) -> bool {
        self.flags(msg).intersects(f)
    }

    pub fn to_ui(&self, msg: &Message) -> bool {
        let dest = msg.dest_id();
        if dest == FOR_BROADCAST || dest >= MODULE_BASE {
            return false;
        }
        if dest == BROADCAST || dest == UI {
            return true;
        }
        self.any(msg, RoutingFlags::DEST_UI | RoutingFlags::BROADCAST)
    }

    /// `sender` is the role of the immediate sender, `sender_hub` the hub
    /// the original sender belongs to.
    pub fn to_master_hub(&self, msg: &Message, sender: Identity, sender_hub: ProcessId) -> bool {
        if self.identity != Identity::SlaveHub || sender == Identity::Hub {
            return false;
        }
        if msg.dest_id() == FOR_BROADCAST {
            return true;
        }
        if self.any(msg, RoutingFlags::DEST_MASTER_HUB | RoutingFlags::DEST_SLAVE_HUB) {
            return true;
        }
        if self.any(msg, RoutingFlags::BROADCAST) {
            if msg.sender_id() == self.id || sender_hub == self.id {
                return true;
            }
            trace!(
                sender = msg.sender_id(),
                sender_hub = sender_hub,
                "Broadcast from outside subtree not sent to master"
            );
        }
        false
    }

    pub fn to_slave_hub(&self, msg: &Message) -> bool {
        if msg.dest_id() == FOR_BROADCAST || self.identity != Identity::Hub {
            return false;
        }
        if msg.dest_id() == BROADCAST {
            return true;
        }
        self.any(msg, RoutingFlags::DEST_SLAVE_HUB | RoutingFlags::BROADCAST)
    }

    pub fn to_manager(&self, msg: &Message, sender: Identity) -> bool {
        if msg.dest_id() <= MASTER_HUB {
            return msg.dest_id() == self.id && self.any(msg, RoutingFlags::DEST_LOCAL_MANAGER);
        }
        sender != Identity::Manager
            && self.any(
                msg,
                RoutingFlags::DEST_MANAGER | RoutingFlags::DEST_MODULES | RoutingFlags::BROADCAST,
            )
    }

    pub fn to_module(&self, msg: &Message) -> bool {
        msg.dest_id() != FOR_BROADCAST
            && self.any(msg, RoutingFlags::DEST_MODULES | RoutingFlags::BROADCAST)
    }

    pub fn to_tracker(&self, msg: &Message, sender: Identity) -> bool {
        if msg.dest_id() == FOR_BROADCAST || !self.any(msg, RoutingFlags::TRACK) {
            return false;
        }
        match self.identity {
            Identity::Hub => matches!(sender, Identity::SlaveHub | Identity::Manager),
            Identity::SlaveHub => matches!(sender, Identity::Hub | Identity::Manager),
            _ => false,
        }
    }

    pub fn to_handler(&self, msg: &Message) -> bool {
        let dest = msg.dest_id();
        if dest == NEXT_HOP || dest == BROADCAST || dest == self.id {
            return true;
        }
        let flags = self.flags(msg);
        match self.identity {
            Identity::Hub => flags.intersects(
                RoutingFlags::HANDLE_ON_MASTER
                    | RoutingFlags::DEST_MASTER_HUB
                    | RoutingFlags::HANDLE_ON_HUB
                    | RoutingFlags::DEST_LOCAL_HUB,
            ),
            Identity::SlaveHub => flags.intersects(
                RoutingFlags::HANDLE_ON_HUB
                    | RoutingFlags::DEST_LOCAL_HUB
                    | RoutingFlags::DEST_SLAVE_HUB,
            ),
            Identity::Manager => {
                let by_hub = if self.id == MASTER_HUB {
                    RoutingFlags::DEST_MASTER_MANAGER
                } else {
                    RoutingFlags::DEST_SLAVE_MANAGER
                };
                flags.intersects(by_hub | RoutingFlags::HANDLE_ON_NODE) || self.rank0(flags)
            }
            Identity::Module => flags.contains(RoutingFlags::HANDLE_ON_NODE) || self.rank0(flags),
            _ => false,
        }
    }

    fn rank0(&self, flags: RoutingFlags) -> bool {
        self.rank == 0 && flags.contains(RoutingFlags::HANDLE_ON_RANK0)
    }

    /// Evaluate every predicate.
    pub fn route(&self, msg: &Message, sender: Identity, sender_hub: ProcessId) -> Route {
        Route {
            ui: self.to_ui(msg),
            master_hub: self.to_master_hub(msg, sender, sender_hub),
            slave_hub: self.to_slave_hub(msg),
            manager: self.to_manager(msg, sender),
            module: self.to_module(msg),
            tracker: self.to_tracker(msg, sender),
            handler: self.to_handler(msg),
        }
    }
}
