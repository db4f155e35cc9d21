//! Routing table
//!
//! Built once per process from an exhaustive match over the closed set of
//! message types, then only read. A type mapped to an empty flag set is a
//! fatal configuration error.

use super::flags::RoutingFlags;
use crate::error::{RoutingError, RoutingResult};
use shared_types::MessageType;
use std::sync::OnceLock;
use tracing::{debug, error};

static GLOBAL_TABLE: OnceLock<RoutingTable> = OnceLock::new();

/// Routing flags of every message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    flags: [RoutingFlags; MessageType::COUNT],
}

/// Default routing rules.
fn flags_for(t: MessageType) -> RoutingFlags {
    use MessageType as M;
    use RoutingFlags as F;

    match t {
        M::Identify | M::SetId | M::ReplayFinished => F::SPECIAL,
        M::AddHub | M::RemoveSlave => F::BROADCAST | F::TRACK | F::DEST_UI,
        M::Trace => F::BROADCAST | F::TRACK,
        M::Spawn => F::TRACK | F::HANDLE_ON_MASTER,
        M::SpawnPrepared => F::DEST_LOCAL_HUB | F::HANDLE_ON_HUB,
        M::Started | M::ModuleExit => F::BROADCAST | F::TRACK | F::DEST_UI,
        M::Kill | M::Ping => F::DEST_MODULES | F::HANDLE_ON_DEST,
        M::Quit => F::BROADCAST | F::HANDLE_ON_MASTER | F::HANDLE_ON_HUB | F::HANDLE_ON_NODE,
        M::Execute => F::SPECIAL | F::HANDLE_ON_MASTER,
        M::Busy | M::Idle => F::SPECIAL,
        M::ModuleAvailable => F::TRACK | F::DEST_HUB | F::DEST_UI | F::HANDLE_ON_HUB,
        M::AddPort | M::AddParameter => {
            F::BROADCAST | F::TRACK | F::DEST_UI | F::TRIGGER_QUEUE
        }
        M::Connect | M::Disconnect => {
            F::TRACK | F::BROADCAST | F::QUEUE_IF_UNHANDLED | F::DEST_MANAGER
        }
        M::SetParameter | M::SetParameterChoices => {
            F::TRACK | F::QUEUE_IF_UNHANDLED | F::DEST_MANAGER
        }
        M::Pong => F::DEST_UI | F::HANDLE_ON_DEST,
        M::LockUi => F::DEST_UI,
        M::SendText => F::DEST_UI | F::DEST_MASTER_HUB,
        M::ObjectReceivePolicy | M::SchedulingPolicy | M::ReducePolicy => {
            F::DEST_LOCAL_MANAGER | F::TRACK
        }
        M::ExecutionProgress => F::DEST_LOCAL_MANAGER | F::HANDLE_ON_RANK0,
        M::AddObject => F::DEST_LOCAL_MANAGER | F::HANDLE_ON_NODE,
        M::AddObjectCompleted => F::SPECIAL,
        M::Barrier | M::BarrierReached => F::HANDLE_ON_DEST,
        M::ObjectReceived => F::HANDLE_ON_RANK0,
        M::RequestTunnel => F::HANDLE_ON_NODE | F::HANDLE_ON_HUB,
        M::RequestObject | M::SendObject => F::SPECIAL,
        M::NewObject => F::SPECIAL,
    }
}

impl RoutingTable {
    /// Build the default table.
    pub fn build() -> RoutingResult<Self> {
        Self::build_with(flags_for)
    }

    /// Build a table from `rules`, rejecting any type without flags.
    pub fn build_with(rules: impl Fn(MessageType) -> RoutingFlags) -> RoutingResult<Self> {
        let mut flags = [RoutingFlags::empty(); MessageType::COUNT];
        for t in MessageType::ALL {
            let f = rules(t);
            if f.is_empty() {
                error!(message_type = %t, "Message routing table not initialized");
                return Err(RoutingError::MissingRoute { message_type: t });
            }
            flags[t.index()] = f;
        }
        Ok(Self { flags })
    }

    /// The process-wide table.
    ///
    /// # Panics
    ///
    /// When the table is incomplete. This is a startup configuration error
    /// the process cannot recover from.
    pub fn global() -> &'static RoutingTable {
        match init_routing_table() {
            Ok(table) => table,
            Err(e) => panic!("routing table unusable: {e}"),
        }
    }

    #[must_use]
    pub fn flags(&self, t: MessageType) -> RoutingFlags {
        self.flags[t.index()]
    }

    /// Does the entry for `t` contain every flag of `f`?
    #[must_use]
    pub fn has(&self, t: MessageType, f: RoutingFlags) -> bool {
        self.flags(t).contains(f)
    }

    /// Does the entry for `t` contain any flag of `f`?
    #[must_use]
    pub fn any(&self, t: MessageType, f: RoutingFlags) -> bool {
        self.flags(t).intersects(f)
    }
}

/// Build and install the process-wide table, or return the installed one.
pub fn init_routing_table() -> RoutingResult<&'static RoutingTable> {
    if let Some(table) = GLOBAL_TABLE.get() {
        return Ok(table);
    }
    let table = RoutingTable::build()?;
    debug!(types = MessageType::COUNT, "Routing table initialized");
    Ok(GLOBAL_TABLE.get_or_init(|| table))
}
