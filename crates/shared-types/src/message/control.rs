//! Session, topology and execution control payloads.

use super::{HostAddress, MessageType, ModuleName, PathText, PortName, Text};
use crate::errors::MessageError;
use crate::handle::ShmHandle;
use crate::ids::{Identity, ProcessId, INVALID};
use crate::port::{Port, PortKind};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use uuid::Uuid;

/// Handshake: a peer announces its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identify {
    pub identity: Identity,
    pub id: ProcessId,
    pub rank: i32,
    pub name: ModuleName,
}

impl Identify {
    #[must_use]
    pub fn new(identity: Identity, name: &str) -> Self {
        Self {
            identity,
            id: INVALID,
            rank: -1,
            name: ModuleName::new(name),
        }
    }

    /// Handshake of a bulk data connection, which identifies by rank.
    pub fn bulk_data(identity: Identity, rank: i32) -> Result<Self, MessageError> {
        if !identity.is_bulk_data() {
            return Err(MessageError::InvalidIdentity(identity));
        }
        Ok(Self {
            identity,
            id: INVALID,
            rank,
            name: ModuleName::default(),
        })
    }

    pub(super) fn truncated(&self) -> bool {
        self.name.is_truncated()
    }
}

/// Assigns a process id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetId {
    pub id: ProcessId,
}

/// How a network address field is to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AddressType {
    #[default]
    Unspecified,
    Hostname,
    IPv4,
    IPv6,
}

/// Announces a hub joining the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddHub {
    pub id: ProcessId,
    pub name: ModuleName,
    pub port: u16,
    address_type: AddressType,
    address: HostAddress,
}

impl AddHub {
    #[must_use]
    pub fn new(id: ProcessId, name: &str) -> Self {
        Self {
            id,
            name: ModuleName::new(name),
            port: 0,
            address_type: AddressType::Unspecified,
            address: HostAddress::default(),
        }
    }

    pub fn set_address(&mut self, addr: IpAddr) {
        self.address = HostAddress::new(&addr.to_string());
        self.address_type = match addr {
            IpAddr::V4(_) => AddressType::IPv4,
            IpAddr::V6(_) => AddressType::IPv6,
        };
    }

    pub fn set_host(&mut self, host: &str) {
        self.address = HostAddress::new(host);
        self.address_type = AddressType::Hostname;
    }

    #[must_use]
    pub fn address_type(&self) -> AddressType {
        self.address_type
    }

    #[must_use]
    pub fn has_address(&self) -> bool {
        matches!(self.address_type, AddressType::IPv4 | AddressType::IPv6)
    }

    /// Parsed address, if one was set.
    #[must_use]
    pub fn address(&self) -> Option<IpAddr> {
        if !self.has_address() {
            return None;
        }
        self.address.as_str().parse().ok()
    }

    #[must_use]
    pub fn host(&self) -> &str {
        self.address.as_str()
    }

    pub(super) fn truncated(&self) -> bool {
        self.name.is_truncated() || self.address.is_truncated()
    }
}

/// A slave hub left the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveSlave {
    pub id: ProcessId,
}

/// Toggle message tracing for one module (or all, with `BROADCAST`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    pub module: ProcessId,
    pub message_type: MessageType,
    pub on: bool,
}

/// Request to start a module on a hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spawn {
    pub hub: ProcessId,
    pub spawn_id: ProcessId,
    pub name: ModuleName,
    pub mpi_size: i32,
    pub base_rank: i32,
    pub rank_skip: i32,
}

impl Spawn {
    #[must_use]
    pub fn new(hub: ProcessId, name: &str, mpi_size: i32, base_rank: i32, rank_skip: i32) -> Self {
        Self {
            hub,
            spawn_id: INVALID,
            name: ModuleName::new(name),
            mpi_size,
            base_rank,
            rank_skip,
        }
    }
}

/// The hub has prepared the spawn; correlated with the `Spawn` by uuid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnPrepared {
    pub hub: ProcessId,
    pub spawn_id: ProcessId,
    pub name: ModuleName,
}

impl From<&Spawn> for SpawnPrepared {
    fn from(spawn: &Spawn) -> Self {
        Self {
            hub: spawn.hub,
            spawn_id: spawn.spawn_id,
            name: spawn.name,
        }
    }
}

/// A module finished starting up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Started {
    pub name: ModuleName,
}

/// A module terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModuleExit {
    pub forwarded: bool,
}

/// Ask a module to terminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kill {
    pub module: ProcessId,
}

/// Phase an `Execute` request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExecuteWhat {
    #[default]
    ComputeExecute,
    Prepare,
    ComputeObject,
    Reduce,
}

/// Trigger a module execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execute {
    pub what: ExecuteWhat,
    pub module: ProcessId,
    pub execution_count: i32,
    pub all_ranks: bool,
}

impl Execute {
    #[must_use]
    pub fn new(what: ExecuteWhat, module: ProcessId, execution_count: i32) -> Self {
        Self {
            what,
            module,
            execution_count,
            all_ranks: false,
        }
    }
}

/// A hub can start the named module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleAvailable {
    pub hub: ProcessId,
    pub name: ModuleName,
    pub path: PathText,
}

impl ModuleAvailable {
    #[must_use]
    pub fn new(hub: ProcessId, name: &str, path: &str) -> Self {
        Self {
            hub,
            name: ModuleName::new(name),
            path: PathText::new(path),
        }
    }
}

/// A module created a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPort {
    pub name: PortName,
    pub kind: PortKind,
    pub flags: u32,
}

impl AddPort {
    #[must_use]
    pub fn new(port: &Port) -> Self {
        Self {
            name: PortName::new(&port.name),
            kind: port.kind,
            flags: port.flags,
        }
    }

    /// Rebuild the port for the announcing module.
    #[must_use]
    pub fn port(&self, module: ProcessId) -> Port {
        Port::new(module, self.name.as_str(), self.kind, self.flags)
    }
}

/// Port pair for `Connect` and `Disconnect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub module_a: ProcessId,
    pub port_a: PortName,
    pub module_b: ProcessId,
    pub port_b: PortName,
}

impl Connection {
    #[must_use]
    pub fn new(module_a: ProcessId, port_a: &str, module_b: ProcessId, port_b: &str) -> Self {
        Self {
            module_a,
            port_a: PortName::new(port_a),
            module_b,
            port_b: PortName::new(port_b),
        }
    }

    /// Swap the two ends.
    pub fn reverse(&mut self) {
        std::mem::swap(&mut self.module_a, &mut self.module_b);
        std::mem::swap(&mut self.port_a, &mut self.port_b);
    }

    pub(super) fn truncated(&self) -> bool {
        self.port_a.is_truncated() || self.port_b.is_truncated()
    }
}

/// Liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ping {
    pub character: char,
}

/// Answer to a `Ping`, correlated by uuid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pong {
    pub character: char,
    pub module: ProcessId,
}

/// Lock or unlock user interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockUi {
    pub locked: bool,
}

/// Channel a text message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextType {
    Cout,
    Cerr,
    Clog,
    Info,
    Warning,
    Error,
}

/// Human-readable text for user interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendText {
    pub text_type: TextType,
    pub reference_uuid: Uuid,
    pub reference_type: Option<MessageType>,
    text: Text,
}

impl SendText {
    #[must_use]
    pub fn new(text_type: TextType, text: &str) -> Self {
        Self {
            text_type,
            reference_uuid: Uuid::nil(),
            reference_type: None,
            text: Text::new(text),
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    /// Was the text cut to fit into the message?
    #[must_use]
    pub fn truncated(&self) -> bool {
        self.text.is_truncated()
    }
}

/// How a module wants to receive objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ObjectReceivePolicy {
    #[default]
    Single,
    NotifyAll,
    Distribute,
}

/// How executions of a parallel module are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SchedulingPolicy {
    Ignore,
    #[default]
    Single,
    Gang,
    LazyGang,
}

/// When a module reduces over its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReducePolicy {
    #[default]
    Never,
    Locally,
    OverAll,
}

/// Execution stage reported by a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionProgress {
    Start,
    Finish,
}

/// Set up or tear down a port forwarding tunnel on a hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTunnel {
    pub src_port: u16,
    pub dest_port: u16,
    pub remove: bool,
    dest_type: AddressType,
    dest_addr: HostAddress,
}

impl RequestTunnel {
    /// Tunnel towards a named host.
    #[must_use]
    pub fn to_host(src_port: u16, dest_host: &str, dest_port: u16) -> Self {
        Self {
            src_port,
            dest_port,
            remove: false,
            dest_type: AddressType::Hostname,
            dest_addr: HostAddress::new(dest_host),
        }
    }

    /// Tunnel towards an address.
    #[must_use]
    pub fn to_addr(src_port: u16, dest_addr: IpAddr, dest_port: u16) -> Self {
        let dest_type = match dest_addr {
            IpAddr::V4(_) => AddressType::IPv4,
            IpAddr::V6(_) => AddressType::IPv6,
        };
        Self {
            src_port,
            dest_port,
            remove: false,
            dest_type,
            dest_addr: HostAddress::new(&dest_addr.to_string()),
        }
    }

    /// Tunnel whose destination the hub fills in.
    #[must_use]
    pub fn unspecified(src_port: u16, dest_port: u16) -> Self {
        Self {
            src_port,
            dest_port,
            remove: false,
            dest_type: AddressType::Unspecified,
            dest_addr: HostAddress::default(),
        }
    }

    /// Remove the tunnel listening on `src_port`.
    #[must_use]
    pub fn removal(src_port: u16) -> Self {
        Self {
            remove: true,
            ..Self::unspecified(src_port, 0)
        }
    }

    #[must_use]
    pub fn dest_type(&self) -> AddressType {
        self.dest_type
    }

    #[must_use]
    pub fn dest_is_address(&self) -> bool {
        matches!(self.dest_type, AddressType::IPv4 | AddressType::IPv6)
    }

    #[must_use]
    pub fn dest_addr(&self) -> Option<IpAddr> {
        if !self.dest_is_address() {
            return None;
        }
        self.dest_addr.as_str().parse().ok()
    }

    pub fn set_dest_addr(&mut self, addr: IpAddr) {
        *self = Self::to_addr(self.src_port, addr, self.dest_port);
    }

    #[must_use]
    pub fn dest_host(&self) -> &str {
        self.dest_addr.as_str()
    }

    pub(super) fn truncated(&self) -> bool {
        self.dest_addr.is_truncated()
    }
}

/// Local notification that an object was published into the shared segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewObject {
    pub module: ProcessId,
    pub rank: i32,
    pub handle: ShmHandle,
}
