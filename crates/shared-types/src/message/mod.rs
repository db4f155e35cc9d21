//! # Control Message Envelope
//!
//! Every control unit exchanged between UI, hubs, managers and modules is a
//! [`Message`]: a fixed header with routing metadata followed by one
//! type-specific payload. Messages are plain values; copying one never
//! allocates and never touches any shared state.
//!
//! ## Header
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `uuid` | correlation id, copied into replies |
//! | `size` | in-memory size of header plus payload |
//! | `sender_id`, `rank` | originating process |
//! | `dest_id`, `dest_rank` | destination, or one of the id sentinels |
//! | `broadcast` | deliver to every rank |
//!
//! Replies are built from the message they answer (`Message::pong`,
//! `Message::request_object`, ...) so the correlation id is always carried over.

mod control;
mod objects;
mod parameters;

pub use control::{
    AddHub, AddPort, AddressType, Connection, Execute, ExecuteWhat, ExecutionProgress, Identify,
    Kill, LockUi, ModuleAvailable, ModuleExit, NewObject, ObjectReceivePolicy, Ping, Pong,
    ReducePolicy, RemoveSlave, RequestTunnel, SchedulingPolicy, SendText, SetId, Spawn,
    SpawnPrepared, Started, TextType, Trace,
};
pub use objects::{AddObject, AddObjectCompleted, ObjectReceived, RequestObject, SendObject};
pub use parameters::{AddParameter, SetParameter, SetParameterChoices, WireValue};

use crate::bounded::BoundedStr;
use crate::errors::MessageError;
use crate::ids::{ProcessId, BROADCAST, INVALID, NEXT_HOP};
use crate::meta::Meta;
use crate::object_type::ObjectType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::mem::{size_of, size_of_val};
use uuid::Uuid;

/// Module, hub and executable names.
pub type ModuleName = BoundedStr<64>;
/// Port names.
pub type PortName = BoundedStr<32>;
/// Parameter and parameter group names.
pub type ParamName = BoundedStr<64>;
/// Object names as minted by the object store.
pub type ObjectName = BoundedStr<64>;
/// Shared segment names.
pub type ShmName = BoundedStr<64>;
/// Host names and printed network addresses.
pub type HostAddress = BoundedStr<64>;
/// File system paths.
pub type PathText = BoundedStr<256>;
/// Parameter descriptions.
pub type DescriptionText = BoundedStr<256>;
/// String parameter values.
pub type ParamString = BoundedStr<256>;
/// Labels of choice parameters.
pub type ChoiceLabel = BoundedStr<48>;
/// Free text for user interfaces.
pub type Text = BoundedStr<1024>;

/// Closed set of control message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u16)]
pub enum MessageType {
    Identify,
    SetId,
    AddHub,
    RemoveSlave,
    ReplayFinished,
    Trace,
    Spawn,
    SpawnPrepared,
    Started,
    ModuleExit,
    Kill,
    Quit,
    Execute,
    Busy,
    Idle,
    ModuleAvailable,
    AddPort,
    AddParameter,
    Connect,
    Disconnect,
    SetParameter,
    SetParameterChoices,
    Ping,
    Pong,
    LockUi,
    SendText,
    ObjectReceivePolicy,
    SchedulingPolicy,
    ReducePolicy,
    ExecutionProgress,
    AddObject,
    AddObjectCompleted,
    ObjectReceived,
    Barrier,
    BarrierReached,
    RequestTunnel,
    RequestObject,
    SendObject,
    NewObject,
}

impl MessageType {
    /// Number of message types.
    pub const COUNT: usize = 39;

    /// Every message type, in discriminant order.
    pub const ALL: [MessageType; Self::COUNT] = [
        Self::Identify,
        Self::SetId,
        Self::AddHub,
        Self::RemoveSlave,
        Self::ReplayFinished,
        Self::Trace,
        Self::Spawn,
        Self::SpawnPrepared,
        Self::Started,
        Self::ModuleExit,
        Self::Kill,
        Self::Quit,
        Self::Execute,
        Self::Busy,
        Self::Idle,
        Self::ModuleAvailable,
        Self::AddPort,
        Self::AddParameter,
        Self::Connect,
        Self::Disconnect,
        Self::SetParameter,
        Self::SetParameterChoices,
        Self::Ping,
        Self::Pong,
        Self::LockUi,
        Self::SendText,
        Self::ObjectReceivePolicy,
        Self::SchedulingPolicy,
        Self::ReducePolicy,
        Self::ExecutionProgress,
        Self::AddObject,
        Self::AddObjectCompleted,
        Self::ObjectReceived,
        Self::Barrier,
        Self::BarrierReached,
        Self::RequestTunnel,
        Self::RequestObject,
        Self::SendObject,
        Self::NewObject,
    ];

    /// Dense index in `0..COUNT`.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Identify => "IDENTIFY",
            Self::SetId => "SETID",
            Self::AddHub => "ADDHUB",
            Self::RemoveSlave => "REMOVESLAVE",
            Self::ReplayFinished => "REPLAYFINISHED",
            Self::Trace => "TRACE",
            Self::Spawn => "SPAWN",
            Self::SpawnPrepared => "SPAWNPREPARED",
            Self::Started => "STARTED",
            Self::ModuleExit => "MODULEEXIT",
            Self::Kill => "KILL",
            Self::Quit => "QUIT",
            Self::Execute => "EXECUTE",
            Self::Busy => "BUSY",
            Self::Idle => "IDLE",
            Self::ModuleAvailable => "MODULEAVAILABLE",
            Self::AddPort => "ADDPORT",
            Self::AddParameter => "ADDPARAMETER",
            Self::Connect => "CONNECT",
            Self::Disconnect => "DISCONNECT",
            Self::SetParameter => "SETPARAMETER",
            Self::SetParameterChoices => "SETPARAMETERCHOICES",
            Self::Ping => "PING",
            Self::Pong => "PONG",
            Self::LockUi => "LOCKUI",
            Self::SendText => "SENDTEXT",
            Self::ObjectReceivePolicy => "OBJECTRECEIVEPOLICY",
            Self::SchedulingPolicy => "SCHEDULINGPOLICY",
            Self::ReducePolicy => "REDUCEPOLICY",
            Self::ExecutionProgress => "EXECUTIONPROGRESS",
            Self::AddObject => "ADDOBJECT",
            Self::AddObjectCompleted => "ADDOBJECTCOMPLETED",
            Self::ObjectReceived => "OBJECTRECEIVED",
            Self::Barrier => "BARRIER",
            Self::BarrierReached => "BARRIERREACHED",
            Self::RequestTunnel => "REQUESTTUNNEL",
            Self::RequestObject => "REQUESTOBJECT",
            Self::SendObject => "SENDOBJECT",
            Self::NewObject => "NEWOBJECT",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific part of a message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Identify(Identify),
    SetId(SetId),
    AddHub(AddHub),
    RemoveSlave(RemoveSlave),
    ReplayFinished,
    Trace(Trace),
    Spawn(Spawn),
    SpawnPrepared(SpawnPrepared),
    Started(Started),
    ModuleExit(ModuleExit),
    Kill(Kill),
    Quit,
    Execute(Execute),
    Busy,
    Idle,
    ModuleAvailable(ModuleAvailable),
    AddPort(AddPort),
    AddParameter(AddParameter),
    Connect(Connection),
    Disconnect(Connection),
    SetParameter(SetParameter),
    SetParameterChoices(SetParameterChoices),
    Ping(Ping),
    Pong(Pong),
    LockUi(LockUi),
    SendText(SendText),
    ObjectReceivePolicy(ObjectReceivePolicy),
    SchedulingPolicy(SchedulingPolicy),
    ReducePolicy(ReducePolicy),
    ExecutionProgress(ExecutionProgress),
    AddObject(AddObject),
    AddObjectCompleted(AddObjectCompleted),
    ObjectReceived(ObjectReceived),
    Barrier,
    BarrierReached,
    RequestTunnel(RequestTunnel),
    RequestObject(RequestObject),
    SendObject(SendObject),
    NewObject(NewObject),
}

impl Payload {
    #[must_use]
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Identify(_) => MessageType::Identify,
            Self::SetId(_) => MessageType::SetId,
            Self::AddHub(_) => MessageType::AddHub,
            Self::RemoveSlave(_) => MessageType::RemoveSlave,
            Self::ReplayFinished => MessageType::ReplayFinished,
            Self::Trace(_) => MessageType::Trace,
            Self::Spawn(_) => MessageType::Spawn,
            Self::SpawnPrepared(_) => MessageType::SpawnPrepared,
            Self::Started(_) => MessageType::Started,
            Self::ModuleExit(_) => MessageType::ModuleExit,
            Self::Kill(_) => MessageType::Kill,
            Self::Quit => MessageType::Quit,
            Self::Execute(_) => MessageType::Execute,
            Self::Busy => MessageType::Busy,
            Self::Idle => MessageType::Idle,
            Self::ModuleAvailable(_) => MessageType::ModuleAvailable,
            Self::AddPort(_) => MessageType::AddPort,
            Self::AddParameter(_) => MessageType::AddParameter,
            Self::Connect(_) => MessageType::Connect,
            Self::Disconnect(_) => MessageType::Disconnect,
            Self::SetParameter(_) => MessageType::SetParameter,
            Self::SetParameterChoices(_) => MessageType::SetParameterChoices,
            Self::Ping(_) => MessageType::Ping,
            Self::Pong(_) => MessageType::Pong,
            Self::LockUi(_) => MessageType::LockUi,
            Self::SendText(_) => MessageType::SendText,
            Self::ObjectReceivePolicy(_) => MessageType::ObjectReceivePolicy,
            Self::SchedulingPolicy(_) => MessageType::SchedulingPolicy,
            Self::ReducePolicy(_) => MessageType::ReducePolicy,
            Self::ExecutionProgress(_) => MessageType::ExecutionProgress,
            Self::AddObject(_) => MessageType::AddObject,
            Self::AddObjectCompleted(_) => MessageType::AddObjectCompleted,
            Self::ObjectReceived(_) => MessageType::ObjectReceived,
            Self::Barrier => MessageType::Barrier,
            Self::BarrierReached => MessageType::BarrierReached,
            Self::RequestTunnel(_) => MessageType::RequestTunnel,
            Self::RequestObject(_) => MessageType::RequestObject,
            Self::SendObject(_) => MessageType::SendObject,
            Self::NewObject(_) => MessageType::NewObject,
        }
    }

    /// In-memory size of the type-specific struct.
    fn body_size(&self) -> usize {
        match self {
            Self::Identify(p) => size_of_val(p),
            Self::SetId(p) => size_of_val(p),
            Self::AddHub(p) => size_of_val(p),
            Self::RemoveSlave(p) => size_of_val(p),
            Self::Trace(p) => size_of_val(p),
            Self::Spawn(p) => size_of_val(p),
            Self::SpawnPrepared(p) => size_of_val(p),
            Self::Started(p) => size_of_val(p),
            Self::ModuleExit(p) => size_of_val(p),
            Self::Kill(p) => size_of_val(p),
            Self::Execute(p) => size_of_val(p),
            Self::ModuleAvailable(p) => size_of_val(p),
            Self::AddPort(p) => size_of_val(p),
            Self::AddParameter(p) => size_of_val(p),
            Self::Connect(p) | Self::Disconnect(p) => size_of_val(p),
            Self::SetParameter(p) => size_of_val(p),
            Self::SetParameterChoices(p) => size_of_val(p),
            Self::Ping(p) => size_of_val(p),
            Self::Pong(p) => size_of_val(p),
            Self::LockUi(p) => size_of_val(p),
            Self::SendText(p) => size_of_val(p),
            Self::ObjectReceivePolicy(p) => size_of_val(p),
            Self::SchedulingPolicy(p) => size_of_val(p),
            Self::ReducePolicy(p) => size_of_val(p),
            Self::ExecutionProgress(p) => size_of_val(p),
            Self::AddObject(p) => size_of_val(p),
            Self::AddObjectCompleted(p) => size_of_val(p),
            Self::ObjectReceived(p) => size_of_val(p),
            Self::RequestTunnel(p) => size_of_val(p),
            Self::RequestObject(p) => size_of_val(p),
            Self::SendObject(p) => size_of_val(p),
            Self::NewObject(p) => size_of_val(p),
            Self::ReplayFinished
            | Self::Quit
            | Self::Busy
            | Self::Idle
            | Self::Barrier
            | Self::BarrierReached => 0,
        }
    }

    /// Did any string of this payload get cut to fit?
    #[must_use]
    pub fn truncated(&self) -> bool {
        match self {
            Self::Identify(p) => p.truncated(),
            Self::AddHub(p) => p.truncated(),
            Self::Spawn(p) => p.name.is_truncated(),
            Self::SpawnPrepared(p) => p.name.is_truncated(),
            Self::Started(p) => p.name.is_truncated(),
            Self::ModuleAvailable(p) => p.name.is_truncated() || p.path.is_truncated(),
            Self::AddPort(p) => p.name.is_truncated(),
            Self::AddParameter(p) => p.truncated(),
            Self::Connect(p) | Self::Disconnect(p) => p.truncated(),
            Self::SetParameter(p) => p.truncated(),
            Self::SetParameterChoices(p) => p.truncated(),
            Self::SendText(p) => p.truncated(),
            Self::AddObject(p) => p.truncated(),
            Self::AddObjectCompleted(p) => {
                p.original_sender_port.is_truncated() || p.name.is_truncated()
            }
            Self::ObjectReceived(p) => {
                p.sender_port.is_truncated() || p.port_name.is_truncated() || p.name.is_truncated()
            }
            Self::RequestTunnel(p) => p.truncated(),
            Self::RequestObject(p) => p.object_id.is_truncated() || p.referrer.is_truncated(),
            Self::SendObject(p) => p.object_id.is_truncated(),
            _ => false,
        }
    }
}

macro_rules! payload_variants {
    ($($variant:ident($ty:ty) => $accessor:ident),* $(,)?) => {
        $(
            impl From<$ty> for Payload {
                fn from(p: $ty) -> Self {
                    Payload::$variant(p)
                }
            }
        )*

        impl Message {
            $(
                #[must_use]
                pub fn $accessor(&self) -> Option<&$ty> {
                    match &self.payload {
                        Payload::$variant(p) => Some(p),
                        _ => None,
                    }
                }
            )*
        }
    };
}

payload_variants! {
    Identify(Identify) => as_identify,
    SetId(SetId) => as_set_id,
    AddHub(AddHub) => as_add_hub,
    RemoveSlave(RemoveSlave) => as_remove_slave,
    Trace(Trace) => as_trace,
    Spawn(Spawn) => as_spawn,
    SpawnPrepared(SpawnPrepared) => as_spawn_prepared,
    Started(Started) => as_started,
    ModuleExit(ModuleExit) => as_module_exit,
    Kill(Kill) => as_kill,
    Execute(Execute) => as_execute,
    ModuleAvailable(ModuleAvailable) => as_module_available,
    AddPort(AddPort) => as_add_port,
    AddParameter(AddParameter) => as_add_parameter,
    SetParameter(SetParameter) => as_set_parameter,
    SetParameterChoices(SetParameterChoices) => as_set_parameter_choices,
    Ping(Ping) => as_ping,
    Pong(Pong) => as_pong,
    LockUi(LockUi) => as_lock_ui,
    SendText(SendText) => as_send_text,
    ObjectReceivePolicy(ObjectReceivePolicy) => as_object_receive_policy,
    SchedulingPolicy(SchedulingPolicy) => as_scheduling_policy,
    ReducePolicy(ReducePolicy) => as_reduce_policy,
    ExecutionProgress(ExecutionProgress) => as_execution_progress,
    AddObject(AddObject) => as_add_object,
    AddObjectCompleted(AddObjectCompleted) => as_add_object_completed,
    ObjectReceived(ObjectReceived) => as_object_received,
    RequestTunnel(RequestTunnel) => as_request_tunnel,
    RequestObject(RequestObject) => as_request_object,
    SendObject(SendObject) => as_send_object,
    NewObject(NewObject) => as_new_object,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Header {
    uuid: Uuid,
    size: u32,
    sender_id: ProcessId,
    rank: i32,
    dest_id: ProcessId,
    dest_rank: i32,
    broadcast: bool,
}

/// A control message: routing header plus typed payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Message {
    header: Header,
    payload: Payload,
}

impl Message {
    /// New message with a fresh correlation id, addressed to the next hop.
    ///
    /// The sender is left unset; the sending process stamps it.
    #[must_use]
    pub fn new(payload: impl Into<Payload>) -> Self {
        let payload = payload.into();
        let size = size_of::<Header>() + payload.body_size();
        Self {
            header: Header {
                uuid: Uuid::new_v4(),
                size: size as u32,
                sender_id: INVALID,
                rank: -1,
                dest_id: NEXT_HOP,
                dest_rank: -1,
                broadcast: matches!(payload, Payload::ObjectReceived(_)),
            },
            payload,
        }
    }

    #[must_use]
    pub fn connect(connection: Connection) -> Self {
        Self::new(Payload::Connect(connection))
    }

    #[must_use]
    pub fn disconnect(connection: Connection) -> Self {
        Self::new(Payload::Disconnect(connection))
    }

    /// Port pair of a `Connect` or `Disconnect`.
    #[must_use]
    pub fn as_connection(&self) -> Option<&Connection> {
        match &self.payload {
            Payload::Connect(c) | Payload::Disconnect(c) => Some(c),
            _ => None,
        }
    }

    fn expect_type(&self, expected: MessageType) -> Result<(), MessageError> {
        let found = self.message_type();
        if found == expected {
            Ok(())
        } else {
            Err(MessageError::UnexpectedType { expected, found })
        }
    }

    /// Answer to a `Ping`.
    pub fn pong(ping: &Message) -> Result<Message, MessageError> {
        let Some(p) = ping.as_ping() else {
            return Err(MessageError::UnexpectedType {
                expected: MessageType::Ping,
                found: ping.message_type(),
            });
        };
        let mut reply = Message::new(Pong {
            character: p.character,
            module: ping.sender_id(),
        });
        reply.set_uuid(ping.uuid());
        Ok(reply)
    }

    /// Confirmation of a `Spawn`.
    pub fn spawn_prepared(spawn: &Message) -> Result<Message, MessageError> {
        let Some(s) = spawn.as_spawn() else {
            return Err(MessageError::UnexpectedType {
                expected: MessageType::Spawn,
                found: spawn.message_type(),
            });
        };
        let mut reply = Message::new(SpawnPrepared::from(s));
        reply.set_uuid(spawn.uuid());
        Ok(reply)
    }

    /// Arrival at the barrier identified by `uuid`.
    #[must_use]
    pub fn barrier_reached(uuid: Uuid) -> Message {
        let mut msg = Message::new(Payload::BarrierReached);
        msg.set_uuid(uuid);
        msg
    }

    /// Tell the announcer of `add` that the object was received.
    pub fn add_object_completed(add: &Message) -> Result<Message, MessageError> {
        let Some(a) = add.as_add_object() else {
            return Err(MessageError::UnexpectedType {
                expected: MessageType::AddObject,
                found: add.message_type(),
            });
        };
        let mut reply = Message::new(AddObjectCompleted {
            original_sender_id: add.sender_id(),
            original_sender_port: a.sender_port,
            name: a.name,
        });
        reply.set_uuid(add.uuid());
        reply.set_dest_id(add.sender_id());
        reply.set_dest_rank(add.rank());
        Ok(reply)
    }

    /// Ask the announcer of `add` for `object_id`. An empty referrer names
    /// the announced object.
    pub fn request_object(
        add: &Message,
        object_id: &str,
        referrer: &str,
        array: bool,
    ) -> Result<Message, MessageError> {
        let Some(a) = add.as_add_object() else {
            return Err(MessageError::UnexpectedType {
                expected: MessageType::AddObject,
                found: add.message_type(),
            });
        };
        let referrer = if referrer.is_empty() {
            a.name
        } else {
            ObjectName::new(referrer)
        };
        let mut msg = Message::new(RequestObject {
            object_id: ObjectName::new(object_id),
            referrer,
            array,
        });
        msg.set_uuid(add.uuid());
        msg.set_dest_id(add.sender_id());
        msg.set_dest_rank(add.rank());
        Ok(msg)
    }

    /// Ask `dest_id`/`dest_rank` for `object_id` without a preceding announcement.
    #[must_use]
    pub fn request_object_from(
        dest_id: ProcessId,
        dest_rank: i32,
        object_id: &str,
        referrer: &str,
        array: bool,
    ) -> Message {
        let mut msg = Message::new(RequestObject {
            object_id: ObjectName::new(object_id),
            referrer: ObjectName::new(referrer),
            array,
        });
        msg.set_dest_id(dest_id);
        msg.set_dest_rank(dest_rank);
        msg
    }

    /// Answer `request` with the header of a serialized object.
    pub fn send_object(
        request: &Message,
        object_type: ObjectType,
        meta: Meta,
        payload_size: u64,
    ) -> Result<Message, MessageError> {
        let Some(r) = request.as_request_object() else {
            return Err(MessageError::UnexpectedType {
                expected: MessageType::RequestObject,
                found: request.message_type(),
            });
        };
        let mut msg = Message::new(SendObject {
            object_id: r.object_id,
            object_type,
            meta,
            payload_size,
        });
        msg.set_uuid(request.uuid());
        msg.set_dest_id(request.sender_id());
        msg.set_dest_rank(request.rank());
        Ok(msg)
    }

    /// Error text in response to `in_response_to`.
    #[must_use]
    pub fn send_text_reply(text: &str, in_response_to: &Message) -> Message {
        let mut body = SendText::new(TextType::Error, text);
        body.reference_uuid = in_response_to.uuid();
        body.reference_type = Some(in_response_to.message_type());
        Message::new(body)
    }

    /// Check that this is a `BarrierReached` for `barrier`.
    pub fn is_reply_to_barrier(&self, barrier: Uuid) -> Result<bool, MessageError> {
        self.expect_type(MessageType::BarrierReached)?;
        Ok(self.uuid() == barrier)
    }

    #[must_use]
    pub fn message_type(&self) -> MessageType {
        self.payload.message_type()
    }

    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut Payload {
        &mut self.payload
    }

    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.header.uuid
    }

    pub fn set_uuid(&mut self, uuid: Uuid) {
        self.header.uuid = uuid;
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.header.size as usize
    }

    #[must_use]
    pub fn sender_id(&self) -> ProcessId {
        self.header.sender_id
    }

    pub fn set_sender_id(&mut self, id: ProcessId) {
        self.header.sender_id = id;
    }

    /// Rank of the sender.
    #[must_use]
    pub fn rank(&self) -> i32 {
        self.header.rank
    }

    pub fn set_rank(&mut self, rank: i32) {
        self.header.rank = rank;
    }

    #[must_use]
    pub fn dest_id(&self) -> ProcessId {
        self.header.dest_id
    }

    pub fn set_dest_id(&mut self, id: ProcessId) {
        self.header.dest_id = id;
    }

    #[must_use]
    pub fn dest_rank(&self) -> i32 {
        self.header.dest_rank
    }

    pub fn set_dest_rank(&mut self, rank: i32) {
        self.header.dest_rank = rank;
    }

    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        self.header.broadcast
    }

    pub fn set_broadcast(&mut self, enable: bool) {
        self.header.broadcast = enable;
    }

    /// Is this addressed to every process?
    #[must_use]
    pub fn is_for_everyone(&self) -> bool {
        self.header.dest_id == BROADCAST
    }

    /// Did any string of the payload get cut to fit?
    #[must_use]
    pub fn truncated(&self) -> bool {
        self.payload.truncated()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "uuid: {}, type: {}, size: {}, sender: {}, dest: {}, rank: {}",
            self.uuid(),
            self.message_type(),
            self.size(),
            self.sender_id(),
            self.dest_id(),
            self.rank()
        )?;
        match &self.payload {
            Payload::Execute(m) => write!(
                f,
                ", module: {}, what: {:?}, execcount: {}",
                m.module, m.what, m.execution_count
            ),
            Payload::ExecutionProgress(m) => write!(f, ", stage: {m:?}"),
            Payload::AddParameter(m) => write!(f, ", name: {}", m.name),
            Payload::SetParameter(m) => write!(f, ", dest: {}, name: {}", m.module, m.name),
            Payload::SetParameterChoices(m) => {
                write!(f, ", dest: {}, name: {}", m.module, m.name)
            }
            Payload::AddPort(m) => write!(f, ", name: {}", m.name),
            Payload::ModuleAvailable(m) => write!(f, ", name: {}, hub: {}", m.name, m.hub),
            Payload::Spawn(m) => {
                write!(f, ", name: {}, id: {}, hub: {}", m.name, m.spawn_id, m.hub)
            }
            Payload::AddHub(m) => write!(f, ", name: {}, id: {}", m.name, m.id),
            Payload::AddObject(m) => write!(
                f,
                ", obj: {}, {} -> {}",
                m.name, m.sender_port, m.dest_port
            ),
            Payload::RequestObject(m) => write!(f, ", obj: {}", m.object_id),
            Payload::SendObject(m) => {
                write!(f, ", obj: {}, payload: {}", m.object_id, m.payload_size)
            }
            _ => Ok(()),
        }
    }
}
