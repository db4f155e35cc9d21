//! Payloads of the object transfer protocol.
//!
//! ```text
//!  same host:    AddObject(handle, token) ───────────────▶ take_object()
//!  across hosts: AddObject ─▶ RequestObject ─▶ SendObject + payload bytes
//!                                   └──── correlated by the AddObject uuid
//! ```

use super::{ObjectName, PortName, ShmName};
use crate::handle::ShmHandle;
use crate::ids::ProcessId;
use crate::meta::Meta;
use crate::object_type::ObjectType;
use serde::{Deserialize, Serialize};

/// Announces an object on an output port.
///
/// While a same-host announcement is pending, the segment holds one
/// reference to the object on its behalf, identified by `transfer`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AddObject {
    pub sender_port: PortName,
    pub dest_port: PortName,
    pub name: ObjectName,
    pub shm_name: ShmName,
    pub meta: Meta,
    pub object_type: ObjectType,
    pub handle: ShmHandle,
    pub transfer: u64,
}

impl AddObject {
    pub(super) fn truncated(&self) -> bool {
        self.sender_port.is_truncated()
            || self.dest_port.is_truncated()
            || self.name.is_truncated()
            || self.shm_name.is_truncated()
    }
}

/// The receiver no longer needs the announcing side to keep the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddObjectCompleted {
    pub original_sender_id: ProcessId,
    pub original_sender_port: PortName,
    pub name: ObjectName,
}

/// Broadcast after a module received an object on an input port.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectReceived {
    pub sender_port: PortName,
    pub port_name: PortName,
    pub name: ObjectName,
    pub meta: Meta,
    pub object_type: ObjectType,
}

/// Ask the owner of an object for its serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestObject {
    pub object_id: ObjectName,
    pub referrer: ObjectName,
    pub array: bool,
}

/// Header of a serialized object; exactly `payload_size` bytes follow out of band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SendObject {
    pub object_id: ObjectName,
    pub object_type: ObjectType,
    pub meta: Meta,
    pub payload_size: u64,
}

impl SendObject {
    /// Metadata of the transferred object.
    #[must_use]
    pub fn object_meta(&self) -> Meta {
        self.meta
    }
}
