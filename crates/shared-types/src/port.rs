//! Module ports.

use crate::ids::ProcessId;
use serde::{Deserialize, Serialize};

/// Direction of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortKind {
    Input,
    Output,
    Parameter,
}

/// Port flag: several connections may feed this input.
pub const PORT_MULTI: u32 = 0x1;
/// Port flag: objects are combined over all ranks.
pub const PORT_COMBINE: u32 = 0x2;
/// Port flag: an unconnected input does not block execution.
pub const PORT_OPTIONAL: u32 = 0x4;

/// A named connection point of a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Port {
    pub module: ProcessId,
    pub name: String,
    pub kind: PortKind,
    pub flags: u32,
}

impl Port {
    #[must_use]
    pub fn new(module: ProcessId, name: impl Into<String>, kind: PortKind, flags: u32) -> Self {
        Self {
            module,
            name: name.into(),
            kind,
            flags,
        }
    }

    #[must_use]
    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }
}
