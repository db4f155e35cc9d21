//! # Process Identifiers
//!
//! Every process in the runtime tree is addressed by a signed integer id.
//! Positive ids name modules, non-positive ids are reserved sentinels or hubs.
//!
//! ```text
//!   ... -7  -6  -5        -4   -3        -2             -1         0        1  2  3 ...
//!   slave hubs  MASTER_HUB UI  NEXT_HOP  FOR_BROADCAST  BROADCAST  INVALID  modules
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Signed process identifier as carried in message headers.
pub type ProcessId = i32;

/// Unset id.
pub const INVALID: ProcessId = 0;

/// First id assigned to a module.
pub const MODULE_BASE: ProcessId = 1;

/// Deliver to every process.
pub const BROADCAST: ProcessId = -1;

/// Broadcast that has not been resolved yet; must travel to the master hub
/// before being re-emitted as a real broadcast.
pub const FOR_BROADCAST: ProcessId = -2;

/// Deliver to the immediate neighbour only.
pub const NEXT_HOP: ProcessId = -3;

/// Deliver to user interfaces.
pub const UI: ProcessId = -4;

/// Id of the master hub. Slave hubs count downwards from here.
pub const MASTER_HUB: ProcessId = -5;

/// Is `id` a module id?
#[must_use]
pub fn is_module(id: ProcessId) -> bool {
    id >= MODULE_BASE
}

/// Is `id` a hub id (master or slave)?
#[must_use]
pub fn is_hub(id: ProcessId) -> bool {
    id <= MASTER_HUB
}

/// Id of the n-th slave hub (`n` starting at 1).
#[must_use]
pub fn slave_hub(n: u16) -> ProcessId {
    MASTER_HUB - ProcessId::from(n)
}

/// Role of a process, both in `Identify` handshakes and for routing decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Identity {
    /// Peer has not identified yet.
    #[default]
    Unknown,
    /// Peer is asked to identify.
    Request,
    /// User interface client.
    Ui,
    /// Manager of one parallel compute group.
    Manager,
    /// Master hub.
    Hub,
    /// Hub on a secondary host.
    SlaveHub,
    /// Bulk data connection within a host.
    LocalBulkData,
    /// Bulk data connection between hosts.
    RemoteBulkData,
    /// Computation unit.
    Module,
}

impl Identity {
    /// Is this one of the bulk data connection kinds?
    #[must_use]
    pub fn is_bulk_data(self) -> bool {
        matches!(self, Self::LocalBulkData | Self::RemoteBulkData)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Request => "request",
            Self::Ui => "ui",
            Self::Manager => "manager",
            Self::Hub => "hub",
            Self::SlaveHub => "slavehub",
            Self::LocalBulkData => "local-bulkdata",
            Self::RemoteBulkData => "remote-bulkdata",
            Self::Module => "module",
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Identity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ui" => Ok(Self::Ui),
            "manager" => Ok(Self::Manager),
            "hub" => Ok(Self::Hub),
            "slavehub" | "slave-hub" => Ok(Self::SlaveHub),
            "module" => Ok(Self::Module),
            other => Err(format!("unknown identity: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_ordering() {
        assert!(MASTER_HUB < UI);
        assert!(UI < NEXT_HOP);
        assert!(NEXT_HOP < FOR_BROADCAST);
        assert!(FOR_BROADCAST < BROADCAST);
        assert!(BROADCAST < INVALID);
        assert!(INVALID < MODULE_BASE);
    }

    #[test]
    fn test_hub_and_module_classification() {
        assert!(is_hub(MASTER_HUB));
        assert!(is_hub(slave_hub(1)));
        assert!(!is_hub(UI));
        assert!(is_module(7));
        assert!(!is_module(INVALID));
        assert!(!is_module(BROADCAST));
    }

    #[test]
    fn test_identity_parse() {
        assert_eq!("SlaveHub".parse::<Identity>(), Ok(Identity::SlaveHub));
        assert!("router".parse::<Identity>().is_err());
    }
}
