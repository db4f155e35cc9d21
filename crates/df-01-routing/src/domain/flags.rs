//! Routing flags
//!
//! Each message type carries a combination of destination classes (`DEST_*`),
//! handling rules (`HANDLE_ON_*`) and queueing rules.

use bitflags::bitflags;

bitflags! {
    /// Per-type routing rules.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RoutingFlags: u32 {
        /// Delivered to every process.
        const BROADCAST = 1 << 0;
        /// Recorded by state trackers.
        const TRACK = 1 << 1;
        const DEST_UI = 1 << 2;
        const DEST_MODULES = 1 << 3;
        const DEST_MANAGER = 1 << 4;
        const DEST_MASTER_HUB = 1 << 5;
        const DEST_SLAVE_HUB = 1 << 6;
        const DEST_LOCAL_HUB = 1 << 7;
        const DEST_HUB = Self::DEST_MASTER_HUB.bits() | Self::DEST_SLAVE_HUB.bits();
        const DEST_MASTER_MANAGER = 1 << 8;
        const DEST_SLAVE_MANAGER = 1 << 9;
        const DEST_LOCAL_MANAGER = 1 << 10;
        const HANDLE_ON_MASTER = 1 << 11;
        const HANDLE_ON_HUB = 1 << 12;
        const HANDLE_ON_NODE = 1 << 13;
        const HANDLE_ON_RANK0 = 1 << 14;
        const HANDLE_ON_DEST = 1 << 15;
        /// Park while the destination is unknown.
        const QUEUE_IF_UNHANDLED = 1 << 16;
        /// May make parked messages deliverable.
        const TRIGGER_QUEUE = 1 << 17;
        /// Routed by dedicated code paths.
        const SPECIAL = 1 << 18;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dest_hub_covers_both_hubs() {
        assert!(RoutingFlags::DEST_HUB.contains(RoutingFlags::DEST_MASTER_HUB));
        assert!(RoutingFlags::DEST_HUB.contains(RoutingFlags::DEST_SLAVE_HUB));
        assert!(!RoutingFlags::DEST_HUB.contains(RoutingFlags::DEST_LOCAL_HUB));
    }

    #[test]
    fn test_intersects_any_hub() {
        let flags = RoutingFlags::DEST_SLAVE_HUB | RoutingFlags::TRACK;
        assert!(flags.intersects(RoutingFlags::DEST_HUB));
    }
}
