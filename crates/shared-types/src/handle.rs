//! Segment-relative object handle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of a data record inside one named shared segment.
///
/// A handle is only meaningful together with the segment name it was
/// issued by. The generation makes a handle to a reclaimed slot stale
/// instead of silently aliasing the slot's next occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ShmHandle {
    pub index: u32,
    pub generation: u32,
}

impl ShmHandle {
    #[must_use]
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for ShmHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.index, self.generation)
    }
}
