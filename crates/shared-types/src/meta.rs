//! # Object Metadata
//!
//! Position of a data object inside the decomposition of a dataset:
//! which block, timestep and animation step it represents, and which
//! module execution produced it.

use crate::ids::{ProcessId, INVALID};
use serde::{Deserialize, Serialize};

/// Row-major 4x4 transformation matrix.
pub type Matrix4 = [[f64; 4]; 4];

/// Identity transform.
pub const IDENTITY_TRANSFORM: Matrix4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Metadata carried by every data object and copied into transfer messages.
///
/// `-1` marks a field as unset, following the convention of the block and
/// timestep counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub block: i32,
    pub num_blocks: i32,
    pub timestep: i32,
    pub num_timesteps: i32,
    pub animation_step: i32,
    pub num_animation_steps: i32,
    pub iteration: i32,
    pub execution_counter: i32,
    pub creator: ProcessId,
    pub real_time: f64,
    pub transform: Matrix4,
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            block: -1,
            num_blocks: -1,
            timestep: -1,
            num_timesteps: -1,
            animation_step: -1,
            num_animation_steps: -1,
            iteration: -1,
            execution_counter: -1,
            creator: INVALID,
            real_time: 0.0,
            transform: IDENTITY_TRANSFORM,
        }
    }
}

impl Meta {
    /// Metadata for one block of one timestep.
    #[must_use]
    pub fn new(
        block: i32,
        timestep: i32,
        animation_step: i32,
        iteration: i32,
        execution_counter: i32,
        creator: ProcessId,
    ) -> Self {
        Self {
            block,
            timestep,
            animation_step,
            iteration,
            execution_counter,
            creator,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_num_blocks(mut self, num: i32) -> Self {
        self.num_blocks = num;
        self
    }

    #[must_use]
    pub fn with_num_timesteps(mut self, num: i32) -> Self {
        self.num_timesteps = num;
        self
    }

    #[must_use]
    pub fn with_num_animation_steps(mut self, num: i32) -> Self {
        self.num_animation_steps = num;
        self
    }

    #[must_use]
    pub fn with_real_time(mut self, time: f64) -> Self {
        self.real_time = time;
        self
    }
}
