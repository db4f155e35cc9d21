//! # Runtime Configuration
//!
//! Identity and resources of one process of the session.
//!
//! ## Requirements
//!
//! - Modules have ids from `MODULE_BASE` up, hubs use the reserved negative ids
//! - The segment name is made host-unique by appending the host name

use df_02_shm::ShmConfig;
use shared_bus::DEFAULT_QUEUE_DEPTH;
use shared_types::ids::{is_hub, is_module, MASTER_HUB};
use shared_types::{Identity, ProcessId};
use std::env;
use thiserror::Error;

/// Complete process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Role of this process.
    pub identity: Identity,
    /// Process id.
    pub id: ProcessId,
    /// MPI rank, 0 for single-process roles.
    pub rank: i32,
    /// Host name, part of the segment name.
    pub host: String,
    /// Shared segment of the host.
    pub shm: ShmConfig,
    /// Capacity of the new-object notification queue.
    pub queue_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            identity: Identity::Hub,
            id: MASTER_HUB,
            rank: 0,
            host: "localhost".to_string(),
            shm: ShmConfig::default(),
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}

impl RuntimeConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DF_IDENTITY`: hub, slavehub, manager, module or ui (default: hub)
    /// - `DF_ID`: Process id (default: master hub)
    /// - `DF_RANK`: Rank (default: 0)
    /// - `DF_HOST`: Host name (default: localhost)
    /// - `DF_SHM_NAME`, `DF_SHM_SIZE`, `DF_SHM_MIN_SIZE`: see [`ShmConfig::from_env`]
    /// - `DF_QUEUE_DEPTH`: Notification queue capacity (default: 256)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            identity: env::var("DF_IDENTITY")
                .ok()
                .and_then(|v| parse_identity(&v))
                .unwrap_or(defaults.identity),

            id: env::var("DF_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.id),

            rank: env::var("DF_RANK")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.rank),

            host: env::var("DF_HOST").unwrap_or(defaults.host),

            shm: ShmConfig::from_env(),

            queue_depth: env::var("DF_QUEUE_DEPTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.queue_depth),
        }
    }

    /// Configuration of a module process.
    #[must_use]
    pub fn module(id: ProcessId, rank: i32, host: &str) -> Self {
        Self {
            identity: Identity::Module,
            id,
            rank,
            host: host.to_string(),
            ..Self::default()
        }
    }

    /// Configuration of a hub process.
    #[must_use]
    pub fn hub(id: ProcessId, host: &str) -> Self {
        Self {
            identity: if id == MASTER_HUB {
                Identity::Hub
            } else {
                Identity::SlaveHub
            },
            id,
            host: host.to_string(),
            ..Self::default()
        }
    }

    /// Configuration of the manager relaying for the modules of hub `hub`.
    #[must_use]
    pub fn manager(hub: ProcessId, host: &str) -> Self {
        Self {
            identity: Identity::Manager,
            id: hub,
            host: host.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_segment_size(mut self, size: usize) -> Self {
        self.shm = self.shm.with_initial_size(size);
        self
    }

    /// Segment configuration with the host-unique segment name.
    #[must_use]
    pub fn shm_config(&self) -> ShmConfig {
        let mut shm = self.shm.clone();
        shm.name = format!("{}_{}", self.shm.name, self.host);
        shm
    }

    /// Check the combination of identity, id and rank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let id_ok = match self.identity {
            Identity::Module => is_module(self.id),
            Identity::Hub => self.id == MASTER_HUB,
            Identity::SlaveHub => is_hub(self.id) && self.id != MASTER_HUB,
            Identity::Manager => is_hub(self.id),
            Identity::Ui => true,
            other => return Err(ConfigError::UnsupportedIdentity(other)),
        };
        if !id_ok {
            return Err(ConfigError::IdMismatch {
                identity: self.identity,
                id: self.id,
            });
        }
        if self.rank < 0 {
            return Err(ConfigError::NegativeRank(self.rank));
        }
        if self.host.is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.queue_depth == 0 {
            return Err(ConfigError::ZeroQueueDepth);
        }
        Ok(())
    }
}

fn parse_identity(value: &str) -> Option<Identity> {
    [
        Identity::Ui,
        Identity::Manager,
        Identity::Hub,
        Identity::SlaveHub,
        Identity::Module,
    ]
    .into_iter()
    .find(|i| i.as_str().eq_ignore_ascii_case(value.trim()))
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Identity {0} cannot run as a process")]
    UnsupportedIdentity(Identity),

    #[error("Id {id} is not valid for identity {identity}")]
    IdMismatch { identity: Identity, id: ProcessId },

    #[error("Rank {0} is negative")]
    NegativeRank(i32),

    #[error("Host name is empty")]
    EmptyHost,

    #[error("Notification queue depth must be positive")]
    ZeroQueueDepth,
}
