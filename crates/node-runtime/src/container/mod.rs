//! Process configuration and the state shared by its handlers.

pub mod config;
pub mod context;

pub use config::{ConfigError, RuntimeConfig};
pub use context::ProcessContext;
