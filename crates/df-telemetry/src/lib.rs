//! # df-telemetry
//!
//! Structured logging for hubs, managers and modules.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use df_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&TelemetryConfig::for_process("manager"))?;
//!     // ...
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DF_SERVICE_NAME` | `dataflow` | Service name in records |
//! | `DF_LOG_LEVEL` | `info` | Filter directive, falls back to `RUST_LOG` |
//! | `DF_CONSOLE_OUTPUT` | `true` | Write records to the console |
//! | `DF_JSON_LOGS` | `false` | JSON instead of text records |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to install subscriber: {0}")]
    Init(String),
}

/// Span for work done on behalf of one process.
///
/// ```rust,ignore
/// let _span = process_span!("dispatch", id = 5, rank = 0).entered();
/// ```
#[macro_export]
macro_rules! process_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}
