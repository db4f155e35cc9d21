//! Telemetry configuration from environment variables.

use std::env;

/// Configuration of process logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to every record
    pub service_name: String,

    /// Process role, e.g. hub, manager or a module name
    pub process: String,

    /// Log level filter (trace, debug, info, warn, error) or full directive
    pub log_level: String,

    /// Whether to write to the console at all
    pub console_output: bool,

    /// Whether to write JSON records instead of text
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "dataflow".to_string(),
            process: "process".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DF_SERVICE_NAME`: Service name (default: dataflow)
    /// - `DF_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `DF_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `DF_JSON_LOGS`: Enable JSON logs (default: false)
    pub fn from_env() -> Self {
        Self {
            service_name: env::var("DF_SERVICE_NAME").unwrap_or_else(|_| "dataflow".to_string()),

            process: "process".to_string(),

            log_level: env::var("DF_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("DF_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: env::var("DF_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// Configuration for one process of the session.
    pub fn for_process(process: &str) -> Self {
        let mut config = Self::from_env();
        config.process = process.to_string();
        config
    }

    /// Name shown in log records.
    pub fn full_service_name(&self) -> String {
        format!("{}-{}", self.service_name, self.process)
    }
}
