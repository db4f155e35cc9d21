//! Subscriber setup and message logging helpers.

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Install the global subscriber described by `config`.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .or_else(|_| EnvFilter::try_from_default_env())
        .map_err(|e| TelemetryError::Filter(e.to_string()))?;

    let console = if !config.console_output {
        None
    } else if config.json_logs {
        Some(
            tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
        )
    } else {
        Some(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(true)
                .boxed(),
        )
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))?;

    tracing::info!(
        service = %config.full_service_name(),
        json = config.json_logs,
        "Logging initialized"
    );
    Ok(())
}

/// Log a control message with its routing header as fields.
///
/// ```rust,ignore
/// log_message!(debug, &msg, "Forwarded to manager");
/// log_message!(warn, &msg, "Dropped", reason = "module exited");
/// ```
#[macro_export]
macro_rules! log_message {
    ($level:ident, $msg:expr, $text:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            message_type = %$msg.message_type(),
            uuid = %$msg.uuid(),
            sender = $msg.sender_id(),
            rank = $msg.rank(),
            dest = $msg.dest_id(),
            $($($field)*,)?
            $text
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_filter_rejected() {
        let config = TelemetryConfig {
            log_level: "df=notalevel".to_string(),
            ..TelemetryConfig::default()
        };
        std::env::remove_var("RUST_LOG");
        assert!(matches!(init_logging(&config), Err(TelemetryError::Filter(_))));
    }
}
