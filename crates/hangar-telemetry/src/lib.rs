//! # Hangar Telemetry
//!
//! Process-level logging for binaries and services that embed the Hangar
//! engine. The engine crates only emit `tracing` events; this crate decides
//! where they go.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hangar_telemetry::{init_telemetry, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(config).expect("Failed to init telemetry");
//!
//!     // Build components, a graph and an environment here
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `HANGAR_SERVICE_NAME` | `hangar` | Service name in log output |
//! | `HANGAR_LOG_LEVEL` | `info` | Log level filter (`RUST_LOG` also honoured) |
//! | `HANGAR_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `HANGAR_JSON_LOGS` | `false` (`true` in containers) | JSON formatted logs |

mod config;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use tracing_setup::{env_filter, init_test_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("A global subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

/// Install the global subscriber.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    tracing_setup::init_tracing(&config)?;
    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard that marks telemetry as active. Logs a final line when dropped.
pub struct TelemetryGuard {
    service_name: String,
}

impl TelemetryGuard {
    /// Service name the subscriber was installed for.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry...");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let config = TelemetryConfig {
            console_output: false,
            ..TelemetryConfig::default()
        };

        // Another test in this binary may have installed a subscriber first,
        // so only the second call is guaranteed to fail.
        let first = init_telemetry(config.clone());
        let second = init_telemetry(config);

        assert!(matches!(
            second,
            Err(TelemetryError::AlreadyInitialized(_))
        ));
        if let Ok(guard) = first {
            assert_eq!(guard.service_name(), "hangar");
        }
    }
}
