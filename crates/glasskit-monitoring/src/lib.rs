//! Monitoring plumbing for the Glasskit crates.
//!
//! Installs the `tracing` subscriber used by hosts and exposes the metric
//! recorders the flow engine and the event queue report through.

use serde::{Deserialize, Serialize};
use tracing::info;

pub mod logging;
pub mod metrics;

pub use crate::logging::{init_logging, init_test_tracing, LogExt};
pub use crate::metrics::{EventQueueMetrics, FlowMetrics};

/// Configuration for initializing logging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Service name attached to the startup log line
    pub service_name: String,
    /// Log level filter (e.g., "info,glasskit_events=debug")
    pub log_filter: String,
    /// Emit JSON lines instead of the pretty development format
    pub json_logs: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            service_name: "glasskit".to_string(),
            log_filter: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Initialize the monitoring system
pub fn init(config: MonitoringConfig) -> anyhow::Result<()> {
    init_logging(&config)?;
    info!(service_name = %config.service_name, "Monitoring initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = MonitoringConfig::default();
        assert_eq!(config.service_name, "glasskit");
        assert_eq!(config.log_filter, "info");
        assert!(!config.json_logs);
    }

    #[test]
    fn test_config_partial_deserialize() {
        let config: MonitoringConfig =
            serde_json::from_str(r#"{"json_logs": true}"#).unwrap();
        assert!(config.json_logs);
        assert_eq!(config.service_name, "glasskit");
    }
}
