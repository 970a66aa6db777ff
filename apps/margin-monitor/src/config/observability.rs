//! Logging and metrics configuration.

use serde::{Deserialize, Serialize};

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level ("trace" | "debug" | "info" | "warn" | "error").
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format ("pretty" | "json").
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Prometheus metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Whether the Prometheus exporter is started.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Address the metrics HTTP listener binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_true() -> bool {
    true
}

fn default_listen_addr() -> String {
    "0.0.0.0:9090".to_string()
}
