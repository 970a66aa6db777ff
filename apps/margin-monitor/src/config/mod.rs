//! Configuration module for the margin monitor.
//!
//! Provides YAML configuration loading with environment variable
//! interpolation and validation for every component of the monitor.
//!
//! # Usage
//!
//! ```rust,ignore
//! use margin_monitor::config::load_config;
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! // Load from custom path
//! let config = load_config(Some("conf/monitor.yaml"))?;
//! ```

mod alerts;
mod exchange;
mod monitor;
mod observability;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use alerts::{AlertsConfig, WebhookConfig};
pub use exchange::{AuthScheme, ExchangeConfig};
pub use monitor::MonitorConfig;
pub use observability::{LoggingConfig, MetricsConfig};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Exchange credentials and endpoint configuration.
    pub exchange: ExchangeConfig,
    /// Poll loop and risk threshold configuration.
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Alert delivery configuration.
    #[serde(default)]
    pub alerts: AlertsConfig,
    /// Prometheus metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    let interpolated = interpolate_env_vars(&contents);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;

    Ok(config)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let mut result = input.to_string();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    for cap in re.captures_iter(input) {
        let Some(full_match) = cap.get(0) else {
            continue;
        };
        let Some(var_match) = cap.get(1) else {
            continue;
        };
        let full_match = full_match.as_str();
        let var_name = var_match.as_str();
        let default_value = cap.get(2).map(|m| m.as_str());

        let value = match std::env::var(var_name) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.map_or_else(String::new, str::to_string),
        };

        result = result.replace(full_match, &value);
    }

    result
}

/// Validate configuration values.
///
/// The poll interval is deliberately not validated here: a non-positive
/// interval is coerced to a safe default by the scheduler at runtime.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let m = &config.monitor;

    if m.mm_threshold <= 0.0 || m.mm_threshold > 1.0 {
        return Err(ConfigError::ValidationError(
            "monitor.mm_threshold must be in (0.0, 1.0]".to_string(),
        ));
    }

    if m.mm_target <= 0.0 || m.mm_target >= 1.0 {
        return Err(ConfigError::ValidationError(
            "monitor.mm_target must be in (0.0, 1.0)".to_string(),
        ));
    }

    if m.mm_target >= m.mm_threshold {
        return Err(ConfigError::ValidationError(
            "monitor.mm_target must be below monitor.mm_threshold".to_string(),
        ));
    }

    if m.equity_floor_usd >= 0.0 {
        return Err(ConfigError::ValidationError(
            "monitor.equity_floor_usd must be negative".to_string(),
        ));
    }

    if m.equity_target <= 0.0 {
        return Err(ConfigError::ValidationError(
            "monitor.equity_target must be positive".to_string(),
        ));
    }

    if m.fallback_price_usd <= 0.0 {
        return Err(ConfigError::ValidationError(
            "monitor.fallback_price_usd must be positive".to_string(),
        ));
    }

    if config.alerts.enabled
        && config.alerts.methods.iter().any(|m| m == "webhook")
        && config.alerts.webhook.url.is_empty()
    {
        return Err(ConfigError::ValidationError(
            "alerts.webhook.url is required when the webhook method is enabled".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::DenominatorSource;

    fn minimal_yaml() -> &'static str {
        r#"
exchange:
  api_key: "key"
  api_secret: "secret"
"#
    }

    #[test]
    fn load_minimal_config_applies_defaults() {
        let config = match load_config_from_string(minimal_yaml()) {
            Ok(c) => c,
            Err(e) => panic!("should load minimal config: {e}"),
        };

        assert_eq!(config.monitor.interval_seconds, 30);
        assert_eq!(config.monitor.currency, "ETH");
        assert!((config.monitor.mm_threshold - 0.5).abs() < f64::EPSILON);
        assert!((config.monitor.mm_target - 0.3).abs() < f64::EPSILON);
        assert!((config.monitor.equity_floor_usd + 700_000.0).abs() < 1e-10);
        assert!((config.monitor.equity_target - 200.0).abs() < f64::EPSILON);
        assert!((config.monitor.fallback_price_usd - 3000.0).abs() < f64::EPSILON);
        assert_eq!(config.monitor.denominator, DenominatorSource::SingleCurrencyNative);
        assert_eq!(config.exchange.auth_scheme, AuthScheme::Hmac);
        assert!(!config.exchange.testnet);
        assert!(config.alerts.enabled);
        assert_eq!(config.alerts.methods, vec!["log".to_string()]);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn env_var_with_default_when_missing() {
        let input = "account: ${MARGIN_MONITOR_TEST_NONEXISTENT_VAR:-main}";
        let result = interpolate_env_vars(input);
        assert_eq!(result, "account: main");
    }

    #[test]
    fn env_var_without_default_becomes_empty() {
        let input = "api_key: ${MARGIN_MONITOR_TEST_UNLIKELY_TO_EXIST}";
        let result = interpolate_env_vars(input);
        assert_eq!(result, "api_key: ");
    }

    #[test]
    fn validation_rejects_mm_target_above_threshold() {
        let yaml = r#"
exchange:
  api_key: "key"
  api_secret: "secret"
monitor:
  mm_threshold: 0.3
  mm_target: 0.5
"#;
        let result = load_config_from_string(yaml);
        let Err(err) = result else {
            panic!("expected error for target above threshold");
        };
        assert!(err.to_string().contains("mm_target"));
    }

    #[test]
    fn validation_rejects_positive_equity_floor() {
        let yaml = r#"
exchange:
  api_key: "key"
  api_secret: "secret"
monitor:
  equity_floor_usd: 700000.0
"#;
        let result = load_config_from_string(yaml);
        let Err(err) = result else {
            panic!("expected error for positive equity floor");
        };
        assert!(err.to_string().contains("equity_floor_usd"));
    }

    #[test]
    fn validation_rejects_webhook_method_without_url() {
        let yaml = r#"
exchange:
  api_key: "key"
  api_secret: "secret"
alerts:
  enabled: true
  methods: ["log", "webhook"]
"#;
        let result = load_config_from_string(yaml);
        let Err(err) = result else {
            panic!("expected error for webhook without URL");
        };
        assert!(err.to_string().contains("webhook"));
    }

    #[test]
    fn negative_interval_is_not_a_validation_error() {
        let yaml = r#"
exchange:
  api_key: "key"
  api_secret: "secret"
monitor:
  interval_seconds: -5
"#;
        let config = match load_config_from_string(yaml) {
            Ok(c) => c,
            Err(e) => panic!("negative interval must pass validation: {e}"),
        };
        assert_eq!(config.monitor.interval_seconds, -5);
    }

    #[test]
    fn full_config_parse() {
        let yaml = r#"
exchange:
  api_key: "key"
  api_secret: "secret"
  testnet: true
  auth_scheme: oauth
  timeout_secs: 10

monitor:
  interval_seconds: 60
  account: "main"
  currency: "BTC"
  denominator: account_totals
  mm_threshold: 0.6
  mm_target: 0.25
  equity_floor_usd: -500000.0
  equity_target: 150.0
  fallback_price_usd: 40000.0

alerts:
  enabled: true
  methods: ["log", "webhook"]
  webhook:
    url: "https://hooks.example.com/margin"
    timeout_secs: 5

metrics:
  enabled: true
  listen_addr: "0.0.0.0:9105"

logging:
  level: "debug"
  format: "pretty"
"#;
        let config = match load_config_from_string(yaml) {
            Ok(c) => c,
            Err(e) => panic!("should load full config: {e}"),
        };

        assert!(config.exchange.testnet);
        assert_eq!(config.exchange.auth_scheme, AuthScheme::OAuth);
        assert_eq!(config.exchange.timeout_secs, 10);
        assert_eq!(config.monitor.interval_seconds, 60);
        assert_eq!(config.monitor.account, "main");
        assert_eq!(config.monitor.currency, "BTC");
        assert_eq!(config.monitor.denominator, DenominatorSource::AccountTotalsUsd);
        assert!((config.monitor.mm_threshold - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.alerts.webhook.url, "https://hooks.example.com/margin");
        assert_eq!(config.metrics.listen_addr, "0.0.0.0:9105");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
    }
}
