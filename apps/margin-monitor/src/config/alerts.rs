//! Alert delivery configuration.

use serde::{Deserialize, Serialize};

/// Alert delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    /// Master switch for alert delivery.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Delivery methods to fan out to ("log", "webhook").
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
    /// Webhook transport settings.
    #[serde(default)]
    pub webhook: WebhookConfig,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            methods: default_methods(),
            webhook: WebhookConfig::default(),
        }
    }
}

/// Webhook transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook POST target URL.
    #[serde(default)]
    pub url: String,
    /// Delivery timeout in seconds.
    #[serde(default = "default_webhook_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: default_webhook_timeout_secs(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_methods() -> Vec<String> {
    vec!["log".to_string()]
}

fn default_webhook_timeout_secs() -> u64 {
    10
}
