//! Alert delivery.
//!
//! A breach finding becomes an [`Alert`], and the dispatcher fans it out to
//! every configured sink. Sink failures are logged and never stop the
//! monitor or the remaining sinks.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::config::AlertsConfig;
use crate::risk::{RiskAssessment, RuleKind};

/// Alert delivery failure.
#[derive(Debug, Error)]
pub enum AlertError {
    /// The webhook endpoint could not be reached.
    #[error("webhook transport error: {0}")]
    Transport(String),

    /// The webhook endpoint rejected the alert.
    #[error("webhook returned status {status}")]
    Rejected {
        /// HTTP status code.
        status: u16,
    },

    /// Sink construction failed.
    #[error("alert sink configuration error: {0}")]
    Config(String),
}

/// Which rule produced the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertKind {
    /// Maintenance-margin ratio breach.
    #[serde(rename = "MM_THRESHOLD_BREACH")]
    MaintenanceMargin,
    /// Equity floor breach.
    #[serde(rename = "EQUITY_THRESHOLD_BREACH")]
    EquityFloor,
}

impl From<RuleKind> for AlertKind {
    fn from(rule: RuleKind) -> Self {
        match rule {
            RuleKind::MaintenanceMarginRatio => Self::MaintenanceMargin,
            RuleKind::EquityFloor => Self::EquityFloor,
        }
    }
}

/// A delivered breach notification.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    /// Breach category.
    pub kind: AlertKind,
    /// Account label from config.
    pub account: String,
    /// Monitored currency.
    pub currency: String,
    /// Human-readable description with the remediation suggestion.
    pub message: String,
    /// The value that breached.
    pub current_value: f64,
    /// The configured threshold.
    pub threshold: f64,
    /// Suggested amount of the monitored asset to add.
    pub remediation: f64,
    /// When the breach was observed.
    pub observed_at: DateTime<Utc>,
}

impl Alert {
    /// Build an alert from one breach finding.
    pub fn from_assessment(assessment: &RiskAssessment, account: &str) -> Self {
        Self {
            kind: assessment.rule.into(),
            account: account.to_string(),
            currency: assessment.currency.clone(),
            message: assessment.message.clone(),
            current_value: assessment.current_value,
            threshold: assessment.threshold,
            remediation: assessment.remediation,
            observed_at: Utc::now(),
        }
    }
}

/// Port for alert delivery.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Deliver one alert.
    async fn deliver(&self, alert: &Alert) -> Result<(), AlertError>;
}

/// Sink that emits alerts into the structured log stream.
#[derive(Debug, Default)]
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn deliver(&self, alert: &Alert) -> Result<(), AlertError> {
        warn!(
            kind = ?alert.kind,
            account = %alert.account,
            currency = %alert.currency,
            current_value = alert.current_value,
            threshold = alert.threshold,
            remediation = alert.remediation,
            "{}",
            alert.message
        );
        Ok(())
    }
}

/// Sink that POSTs the alert as JSON to a configured endpoint.
#[derive(Debug)]
pub struct WebhookAlertSink {
    http: reqwest::Client,
    url: String,
}

impl WebhookAlertSink {
    /// Create a webhook sink with a bounded request timeout.
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Result<Self, AlertError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AlertError::Config(e.to_string()))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl AlertSink for WebhookAlertSink {
    async fn deliver(&self, alert: &Alert) -> Result<(), AlertError> {
        let response = self
            .http
            .post(&self.url)
            .json(alert)
            .send()
            .await
            .map_err(|e| AlertError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

/// Fan-out over the configured sinks.
///
/// Built once at startup from [`AlertsConfig`]; unknown method names are
/// warned about and skipped rather than failing the monitor.
pub struct AlertDispatcher {
    sinks: Vec<Box<dyn AlertSink>>,
    enabled: bool,
}

impl AlertDispatcher {
    /// Build the dispatcher from config.
    pub fn from_config(config: &AlertsConfig) -> Result<Self, AlertError> {
        let mut sinks: Vec<Box<dyn AlertSink>> = Vec::new();

        for method in &config.methods {
            match method.as_str() {
                "log" => sinks.push(Box::new(LogAlertSink)),
                "webhook" => {
                    if config.webhook.url.is_empty() {
                        return Err(AlertError::Config(
                            "alert method \"webhook\" requires a webhook url".to_string(),
                        ));
                    }
                    sinks.push(Box::new(WebhookAlertSink::new(
                        config.webhook.url.clone(),
                        config.webhook.timeout_secs,
                    )?));
                }
                other => {
                    warn!(method = %other, "ignoring unknown alert method");
                }
            }
        }

        Ok(Self {
            sinks,
            enabled: config.enabled,
        })
    }

    /// Build a dispatcher from explicit sinks.
    pub fn new(sinks: Vec<Box<dyn AlertSink>>) -> Self {
        Self {
            sinks,
            enabled: true,
        }
    }

    /// Number of configured sinks.
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Deliver one alert to every sink.
    ///
    /// Each sink gets its own attempt; a failing sink is logged and the
    /// rest still run.
    pub async fn dispatch(&self, alert: &Alert) {
        if !self.enabled {
            return;
        }
        for sink in &self.sinks {
            if let Err(e) = sink.deliver(alert).await {
                error!(error = %e, kind = ?alert.kind, "alert delivery failed");
            }
        }
    }
}
