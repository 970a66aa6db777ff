//! Poll loop and risk threshold configuration.

use serde::{Deserialize, Serialize};

use crate::risk::DenominatorSource;

/// Monitor configuration: poll cadence, account identity, and thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Poll interval in seconds. Non-positive values are coerced to the
    /// default at runtime rather than rejected.
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: i64,
    /// Account label attached to alerts and metrics.
    #[serde(default = "default_account")]
    pub account: String,
    /// Monitored currency (e.g. "ETH").
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Source of the maintenance-margin ratio's numerator/denominator.
    #[serde(default)]
    pub denominator: DenominatorSource,
    /// Maintenance-margin ratio above which the ratio rule fires.
    #[serde(default = "default_mm_threshold")]
    pub mm_threshold: f64,
    /// Target ratio the remediation amount is solved for.
    #[serde(default = "default_mm_target")]
    pub mm_target: f64,
    /// USD equity floor (negative) below which the equity rule fires.
    #[serde(default = "default_equity_floor_usd")]
    pub equity_floor_usd: f64,
    /// Native-unit equity buffer the equity rule proposes lifting to.
    #[serde(default = "default_equity_target")]
    pub equity_target: f64,
    /// Price substituted when the index price fetch fails.
    #[serde(default = "default_fallback_price_usd")]
    pub fallback_price_usd: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval_seconds(),
            account: default_account(),
            currency: default_currency(),
            denominator: DenominatorSource::default(),
            mm_threshold: default_mm_threshold(),
            mm_target: default_mm_target(),
            equity_floor_usd: default_equity_floor_usd(),
            equity_target: default_equity_target(),
            fallback_price_usd: default_fallback_price_usd(),
        }
    }
}

fn default_interval_seconds() -> i64 {
    30
}

fn default_account() -> String {
    "default".to_string()
}

fn default_currency() -> String {
    "ETH".to_string()
}

fn default_mm_threshold() -> f64 {
    0.5
}

fn default_mm_target() -> f64 {
    0.3
}

fn default_equity_floor_usd() -> f64 {
    -700_000.0
}

fn default_equity_target() -> f64 {
    200.0
}

fn default_fallback_price_usd() -> f64 {
    3000.0
}
