//! Value objects for risk evaluation.

use serde::{Deserialize, Serialize};

use crate::config::MonitorConfig;
use crate::deribit::{AccountSummaries, AccountSummary};

/// Source of the maintenance-margin ratio's numerator and denominator.
///
/// Deployments evolved between account-wide USD totals and raw
/// single-currency figures; both remain valid configurations of the same
/// rule, so the choice is explicit rather than implied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DenominatorSource {
    /// Raw maintenance margin / equity of the monitored currency.
    #[default]
    #[serde(rename = "single_currency")]
    SingleCurrencyNative,
    /// Account-wide USD-normalized maintenance margin / equity.
    #[serde(rename = "account_totals")]
    AccountTotalsUsd,
}

/// Account-margin state consumed by one evaluation cycle.
///
/// Immutable once built; never cached across cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct MarginSnapshot {
    /// Monitored currency.
    pub currency: String,
    /// Equity in native units.
    pub equity: f64,
    /// Margin balance in native units.
    pub margin_balance: f64,
    /// Maintenance margin in native units.
    pub maintenance_margin: f64,
    /// Account-wide equity in USD (multi-currency snapshots only).
    pub total_equity_usd: Option<f64>,
    /// Account-wide maintenance margin in USD (multi-currency snapshots only).
    pub total_maintenance_margin_usd: Option<f64>,
}

impl MarginSnapshot {
    /// Build from a single-currency account summary.
    pub fn from_summary(summary: &AccountSummary) -> Self {
        Self {
            currency: summary.currency.clone(),
            equity: summary.equity,
            margin_balance: summary.margin_balance,
            maintenance_margin: summary.maintenance_margin,
            total_equity_usd: None,
            total_maintenance_margin_usd: None,
        }
    }

    /// Build from a multi-currency snapshot, keeping the monitored
    /// currency's native figures alongside the account-wide USD totals.
    ///
    /// Returns `None` when the monitored currency has no summary.
    pub fn from_summaries(summaries: &AccountSummaries, currency: &str) -> Option<Self> {
        let summary = summaries.summary_for(currency)?;
        Some(Self {
            currency: summary.currency.clone(),
            equity: summary.equity,
            margin_balance: summary.margin_balance,
            maintenance_margin: summary.maintenance_margin,
            total_equity_usd: Some(summaries.total_equity_usd()),
            total_maintenance_margin_usd: Some(summaries.total_maintenance_margin_usd()),
        })
    }
}

/// Threshold configuration the evaluator runs against.
///
/// Static for the lifetime of the monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskThresholds {
    /// Ratio numerator/denominator source.
    pub denominator: DenominatorSource,
    /// Ratio above which the ratio rule fires.
    pub mm_threshold: f64,
    /// Target ratio the remediation amount is solved for.
    pub mm_target: f64,
    /// Negative USD floor for the equity rule.
    pub equity_floor_usd: f64,
    /// Native-unit buffer the equity rule lifts to.
    pub equity_target: f64,
}

impl From<&MonitorConfig> for RiskThresholds {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            denominator: config.denominator,
            mm_threshold: config.mm_threshold,
            mm_target: config.mm_target,
            equity_floor_usd: config.equity_floor_usd,
            equity_target: config.equity_target,
        }
    }
}

/// The two independent breach rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Maintenance-margin ratio exceeded its threshold.
    MaintenanceMarginRatio,
    /// USD-valued equity fell below the configured floor.
    EquityFloor,
}

/// Outcome of the ratio computation.
///
/// A zero denominator is a distinct, reportable condition; it never
/// becomes NaN or infinity and never triggers the ratio rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RatioOutcome {
    /// Ratio computed from a non-zero denominator.
    Defined(f64),
    /// Denominator was zero; the ratio rule is skipped this cycle.
    Undefined,
}

impl RatioOutcome {
    /// The ratio value, if defined.
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Defined(v) => Some(v),
            Self::Undefined => None,
        }
    }
}

/// A single breach finding for one rule in one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    /// Which rule fired.
    pub rule: RuleKind,
    /// Monitored currency.
    pub currency: String,
    /// Human-readable description with the remediation suggestion.
    pub message: String,
    /// The value compared against the threshold.
    pub current_value: f64,
    /// The configured threshold that was breached.
    pub threshold: f64,
    /// Suggested amount of the monitored asset to add.
    pub remediation: f64,
}

/// Full result of one evaluation cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Maintenance-margin ratio outcome.
    pub ratio: RatioOutcome,
    /// Monitored currency's equity valued in USD at the cycle price.
    pub equity_usd: f64,
    /// Ratio-rule remediation amount (zero when the rule is silent).
    pub required_remediation: f64,
    /// Zero, one, or two breach findings.
    pub assessments: Vec<RiskAssessment>,
}
