//! Wire types for the Deribit REST API.
//!
//! One strongly-typed result struct per endpoint; everything arrives inside
//! the shared `{result, error}` envelope.

use serde::Deserialize;

/// Shared response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    pub result: Option<T>,
    pub error: Option<ApiErrorBody>,
}

/// API-level error payload inside an otherwise-200 response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Error message.
    pub message: String,
    /// Numeric error code.
    pub code: i64,
}

/// Result of the `/public/auth` credential exchange.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AuthResult {
    pub access_token: String,
    pub expires_in: u64,
}

/// Per-currency account summary.
///
/// Returned both by `/private/get_account_summary` (single currency) and as
/// the elements of `/private/get_account_summaries`. The `*_usd` fields are
/// only populated in the multi-currency form; identity and limit fields
/// requested via `extended=true` are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountSummary {
    /// Currency of this summary (e.g. "ETH").
    pub currency: String,
    /// Account equity in native units.
    pub equity: f64,
    /// Margin balance in native units.
    pub margin_balance: f64,
    /// Maintenance margin in native units.
    pub maintenance_margin: f64,
    /// Initial margin in native units.
    #[serde(default)]
    pub initial_margin: f64,
    /// Equity normalized to USD (multi-currency form only).
    #[serde(default)]
    pub equity_usd: f64,
    /// Maintenance margin normalized to USD (multi-currency form only).
    #[serde(default)]
    pub maintenance_margin_usd: f64,
}

/// Multi-currency account snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountSummaries {
    /// One summary per wallet currency.
    pub summaries: Vec<AccountSummary>,
}

impl AccountSummaries {
    /// Account-wide equity in USD.
    pub fn total_equity_usd(&self) -> f64 {
        self.summaries.iter().map(|s| s.equity_usd).sum()
    }

    /// Account-wide maintenance margin in USD.
    pub fn total_maintenance_margin_usd(&self) -> f64 {
        self.summaries.iter().map(|s| s.maintenance_margin_usd).sum()
    }

    /// The summary for a specific currency, if present.
    pub fn summary_for(&self, currency: &str) -> Option<&AccountSummary> {
        self.summaries
            .iter()
            .find(|s| s.currency.eq_ignore_ascii_case(currency))
    }
}

/// Result of `/public/get_index_price`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct IndexPriceResult {
    pub index_price: f64,
}

/// An open position from `/private/get_positions`.
#[derive(Debug, Clone, Deserialize)]
pub struct Position {
    /// Instrument identifier (e.g. "ETH-PERPETUAL").
    pub instrument_name: String,
    /// Position size (contract units, signed by direction on some markets).
    pub size: f64,
    /// Instrument kind ("future", "option").
    #[serde(default)]
    pub kind: String,
    /// Position direction ("buy" | "sell" | "zero").
    #[serde(default)]
    pub direction: String,
    /// Current mark price.
    #[serde(default)]
    pub mark_price: f64,
}
