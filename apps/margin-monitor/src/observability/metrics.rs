//! Prometheus metrics for the margin monitor.
//!
//! One gauge family per account figure, labelled by currency and account,
//! refreshed on every successful poll cycle.

use std::net::SocketAddr;

use metrics::gauge;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::config::MetricsConfig;

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// The configured listen address could not be parsed.
    #[error("invalid metrics listen address '{0}'")]
    InvalidAddress(String),
    /// Failed to install the metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

/// Initialize the Prometheus metrics exporter.
///
/// Starts an HTTP server exposing `/metrics` on the configured address.
/// A no-op when metrics are disabled in config.
///
/// # Errors
///
/// Returns an error if the listen address is invalid or the exporter
/// fails to start (e.g. port already in use).
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        tracing::info!("metrics exporter disabled");
        return Ok(());
    }

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .map_err(|_| MetricsError::InvalidAddress(config.listen_addr.clone()))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(addr = %addr, "Prometheus metrics exporter started");
    Ok(())
}

/// Account figures exported after one poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleMetrics {
    /// Monitored currency label.
    pub currency: String,
    /// Equity in native units.
    pub equity: f64,
    /// Margin balance in native units.
    pub margin_balance: f64,
    /// Maintenance margin in native units.
    pub maintenance_margin: f64,
    /// Monitored currency's equity valued in USD.
    pub equity_usd: f64,
    /// Account-wide equity in USD.
    pub total_equity_usd: f64,
    /// Maintenance-margin ratio; `None` when the denominator was zero.
    pub ratio: Option<f64>,
    /// Index price used for USD conversion this cycle.
    pub index_price_usd: f64,
    /// Suggested native-unit top-up from the ratio rule (zero when silent).
    pub required_remediation: f64,
    /// Number of breach findings this cycle.
    pub breach_count: usize,
    /// When the snapshot was collected.
    pub collected_at: chrono::DateTime<chrono::Utc>,
}

/// Port for per-cycle metrics export.
pub trait MetricsSink: Send + Sync {
    /// Record one cycle's figures.
    fn record_cycle(&self, cycle: &CycleMetrics);
}

impl<T: MetricsSink + ?Sized> MetricsSink for std::sync::Arc<T> {
    fn record_cycle(&self, cycle: &CycleMetrics) {
        (**self).record_cycle(cycle);
    }
}

/// Sink that sets the `deribit_*` Prometheus gauges.
#[derive(Debug)]
pub struct PrometheusMetricsSink {
    account: String,
}

impl PrometheusMetricsSink {
    /// Create a sink labelling every gauge with the account name.
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }
}

impl MetricsSink for PrometheusMetricsSink {
    fn record_cycle(&self, cycle: &CycleMetrics) {
        let labels = [
            ("currency", cycle.currency.clone()),
            ("account", self.account.clone()),
        ];

        gauge!("deribit_equity", &labels).set(cycle.equity);
        gauge!("deribit_margin_balance", &labels).set(cycle.margin_balance);
        gauge!("deribit_maintenance_margin", &labels).set(cycle.maintenance_margin);
        gauge!("deribit_equity_usd", &labels).set(cycle.equity_usd);
        gauge!("deribit_total_equity", &labels).set(cycle.total_equity_usd);
        gauge!("deribit_index_price_usd", &labels).set(cycle.index_price_usd);
        gauge!("deribit_required_remediation", &labels).set(cycle.required_remediation);
        #[allow(clippy::cast_precision_loss)]
        gauge!("deribit_collection_timestamp", &labels)
            .set(cycle.collected_at.timestamp() as f64);

        // An undefined ratio keeps the previous sample out of the scrape
        // rather than exporting NaN.
        if let Some(ratio) = cycle.ratio {
            gauge!("deribit_maintenance_margin_ratio", &labels).set(ratio);
        }
    }
}

/// Sink that discards every sample.
#[derive(Debug, Default)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn record_cycle(&self, _cycle: &CycleMetrics) {}
}
