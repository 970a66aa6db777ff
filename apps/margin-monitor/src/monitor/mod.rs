//! Poll loop scheduler.
//!
//! Drives the fetch, evaluate, alert, and export steps on a fixed interval
//! until cancelled. One failed cycle is logged and skipped; the next tick
//! starts from scratch. Authentication is only fatal at startup.

use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::alert::{Alert, AlertDispatcher};
use crate::config::MonitorConfig;
use crate::deribit::{DeribitError, MarginDataSource};
use crate::observability::{CycleMetrics, MetricsSink};
use crate::risk::{DenominatorSource, MarginSnapshot, RiskThresholds, evaluate};

/// Fallback poll interval when the configured one is unusable.
const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Monitor service errors.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The startup authentication attempt failed.
    #[error("startup authentication failed: {0}")]
    StartupAuth(DeribitError),

    /// An exchange call failed during a cycle.
    #[error("exchange error: {0}")]
    Exchange(#[from] DeribitError),

    /// The monitored currency is absent from the account snapshot.
    #[error("currency {0} missing from account snapshot")]
    MissingCurrency(String),
}

/// The account-margin poll loop.
///
/// Generic over its data source and metrics sink so cycles can run against
/// stubs in tests; alert fan-out goes through the [`AlertDispatcher`].
pub struct MonitorService<S, M>
where
    S: MarginDataSource,
    M: MetricsSink,
{
    source: S,
    alerts: AlertDispatcher,
    metrics: M,
    config: MonitorConfig,
    thresholds: RiskThresholds,
}

impl<S, M> MonitorService<S, M>
where
    S: MarginDataSource,
    M: MetricsSink,
{
    /// Create the service from config and its ports.
    pub fn new(source: S, alerts: AlertDispatcher, metrics: M, config: MonitorConfig) -> Self {
        let thresholds = RiskThresholds::from(&config);
        Self {
            source,
            alerts,
            metrics,
            config,
            thresholds,
        }
    }

    /// Run the poll loop until the token is cancelled.
    ///
    /// Authenticates once up front; a failure here is fatal so operators
    /// see bad credentials immediately rather than a silent retry loop.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), MonitorError> {
        self.source
            .authenticate()
            .await
            .map_err(MonitorError::StartupAuth)?;

        let interval = self.effective_interval();
        info!(
            interval_secs = interval.as_secs(),
            currency = %self.config.currency,
            account = %self.config.account,
            "margin monitor started"
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    info!("margin monitor shutting down");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.run_cycle().await {
                        error!(error = %e, "poll cycle failed; retrying next tick");
                    }
                }
            }
        }
    }

    /// The poll interval, with unusable config values coerced to a default.
    fn effective_interval(&self) -> Duration {
        let secs = self.config.interval_seconds;
        if secs <= 0 {
            warn!(
                configured = secs,
                fallback_secs = DEFAULT_INTERVAL.as_secs(),
                "non-positive poll interval; using fallback"
            );
            return DEFAULT_INTERVAL;
        }
        Duration::from_secs(secs.unsigned_abs())
    }

    /// One fetch, evaluate, alert, export pass.
    async fn run_cycle(&self) -> Result<(), MonitorError> {
        let snapshot = self.fetch_snapshot().await?;
        let price = self.fetch_price().await;

        let evaluation = evaluate(&snapshot, price, &self.thresholds);
        debug!(
            currency = %snapshot.currency,
            equity = snapshot.equity,
            maintenance_margin = snapshot.maintenance_margin,
            ratio = ?evaluation.ratio,
            breaches = evaluation.assessments.len(),
            "cycle evaluated"
        );

        for assessment in &evaluation.assessments {
            let alert = Alert::from_assessment(assessment, &self.config.account);
            self.alerts.dispatch(&alert).await;
        }

        self.metrics.record_cycle(&CycleMetrics {
            currency: snapshot.currency.clone(),
            equity: snapshot.equity,
            margin_balance: snapshot.margin_balance,
            maintenance_margin: snapshot.maintenance_margin,
            equity_usd: evaluation.equity_usd,
            total_equity_usd: snapshot.total_equity_usd.unwrap_or(evaluation.equity_usd),
            ratio: evaluation.ratio.value(),
            index_price_usd: price,
            required_remediation: evaluation.required_remediation,
            breach_count: evaluation.assessments.len(),
            collected_at: chrono::Utc::now(),
        });

        Ok(())
    }

    /// Fetch the margin snapshot for the configured denominator mode.
    async fn fetch_snapshot(&self) -> Result<MarginSnapshot, MonitorError> {
        match self.thresholds.denominator {
            DenominatorSource::SingleCurrencyNative => {
                let summary = self.source.account_summary(&self.config.currency).await?;
                Ok(MarginSnapshot::from_summary(&summary))
            }
            DenominatorSource::AccountTotalsUsd => {
                let summaries = self.source.account_summaries(true).await?;
                MarginSnapshot::from_summaries(&summaries, &self.config.currency)
                    .ok_or_else(|| MonitorError::MissingCurrency(self.config.currency.clone()))
            }
        }
    }

    /// Fetch the index price, falling back to the configured static price.
    ///
    /// A price failure never fails the cycle; the account figures are still
    /// worth evaluating against a stale but sane conversion rate.
    async fn fetch_price(&self) -> f64 {
        let index_name = format!("{}_usd", self.config.currency.to_lowercase());
        match self.source.index_price(&index_name).await {
            Ok(price) if price > 0.0 => price,
            Ok(price) => {
                warn!(
                    index = %index_name,
                    price,
                    fallback = self.config.fallback_price_usd,
                    "non-positive index price; using fallback"
                );
                self.config.fallback_price_usd
            }
            Err(e) => {
                warn!(
                    index = %index_name,
                    error = %e,
                    fallback = self.config.fallback_price_usd,
                    "index price fetch failed; using fallback"
                );
                self.config.fallback_price_usd
            }
        }
    }
}
