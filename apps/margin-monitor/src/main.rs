//! Margin Monitor Binary
//!
//! Polls a Deribit account on a fixed interval, evaluates margin thresholds,
//! and fans out alerts and Prometheus gauges.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin margin-monitor -- [config.yaml]
//! ```
//!
//! # Environment Variables
//!
//! - `DERIBIT_API_KEY` / `DERIBIT_API_SECRET`: interpolated into the config
//!   file via `${VAR}` placeholders
//! - `RUST_LOG`: log filter override (default from config)

use tokio::signal;
use tokio_util::sync::CancellationToken;

use margin_monitor::alert::AlertDispatcher;
use margin_monitor::config::{Config, load_config};
use margin_monitor::deribit::DeribitClient;
use margin_monitor::monitor::MonitorService;
use margin_monitor::observability::{
    NoopMetricsSink, PrometheusMetricsSink, init_metrics, init_tracing,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_dotenv();

    let config_path = std::env::args().nth(1);
    let config = load_config(config_path.as_deref())?;
    init_tracing(&config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Deribit margin monitor"
    );
    log_config(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "margin monitor exited with error");
        return Err(e);
    }

    tracing::info!("margin monitor stopped");
    Ok(())
}

/// Wire the service together and run it until a shutdown signal.
async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    init_metrics(&config.metrics)?;

    let client = DeribitClient::new(&config.exchange)?;
    let alerts = AlertDispatcher::from_config(&config.alerts)?;

    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    if config.metrics.enabled {
        let metrics = PrometheusMetricsSink::new(config.monitor.account.clone());
        let service = MonitorService::new(client, alerts, metrics, config.monitor);
        service.run(shutdown).await?;
    } else {
        let service = MonitorService::new(client, alerts, NoopMetricsSink, config.monitor);
        service.run(shutdown).await?;
    }

    Ok(())
}

/// Log the effective configuration, credentials excluded.
fn log_config(config: &Config) {
    tracing::info!(
        base_url = %config.exchange.resolved_base_url(),
        auth_scheme = ?config.exchange.auth_scheme,
        account = %config.monitor.account,
        currency = %config.monitor.currency,
        interval_seconds = config.monitor.interval_seconds,
        denominator = ?config.monitor.denominator,
        mm_threshold = config.monitor.mm_threshold,
        mm_target = config.monitor.mm_target,
        equity_floor_usd = config.monitor.equity_floor_usd,
        alert_methods = ?config.alerts.methods,
        metrics_enabled = config.metrics.enabled,
        "Configuration loaded"
    );
}

/// Load .env from the current directory if present.
fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// Cancel the token on SIGINT or SIGTERM.
///
/// # Panics
///
/// Panics if signal handlers cannot be installed; a process that cannot
/// respond to termination signals should fail at startup instead.
#[allow(clippy::expect_used)]
fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("signal handler installation is critical for graceful shutdown");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("SIGTERM handler installation is critical for graceful shutdown")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => {
                tracing::info!("Received Ctrl+C, initiating shutdown");
            }
            () = terminate => {
                tracing::info!("Received SIGTERM, initiating shutdown");
            }
        }

        shutdown.cancel();
    });
}
