// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::default_trait_access
    )
)]

//! Margin Monitor - Rust Core Library
//!
//! Continuous account-margin monitoring for Deribit accounts.
//!
//! # Architecture
//!
//! - **config**: YAML configuration with env interpolation and validation
//! - **deribit**: Signed REST client and the `MarginDataSource` port
//! - **risk**: Pure threshold evaluation over one margin snapshot
//! - **monitor**: The poll loop tying fetch, evaluate, alert, and export together
//! - **alert**: Log and webhook delivery behind the `AlertSink` port
//! - **observability**: Prometheus gauges and structured logging

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Alert construction and delivery.
pub mod alert;

/// Configuration loading and validation.
pub mod config;

/// Deribit REST integration.
pub mod deribit;

/// Poll loop scheduler.
pub mod monitor;

/// Metrics export and logging setup.
pub mod observability;

/// Pure risk evaluation.
pub mod risk;

pub use alert::{Alert, AlertDispatcher, AlertError, AlertKind, AlertSink};
pub use config::{Config, ConfigError, load_config, load_config_from_string};
pub use deribit::{DeribitClient, DeribitError, MarginDataSource};
pub use monitor::{MonitorError, MonitorService};
pub use observability::{
    CycleMetrics, MetricsSink, NoopMetricsSink, PrometheusMetricsSink, init_metrics, init_tracing,
};
pub use risk::{DenominatorSource, Evaluation, MarginSnapshot, RiskThresholds, evaluate};
