//! Observability module for metrics and logging.
//!
//! Prometheus gauge export for account figures and tracing-based
//! structured logging.

mod metrics;
mod tracing;

pub use metrics::{
    CycleMetrics, MetricsError, MetricsSink, NoopMetricsSink, PrometheusMetricsSink, init_metrics,
};
pub use tracing::{TracingError, init_tracing};
