//! Monitor End-to-End Tests
//!
//! Runs the poll loop against a mock Deribit API with the real HTTP client,
//! checking that a breached account produces alerts and that a healthy one
//! stays quiet.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use margin_monitor::alert::{Alert, AlertDispatcher, AlertError, AlertKind, AlertSink};
use margin_monitor::config::{AuthScheme, ExchangeConfig, MonitorConfig};
use margin_monitor::deribit::DeribitClient;
use margin_monitor::monitor::MonitorService;
use margin_monitor::observability::NoopMetricsSink;

struct CapturingSink {
    count: Arc<AtomicUsize>,
    last_kind: Arc<std::sync::Mutex<Option<AlertKind>>>,
}

#[async_trait]
impl AlertSink for CapturingSink {
    async fn deliver(&self, alert: &Alert) -> Result<(), AlertError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        *self.last_kind.lock().unwrap() = Some(alert.kind);
        Ok(())
    }
}

fn exchange_config(server: &MockServer) -> ExchangeConfig {
    ExchangeConfig {
        api_key: "test-key".to_string(),
        api_secret: "test-secret".to_string(),
        testnet: false,
        auth_scheme: AuthScheme::Hmac,
        timeout_secs: 5,
        base_url: Some(server.uri()),
    }
}

async fn mount_account(server: &MockServer, equity: f64, maintenance_margin: f64) {
    Mock::given(method("GET"))
        .and(path("/private/get_account_summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": {
                "currency": "ETH",
                "equity": equity,
                "margin_balance": equity,
                "maintenance_margin": maintenance_margin
            }
        })))
        .mount(server)
        .await;
}

async fn mount_index_price(server: &MockServer, price: f64) {
    Mock::given(method("GET"))
        .and(path("/public/get_index_price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": {"index_price": price}
        })))
        .mount(server)
        .await;
}

/// Run the monitor long enough for at least one cycle, then cancel it.
async fn run_briefly(
    service: &MonitorService<DeribitClient, NoopMetricsSink>,
) -> Result<(), margin_monitor::monitor::MonitorError> {
    let shutdown = CancellationToken::new();
    let canceller = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        canceller.cancel();
    });
    service.run(shutdown).await
}

#[tokio::test]
async fn breached_account_produces_margin_alert() {
    let server = MockServer::start().await;
    // Ratio 13.3 / 23.3 = 0.57 over the 0.5 threshold.
    mount_account(&server, 23.3, 13.3).await;
    mount_index_price(&server, 3000.0).await;

    let count = Arc::new(AtomicUsize::new(0));
    let last_kind = Arc::new(std::sync::Mutex::new(None));
    let dispatcher = AlertDispatcher::new(vec![Box::new(CapturingSink {
        count: Arc::clone(&count),
        last_kind: Arc::clone(&last_kind),
    })]);

    let client = DeribitClient::new(&exchange_config(&server)).unwrap();
    let config = MonitorConfig {
        interval_seconds: 1,
        ..MonitorConfig::default()
    };
    let service = MonitorService::new(client, dispatcher, NoopMetricsSink, config);

    run_briefly(&service).await.unwrap();

    assert!(count.load(Ordering::SeqCst) >= 1);
    assert_eq!(
        *last_kind.lock().unwrap(),
        Some(AlertKind::MaintenanceMargin)
    );
}

#[tokio::test]
async fn healthy_account_stays_quiet() {
    let server = MockServer::start().await;
    mount_account(&server, 100.0, 10.0).await;
    mount_index_price(&server, 3000.0).await;

    let count = Arc::new(AtomicUsize::new(0));
    let dispatcher = AlertDispatcher::new(vec![Box::new(CapturingSink {
        count: Arc::clone(&count),
        last_kind: Arc::new(std::sync::Mutex::new(None)),
    })]);

    let client = DeribitClient::new(&exchange_config(&server)).unwrap();
    let config = MonitorConfig {
        interval_seconds: 1,
        ..MonitorConfig::default()
    };
    let service = MonitorService::new(client, dispatcher, NoopMetricsSink, config);

    run_briefly(&service).await.unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn index_price_outage_falls_back_and_still_alerts() {
    let server = MockServer::start().await;
    // Deeply negative equity; the floor rule works off the fallback price
    // when the index endpoint is down. -300 * 3000 = -900000 < -700000.
    mount_account(&server, -300.0, 0.0).await;
    Mock::given(method("GET"))
        .and(path("/public/get_index_price"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .mount(&server)
        .await;

    let count = Arc::new(AtomicUsize::new(0));
    let last_kind = Arc::new(std::sync::Mutex::new(None));
    let dispatcher = AlertDispatcher::new(vec![Box::new(CapturingSink {
        count: Arc::clone(&count),
        last_kind: Arc::clone(&last_kind),
    })]);

    let client = DeribitClient::new(&exchange_config(&server)).unwrap();
    let config = MonitorConfig {
        interval_seconds: 1,
        ..MonitorConfig::default()
    };
    let service = MonitorService::new(client, dispatcher, NoopMetricsSink, config);

    run_briefly(&service).await.unwrap();

    assert!(count.load(Ordering::SeqCst) >= 1);
    assert_eq!(*last_kind.lock().unwrap(), Some(AlertKind::EquityFloor));
}

#[tokio::test]
async fn account_outage_does_not_kill_the_loop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/private/get_account_summary"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    mount_index_price(&server, 3000.0).await;

    let dispatcher = AlertDispatcher::new(vec![]);
    let client = DeribitClient::new(&exchange_config(&server)).unwrap();
    let config = MonitorConfig {
        interval_seconds: 1,
        ..MonitorConfig::default()
    };
    let service = MonitorService::new(client, dispatcher, NoopMetricsSink, config);

    // Cycles fail but run() still exits cleanly on cancellation.
    run_briefly(&service).await.unwrap();

    let summary_calls = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/private/get_account_summary")
        .count();
    assert!(summary_calls >= 1);
}
