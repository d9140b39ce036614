//! Shared test utilities and fixtures
//!
//! A mock LedgerX service plus engine wiring with millisecond timings.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ledgerx_client::{ClientOptions, LedgerClient};
use ledgerx_engine::{
    Dashboard, DashboardOptions, DeskOptions, ReadinessCoordinator, ReadinessTimings,
    TransferDesk,
};
use ledgerx_types::AccountNumber;

pub const ACCOUNT_A: &str = "ACC-A-001";
pub const ACCOUNT_B: &str = "ACC-B-001";

pub fn fast_timings() -> ReadinessTimings {
    ReadinessTimings {
        attempt_timeout: Duration::from_millis(200),
        retry_interval: Duration::from_millis(40),
        max_wait: Duration::from_millis(400),
        ready_flash: Duration::from_millis(50),
    }
}

pub fn account_json(number: &str, balance: f64) -> serde_json::Value {
    json!({
        "id": format!("id-{number}"),
        "accountNumber": number,
        "balance": balance,
        "currency": "USD"
    })
}

pub fn transaction_json(id: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "idempotencyKey": format!("key-{id}"),
        "status": status,
        "createdAt": "2025-01-15T10:30:00Z",
        "fromAccount": ACCOUNT_A,
        "toAccount": ACCOUNT_B,
        "amount": 1.0,
        "currency": "USD"
    })
}

pub async fn mount_health_ok(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(server)
        .await;
}

pub async fn mount_account(server: &MockServer, number: &str, balance: f64) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/accounts/{number}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_json(number, balance)))
        .mount(server)
        .await;
}

pub async fn mount_empty_feed(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [],
            "number": 0,
            "size": 20,
            "totalPages": 0,
            "totalElements": 0
        })))
        .mount(server)
        .await;
}

/// Client, coordinator, dashboard and desk pointed at `server`.
pub struct Harness {
    pub client: LedgerClient,
    pub readiness: ReadinessCoordinator,
    pub dashboard: Dashboard,
    pub desk: TransferDesk,
}

impl Harness {
    pub fn new(server: &MockServer) -> Self {
        Self::with_timings(server, fast_timings())
    }

    pub fn with_timings(server: &MockServer, timings: ReadinessTimings) -> Self {
        let options = ClientOptions::new(server.uri().parse().unwrap());
        let client = LedgerClient::new(options).unwrap();
        let readiness = ReadinessCoordinator::new(Arc::new(client.clone()), timings);
        let a = AccountNumber::new(ACCOUNT_A).unwrap();
        let b = AccountNumber::new(ACCOUNT_B).unwrap();
        let dashboard = Dashboard::new(
            client.clone(),
            readiness.clone(),
            DashboardOptions {
                balance_flash: Duration::from_millis(100),
                ..DashboardOptions::new(a.clone(), b.clone())
            },
        );
        let desk = TransferDesk::new(client.clone(), readiness.clone(), DeskOptions::new(a, b))
            .with_dashboard(dashboard.clone());
        Self {
            client,
            readiness,
            dashboard,
            desk,
        }
    }
}
