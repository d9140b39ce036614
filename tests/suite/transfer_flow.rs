//! Transfers, stress batches and dashboard refresh end to end

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ledgerx_engine::{ActionError, FlashDirection, WalletKey};
use ledgerx_types::ApiErrorCode;

use crate::common::{
    ACCOUNT_A, ACCOUNT_B, Harness, account_json, mount_account, mount_empty_feed, mount_health_ok,
    transaction_json,
};

#[tokio::test]
async fn stress_batch_counts_contention_and_refreshes_dashboard() {
    let server = MockServer::start().await;
    mount_health_ok(&server).await;
    mount_account(&server, ACCOUNT_A, 997.0).await;
    mount_account(&server, ACCOUNT_B, 503.0).await;
    mount_empty_feed(&server).await;

    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = counter.clone();
    let keys: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let keys_clone = keys.clone();
    Mock::given(method("POST"))
        .and(path("/api/v1/transfers"))
        .and(header_exists("Idempotency-Key"))
        .respond_with(move |req: &wiremock::Request| {
            let key = req
                .headers
                .get("Idempotency-Key")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            keys_clone.lock().unwrap().push(key);
            match counter_clone.fetch_add(1, Ordering::SeqCst) {
                0 | 4 => ResponseTemplate::new(409)
                    .set_body_json(json!({"status": 409, "message": "Duplicate request"})),
                7 => ResponseTemplate::new(422).set_body_json(json!({"status": 422})),
                9 => ResponseTemplate::new(500),
                n => ResponseTemplate::new(200)
                    .set_body_json(transaction_json(&format!("t-{n}"), "COMPLETED")),
            }
        })
        .expect(10)
        .mount(&server)
        .await;

    let harness = Harness::new(&server);
    let summary = harness.desk.stress_test(10).await.unwrap();

    assert_eq!(summary.requested, 10);
    assert_eq!(summary.succeeded, 6);
    assert_eq!(summary.conflicts, 2);
    assert_eq!(summary.insufficient_funds, 1);
    assert_eq!(summary.other_errors, 1);
    assert!(summary.describe().starts_with("6/10 succeeded in "));
    assert!(summary.describe().ends_with("2 conflicts, 1 insufficient funds, 1 other errors."));

    let mut keys = keys.lock().unwrap().clone();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), 10, "every submission needs its own idempotency key");

    let snapshot = harness.dashboard.snapshot();
    assert!(!snapshot.initial_loading);
    assert_eq!(
        snapshot.wallet(WalletKey::A).account.as_ref().map(|a| a.balance),
        Some(997.0)
    );
}

#[tokio::test]
async fn manual_transfer_flashes_changed_balances() {
    let server = MockServer::start().await;
    mount_health_ok(&server).await;
    mount_empty_feed(&server).await;

    let polls = Arc::new(AtomicU32::new(0));
    let polls_clone = polls.clone();
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/accounts/{ACCOUNT_A}")))
        .respond_with(move |_: &wiremock::Request| {
            let balance = if polls_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                1000.0
            } else {
                975.0
            };
            ResponseTemplate::new(200).set_body_json(account_json(ACCOUNT_A, balance))
        })
        .mount(&server)
        .await;
    mount_account(&server, ACCOUNT_B, 500.0).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/transfers"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(transaction_json("9f8e7d6c-5b4a", "COMPLETED")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(&server);
    harness.dashboard.refresh().await;

    let transaction = harness.desk.manual_transfer("25").await.unwrap();
    assert_eq!(transaction.short_id(), "9f8e7d6c");

    let snapshot = harness.dashboard.snapshot();
    assert_eq!(snapshot.wallet(WalletKey::A).flash, Some(FlashDirection::Down));
    assert_eq!(snapshot.wallet(WalletKey::B).flash, None);
}

#[tokio::test]
async fn insufficient_funds_keeps_backend_message() {
    let server = MockServer::start().await;
    mount_health_ok(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/transfers"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "timestamp": "2025-01-15T10:30:00",
            "status": 422,
            "error": "Unprocessable Entity",
            "message": "Insufficient funds in account ACC-A-001"
        })))
        .mount(&server)
        .await;

    let harness = Harness::new(&server);
    let err = harness.desk.manual_transfer("5000").await.unwrap_err();
    assert_eq!(err.api_code(), Some(ApiErrorCode::InsufficientFunds));
    assert_eq!(err.title(), "Insufficient funds");
    assert_eq!(err.to_string(), "Insufficient funds in account ACC-A-001");
}

#[tokio::test]
async fn invalid_amount_skips_readiness_and_network() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let harness = Harness::new(&server);
    for input in ["0", "-1", "ten"] {
        assert!(matches!(
            harness.desk.manual_transfer(input).await,
            Err(ActionError::InvalidAmount(_))
        ));
    }
    assert_eq!(harness.readiness.probe_loops_started(), 0);
}

#[tokio::test]
async fn reset_then_browse_history() {
    let server = MockServer::start().await;
    mount_health_ok(&server).await;
    mount_account(&server, ACCOUNT_A, 1000.0).await;
    mount_account(&server, ACCOUNT_B, 500.0).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/demo/reset"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                transaction_json("t-1", "COMPLETED"),
                transaction_json("t-2", "FAILED"),
                transaction_json("t-3", "REVERSED")
            ],
            "number": 1,
            "size": 20,
            "totalPages": 3,
            "totalElements": 43,
            "first": false,
            "last": false
        })))
        .mount(&server)
        .await;

    let harness = Harness::new(&server);
    harness.desk.reset().await.unwrap();
    let snapshot = harness.dashboard.snapshot();
    assert_eq!(snapshot.transactions.len(), 1);

    let page = harness.dashboard.open_page(1).await.unwrap();
    assert_eq!(page.items.len(), 3);
    assert!(page.has_next());
    assert!(page.has_previous());
    assert_eq!(page.total_elements, 43);
}
