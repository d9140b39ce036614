//! Readiness gating against a mock service through the real HTTP probe

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ledgerx_engine::{BackendState, NoticeKind, READY_MESSAGE, ReadinessTimings};

use crate::common::{Harness, fast_timings, mount_health_ok};

#[tokio::test]
async fn sleeping_backend_becomes_ready_after_retries() {
    let server = MockServer::start().await;
    let attempts = Arc::new(AtomicU32::new(0));
    let attempts_clone = attempts.clone();

    Mock::given(method("GET"))
        .and(path("/api/v1/health"))
        .respond_with(move |_: &wiremock::Request| {
            match attempts_clone.fetch_add(1, Ordering::SeqCst) {
                0 => ResponseTemplate::new(503),
                1 => ResponseTemplate::new(200).set_body_json(json!({"status": "STARTING"})),
                _ => ResponseTemplate::new(200).set_body_json(json!({"status": "OK"})),
            }
        })
        .mount(&server)
        .await;

    let timings = ReadinessTimings {
        ready_flash: Duration::from_secs(5),
        ..fast_timings()
    };
    let harness = Harness::with_timings(&server, timings);
    let waiters: Vec<_> = (0..3)
        .map(|_| {
            let readiness = harness.readiness.clone();
            tokio::spawn(async move { readiness.ensure_ready().await })
        })
        .collect();

    for waiter in waiters {
        assert_eq!(waiter.await.unwrap(), Ok(()));
    }
    assert_eq!(harness.readiness.current_state(), BackendState::Ready);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(harness.readiness.probe_loops_started(), 1);

    let notice = harness.readiness.current_notice().unwrap();
    assert_eq!(notice.kind, NoticeKind::Ready);
    assert_eq!(notice.message, READY_MESSAGE);
}

#[tokio::test]
async fn ready_backend_is_probed_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(&server);
    harness.readiness.start();
    for _ in 0..5 {
        harness.readiness.ensure_ready().await.unwrap();
    }
}

#[tokio::test]
async fn unreachable_backend_fails_with_last_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let harness = Harness::new(&server);
    let err = harness.readiness.ensure_ready().await.unwrap_err();
    assert!(err.message().starts_with("Backend is still unavailable after waiting up to 400 ms."));
    assert!(err.message().ends_with("Last error: Request failed with HTTP 503."));
    assert_eq!(harness.readiness.current_state(), BackendState::Error);

    let probes_before = server.received_requests().await.unwrap().len();
    assert_eq!(harness.readiness.ensure_ready().await.unwrap_err(), err);
    let probes_after = server.received_requests().await.unwrap().len();
    assert_eq!(probes_before, probes_after);
}

#[tokio::test]
async fn hanging_health_check_is_bounded_by_attempt_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "ok"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let timings = ReadinessTimings {
        attempt_timeout: Duration::from_millis(50),
        ..fast_timings()
    };
    let harness = Harness::with_timings(&server, timings);

    let started = std::time::Instant::now();
    let err = harness.readiness.ensure_ready().await.unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(err.message().contains("did not respond in time"));
}

#[tokio::test]
async fn shutdown_releases_waiters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let timings = ReadinessTimings {
        max_wait: Duration::from_secs(60),
        ..fast_timings()
    };
    let harness = Harness::with_timings(&server, timings);
    let waiter = {
        let readiness = harness.readiness.clone();
        tokio::spawn(async move { readiness.ensure_ready().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    harness.readiness.shutdown();
    let err = waiter.await.unwrap().unwrap_err();
    assert_eq!(err.message(), "Backend unavailable. Please try again later.");
}

#[tokio::test]
async fn healthy_backend_gates_actions_without_notice_churn() {
    let server = MockServer::start().await;
    mount_health_ok(&server).await;

    let harness = Harness::new(&server);
    let mut states = harness.readiness.states();
    harness.readiness.start();
    states
        .wait_for(|state| *state == BackendState::Ready)
        .await
        .unwrap();
    assert_eq!(harness.readiness.current_notice(), None);
}
