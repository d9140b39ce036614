//! Scripted collaborators shared by the engine's unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ledgerx_client::classify::{NETWORK_MESSAGE, TIMEOUT_MESSAGE};
use ledgerx_client::{HealthProbe, HealthStatus, LedgerClient, ProbeFut};
use ledgerx_types::{ApiError, ApiErrorCode, ResponseBody};
use wiremock::MockServer;

use crate::readiness::{ReadinessCoordinator, ReadinessTimings};

#[derive(Debug, Clone, Copy)]
pub(crate) enum ProbeStep {
    Healthy,
    Status(&'static str),
    Unreachable,
    /// Hangs for the full attempt timeout, then fails.
    TimesOut,
    /// Never resolves, ignoring the timeout it was given.
    Hangs,
    Panics,
}

pub(crate) struct ScriptedProbe {
    script: Mutex<VecDeque<ProbeStep>>,
    fallback: ProbeStep,
    calls: AtomicUsize,
}

impl ScriptedProbe {
    pub(crate) fn always(step: ProbeStep) -> Arc<Self> {
        Self::scripted([], step)
    }

    pub(crate) fn scripted(
        steps: impl IntoIterator<Item = ProbeStep>,
        fallback: ProbeStep,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into_iter().collect()),
            fallback,
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HealthProbe for ScriptedProbe {
    fn probe(&self, timeout: Duration) -> ProbeFut<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);
        Box::pin(async move {
            match step {
                ProbeStep::Healthy => Ok(HealthStatus::new("ok")),
                ProbeStep::Status(status) => Ok(HealthStatus::new(status)),
                ProbeStep::Unreachable => Err(ApiError::new(
                    ApiErrorCode::NetworkError,
                    None,
                    NETWORK_MESSAGE,
                    ResponseBody::Empty,
                )),
                ProbeStep::Hangs => std::future::pending().await,
                ProbeStep::Panics => panic!("health probe exploded"),
                ProbeStep::TimesOut => {
                    tokio::time::sleep(timeout).await;
                    Err(ApiError::new(
                        ApiErrorCode::NetworkError,
                        None,
                        TIMEOUT_MESSAGE,
                        ResponseBody::Empty,
                    ))
                }
            }
        })
    }
}

/// Timings short enough for real-clock tests against a mock server.
pub(crate) fn quick_timings() -> ReadinessTimings {
    ReadinessTimings {
        attempt_timeout: Duration::from_millis(20),
        retry_interval: Duration::from_millis(10),
        max_wait: Duration::from_millis(50),
        ready_flash: Duration::from_millis(20),
    }
}

pub(crate) fn ready_coordinator() -> ReadinessCoordinator {
    ReadinessCoordinator::new(ScriptedProbe::always(ProbeStep::Healthy), quick_timings())
}

pub(crate) fn down_coordinator() -> (ReadinessCoordinator, Arc<ScriptedProbe>) {
    let probe = ScriptedProbe::always(ProbeStep::Unreachable);
    (
        ReadinessCoordinator::new(probe.clone(), quick_timings()),
        probe,
    )
}

pub(crate) fn client_for(server: &MockServer) -> LedgerClient {
    LedgerClient::from_base_url(&server.uri()).unwrap()
}

pub(crate) fn account_json(number: &str, balance: f64) -> serde_json::Value {
    serde_json::json!({
        "id": format!("id-{number}"),
        "accountNumber": number,
        "balance": balance,
        "currency": "USD"
    })
}

pub(crate) fn transaction_json(id: &str, status: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "idempotencyKey": format!("key-{id}"),
        "status": status,
        "createdAt": "2025-01-15T10:30:00Z",
        "fromAccount": "ACC-A-001",
        "toAccount": "ACC-B-001",
        "amount": 1.0,
        "currency": "USD"
    })
}
