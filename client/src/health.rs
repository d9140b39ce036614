//! Health probing seam used by the readiness coordinator.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Deserialize;

use ledgerx_types::ApiError;

use crate::LedgerClient;

/// Payload of the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
}

impl HealthStatus {
    #[must_use]
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }

    /// `true` when the service reports `"ok"` (any case).
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case("ok")
    }
}

pub type ProbeFut<'a> = Pin<Box<dyn Future<Output = Result<HealthStatus, ApiError>> + Send + 'a>>;

/// One health check against the remote service.
///
/// Implementations should fail once `timeout` has elapsed. Callers still
/// bound each attempt themselves.
pub trait HealthProbe: Send + Sync {
    fn probe(&self, timeout: Duration) -> ProbeFut<'_>;
}

impl HealthProbe for LedgerClient {
    fn probe(&self, timeout: Duration) -> ProbeFut<'_> {
        Box::pin(self.probe_health(timeout))
    }
}
