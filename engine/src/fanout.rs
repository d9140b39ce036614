//! Concurrent transfer fan-out.
//!
//! A batch fires `count` copies of one transfer at the service at once and
//! waits for every one of them to settle before tallying. A single failure
//! never cancels its siblings. Each copy carries its own idempotency key, so
//! the service treats them as distinct transfers competing for the same rows.

use std::fmt::Write as _;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::time::Instant;

use ledgerx_client::LedgerClient;
use ledgerx_types::{ApiError, ApiErrorCode, BackendUnavailable, Transaction, TransferRequest};

use crate::readiness::ReadinessCoordinator;

/// How one submission of a batch ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Completed(Transaction),
    Rejected(ApiError),
}

impl SubmissionOutcome {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

impl From<Result<Transaction, ApiError>> for SubmissionOutcome {
    fn from(result: Result<Transaction, ApiError>) -> Self {
        match result {
            Ok(transaction) => Self::Completed(transaction),
            Err(err) => Self::Rejected(err),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    pub requested: usize,
    pub succeeded: usize,
    pub conflicts: usize,
    pub insufficient_funds: usize,
    pub other_errors: usize,
    /// From launch until the last submission settled.
    pub duration: Duration,
}

impl BatchSummary {
    #[must_use]
    pub fn tally(requested: usize, outcomes: &[SubmissionOutcome], duration: Duration) -> Self {
        let mut summary = Self {
            requested,
            duration,
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome {
                SubmissionOutcome::Completed(_) => summary.succeeded += 1,
                SubmissionOutcome::Rejected(err) => match err.code() {
                    ApiErrorCode::Conflict => summary.conflicts += 1,
                    ApiErrorCode::InsufficientFunds => summary.insufficient_funds += 1,
                    _ => summary.other_errors += 1,
                },
            }
        }
        summary
    }

    /// Number of settled submissions.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded + self.conflicts + self.insufficient_funds + self.other_errors
    }

    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.requested
    }

    /// One-line human summary, e.g.
    /// `3/5 succeeded in 12ms. 1 conflicts, 1 insufficient funds.`
    #[must_use]
    pub fn describe(&self) -> String {
        let mut line = format!(
            "{}/{} succeeded in {}ms. {} conflicts, {} insufficient funds",
            self.succeeded,
            self.requested,
            self.duration.as_millis(),
            self.conflicts,
            self.insufficient_funds
        );
        if self.other_errors > 0 {
            let _ = write!(line, ", {} other errors", self.other_errors);
        }
        line.push('.');
        line
    }
}

/// Runs readiness-gated batches of identical transfers.
#[derive(Debug, Clone)]
pub struct FanOutOrchestrator {
    client: LedgerClient,
    readiness: ReadinessCoordinator,
}

impl FanOutOrchestrator {
    #[must_use]
    pub fn new(client: LedgerClient, readiness: ReadinessCoordinator) -> Self {
        Self { client, readiness }
    }

    /// Wait for readiness, then submit `count` copies of `template` concurrently.
    ///
    /// Nothing is submitted when readiness fails.
    pub async fn run_batch(
        &self,
        template: &TransferRequest,
        count: usize,
    ) -> Result<BatchSummary, BackendUnavailable> {
        self.readiness.ensure_ready().await?;

        let started = Instant::now();
        let outcomes = self.submit_all(template, count).await;
        let summary = BatchSummary::tally(count, &outcomes, started.elapsed());

        tracing::info!(
            requested = summary.requested,
            succeeded = summary.succeeded,
            conflicts = summary.conflicts,
            insufficient_funds = summary.insufficient_funds,
            other_errors = summary.other_errors,
            duration_ms = summary.duration.as_millis(),
            "Transfer batch settled"
        );
        Ok(summary)
    }

    /// Submit `count` copies of `template` at once and collect every outcome.
    /// Not gated on readiness.
    pub async fn submit_all(
        &self,
        template: &TransferRequest,
        count: usize,
    ) -> Vec<SubmissionOutcome> {
        let submissions = (0..count).map(|_| async {
            SubmissionOutcome::from(self.client.submit_transfer(template).await)
        });
        join_all(submissions).await
    }
}
