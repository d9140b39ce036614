//! Backend readiness gating.
//!
//! A [`ReadinessCoordinator`] owns one [`BackendState`] for the session.
//! It starts in `Waking` and moves exactly once, to `Ready` when a health probe
//! succeeds or to `Error` when the wait ceiling elapses. User actions call
//! [`ReadinessCoordinator::ensure_ready`] first; while the state is `Waking`
//! they are parked as waiters and all of them settle together on the
//! transition.
//!
//! # Probing
//!
//! At most one probe loop runs at a time. It is started by
//! [`ReadinessCoordinator::start`] or by the first waiter, and is tracked as an
//! explicit task handle so that [`ReadinessCoordinator::shutdown`] can abort it.
//! Each attempt is cut off at `attempt_timeout` even if the probe ignores it,
//! and a panicking probe counts as a failed attempt.
//!
//! ```text
//! attempt ──ok──> Ready
//!    │
//!   fail ── wait (interval - attempt time, capped by budget) ──> attempt
//!    │
//! ceiling ──> Error
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use ledgerx_client::classify::TIMEOUT_MESSAGE;
use ledgerx_client::{HealthProbe, HealthStatus};
use ledgerx_types::{BackendState, BackendUnavailable, NoticeKind, NoticeState};

use crate::notice::NoticeBoard;

pub const WAKING_MESSAGE: &str = "Backend is starting up, please wait...";
pub const READY_MESSAGE: &str = "Backend ready";

const PROBE_PANIC_MESSAGE: &str = "Health check failed unexpectedly.";

/// Timing knobs for the probe loop and the ready flash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessTimings {
    /// Upper bound for a single health probe.
    pub attempt_timeout: Duration,
    /// Spacing between attempt starts.
    pub retry_interval: Duration,
    /// Total budget measured from loop start.
    pub max_wait: Duration,
    /// How long the "ready" notice stays up.
    pub ready_flash: Duration,
}

impl Default for ReadinessTimings {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(15),
            retry_interval: Duration::from_secs(30),
            max_wait: Duration::from_secs(5 * 60),
            ready_flash: Duration::from_millis(1500),
        }
    }
}

/// Message used when the wait ceiling elapses.
#[must_use]
pub fn ceiling_message(max_wait: Duration, last_error: Option<&str>) -> String {
    let mut message = format!(
        "Backend is still unavailable after waiting up to {}. Please try again later.",
        describe_wait(max_wait)
    );
    if let Some(last_error) = last_error {
        message.push_str(" Last error: ");
        message.push_str(last_error);
    }
    message
}

fn describe_wait(wait: Duration) -> String {
    fn plural(n: u64, unit: &str) -> String {
        if n == 1 {
            format!("1 {unit}")
        } else {
            format!("{n} {unit}s")
        }
    }

    let secs = wait.as_secs();
    if wait.subsec_nanos() != 0 {
        format!("{} ms", wait.as_millis())
    } else if secs >= 60 && secs % 60 == 0 {
        plural(secs / 60, "minute")
    } else {
        plural(secs, "second")
    }
}

type Waiter = oneshot::Sender<Result<(), BackendUnavailable>>;

struct ProbeTask {
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct CoordinatorState {
    backend: BackendState,
    failure: Option<BackendUnavailable>,
    last_error: Option<String>,
    waiters: Vec<Waiter>,
    probe_task: Option<ProbeTask>,
    closed: bool,
}

struct Inner {
    probe: Arc<dyn HealthProbe>,
    timings: ReadinessTimings,
    state: Mutex<CoordinatorState>,
    state_tx: watch::Sender<BackendState>,
    notices: NoticeBoard,
    loops_started: AtomicU64,
}

/// Session-wide readiness gate. Clones share the same state.
#[derive(Clone)]
pub struct ReadinessCoordinator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ReadinessCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ReadinessCoordinator")
            .field("backend", &state.backend)
            .field("waiters", &state.waiters.len())
            .field("probing", &state.probe_task.is_some())
            .field("closed", &state.closed)
            .finish_non_exhaustive()
    }
}

impl ReadinessCoordinator {
    #[must_use]
    pub fn new(probe: Arc<dyn HealthProbe>, timings: ReadinessTimings) -> Self {
        let (state_tx, _rx) = watch::channel(BackendState::Waking);
        Self {
            inner: Arc::new(Inner {
                probe,
                timings,
                state: Mutex::new(CoordinatorState::default()),
                state_tx,
                notices: NoticeBoard::new(),
                loops_started: AtomicU64::new(0),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn timings(&self) -> ReadinessTimings {
        self.inner.timings
    }

    #[must_use]
    pub fn current_state(&self) -> BackendState {
        self.lock().backend
    }

    /// Receiver that observes every state transition.
    #[must_use]
    pub fn states(&self) -> watch::Receiver<BackendState> {
        self.inner.state_tx.subscribe()
    }

    #[must_use]
    pub fn notices(&self) -> watch::Receiver<Option<NoticeState>> {
        self.inner.notices.subscribe()
    }

    #[must_use]
    pub fn current_notice(&self) -> Option<NoticeState> {
        self.inner.notices.current()
    }

    #[must_use]
    pub fn is_probing(&self) -> bool {
        self.lock().probe_task.is_some()
    }

    /// Number of probe loops launched over the coordinator's lifetime.
    #[must_use]
    pub fn probe_loops_started(&self) -> u64 {
        self.inner.loops_started.load(Ordering::Relaxed)
    }

    /// Begin probing in the background without waiting for the outcome.
    pub fn start(&self) {
        let mut state = self.lock();
        self.launch_probe_loop(&mut state);
    }

    /// Wait until the backend is ready.
    ///
    /// Returns immediately when already `Ready`. Fails immediately, without
    /// probing again, when already `Error` or after [`Self::shutdown`].
    pub async fn ensure_ready(&self) -> Result<(), BackendUnavailable> {
        let rx = {
            let mut state = self.lock();
            if state.closed {
                return Err(BackendUnavailable::default());
            }
            match state.backend {
                BackendState::Ready => return Ok(()),
                BackendState::Error => {
                    let failure = state.failure.clone().unwrap_or_default();
                    self.inner
                        .notices
                        .show(NoticeState::new(NoticeKind::Error, failure.message()));
                    return Err(failure);
                }
                BackendState::Waking => {}
            }

            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            if !self.inner.notices.is_showing(NoticeKind::Waking) {
                self.inner
                    .notices
                    .show(NoticeState::new(NoticeKind::Waking, WAKING_MESSAGE));
            }
            self.launch_probe_loop(&mut state);
            rx
        };

        rx.await.unwrap_or_else(|_| Err(BackendUnavailable::default()))
    }

    /// Tear the coordinator down: abort probing, cancel the notice timer and
    /// reject every outstanding waiter.
    pub fn shutdown(&self) {
        let (waiters, task) = {
            let mut state = self.lock();
            state.closed = true;
            self.inner.notices.cancel_flash();
            (std::mem::take(&mut state.waiters), state.probe_task.take())
        };

        if let Some(task) = task {
            task.handle.abort();
        }
        if !waiters.is_empty() {
            tracing::debug!(waiters = waiters.len(), "Rejecting readiness waiters on shutdown");
        }
        for waiter in waiters {
            let _ = waiter.send(Err(BackendUnavailable::default()));
        }
    }

    fn launch_probe_loop(&self, state: &mut CoordinatorState) {
        if state.closed || state.backend != BackendState::Waking || state.probe_task.is_some() {
            return;
        }
        self.inner.loops_started.fetch_add(1, Ordering::Relaxed);
        let coordinator = self.clone();
        let handle = tokio::spawn(async move {
            let outcome = AssertUnwindSafe(coordinator.clone().probe_loop())
                .catch_unwind()
                .await;
            if outcome.is_err() {
                tracing::error!("Readiness probe loop panicked");
                coordinator.record_probe_error(PROBE_PANIC_MESSAGE.to_string());
                coordinator.mark_failed();
            }
        });
        state.probe_task = Some(ProbeTask { handle });
    }

    /// One health check, bounded by `attempt_timeout` whatever the probe does.
    async fn attempt(&self, attempt_timeout: Duration) -> Result<HealthStatus, String> {
        let probe = AssertUnwindSafe(async { self.inner.probe.probe(attempt_timeout).await })
            .catch_unwind();
        match tokio::time::timeout(attempt_timeout, probe).await {
            Ok(Ok(Ok(health))) => Ok(health),
            Ok(Ok(Err(e))) => {
                tracing::debug!(code = %e.code(), error = %e, "Health check failed");
                Err(e.message().to_string())
            }
            Ok(Err(_)) => {
                tracing::warn!("Health probe panicked");
                Err(PROBE_PANIC_MESSAGE.to_string())
            }
            Err(_) => {
                tracing::debug!(timeout_ms = attempt_timeout.as_millis(), "Health check timed out");
                Err(TIMEOUT_MESSAGE.to_string())
            }
        }
    }

    async fn probe_loop(self) {
        let timings = self.inner.timings;
        let started = Instant::now();
        let mut attempt: u32 = 0;

        while started.elapsed() < timings.max_wait {
            attempt += 1;
            let attempt_started = Instant::now();

            match self.attempt(timings.attempt_timeout).await {
                Ok(health) if health.is_ok() => {
                    self.mark_ready(attempt, started.elapsed());
                    return;
                }
                Ok(health) => {
                    tracing::debug!(attempt, status = %health.status, "Health check not ok yet");
                    self.record_probe_error(format!(
                        "Health check reported status '{}'.",
                        health.status
                    ));
                }
                Err(message) => self.record_probe_error(message),
            }

            let remaining = timings.max_wait.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                break;
            }
            let delay = timings
                .retry_interval
                .saturating_sub(attempt_started.elapsed())
                .min(remaining);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        tracing::debug!(attempts = attempt, "Readiness budget exhausted");
        self.mark_failed();
    }

    fn record_probe_error(&self, message: String) {
        if !message.trim().is_empty() {
            self.lock().last_error = Some(message);
        }
    }

    fn mark_ready(&self, attempts: u32, waited: Duration) {
        let waiters = {
            let mut state = self.lock();
            state.probe_task = None;
            if state.closed || state.backend != BackendState::Waking {
                return;
            }
            state.backend = BackendState::Ready;
            self.inner.state_tx.send_replace(BackendState::Ready);

            let notices = &self.inner.notices;
            if notices.is_showing(NoticeKind::Waking) || notices.is_showing(NoticeKind::Error) {
                notices.flash(
                    NoticeState::new(NoticeKind::Ready, READY_MESSAGE),
                    self.inner.timings.ready_flash,
                );
            }
            std::mem::take(&mut state.waiters)
        };

        tracing::info!(
            attempts,
            waited_ms = waited.as_millis(),
            waiters = waiters.len(),
            "Backend ready"
        );
        for waiter in waiters {
            let _ = waiter.send(Ok(()));
        }
    }

    fn mark_failed(&self) {
        let (failure, waiters) = {
            let mut state = self.lock();
            state.probe_task = None;
            if state.closed || state.backend != BackendState::Waking {
                return;
            }
            let failure = BackendUnavailable::new(ceiling_message(
                self.inner.timings.max_wait,
                state.last_error.as_deref(),
            ));
            state.backend = BackendState::Error;
            state.failure = Some(failure.clone());
            self.inner.state_tx.send_replace(BackendState::Error);
            self.inner
                .notices
                .show(NoticeState::new(NoticeKind::Error, failure.message()));
            (failure, std::mem::take(&mut state.waiters))
        };

        tracing::warn!(
            waiters = waiters.len(),
            error = %failure,
            "Backend did not become ready"
        );
        for waiter in waiters {
            let _ = waiter.send(Err(failure.clone()));
        }
    }
}
