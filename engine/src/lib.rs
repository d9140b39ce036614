//! Client-side orchestration for LedgerX.
//!
//! # Architecture
//!
//! - [`ReadinessCoordinator`] - gates every user action on the backend being awake
//! - [`FanOutOrchestrator`] - concurrent batches of identical transfers
//! - [`Dashboard`] - non-overlapping wallet and feed polling
//! - [`TransferDesk`] - the user actions: manual transfer, stress test, reset
//!
//! The HTTP layer lives in `ledgerx-client`; this crate never builds requests
//! itself. Tasks run on the caller's tokio runtime.

mod dashboard;
mod desk;
mod error;
mod fanout;
mod notice;
mod readiness;
mod timers;

#[cfg(test)]
mod test_support;

pub use dashboard::{
    DEFAULT_BALANCE_FLASH, DEFAULT_PAGE_SIZE, DEFAULT_POLL_INTERVAL, DEFAULT_RECENT_LIMIT,
    Dashboard, DashboardOptions, DashboardSnapshot, PollOutcome, WalletKey, WalletView,
};
pub use desk::{DEFAULT_CURRENCY, DEFAULT_STRESS_CONCURRENCY, DeskOptions, TransferDesk};
pub use error::ActionError;
pub use fanout::{BatchSummary, FanOutOrchestrator, SubmissionOutcome};
pub use notice::NoticeBoard;
pub use readiness::{
    READY_MESSAGE, ReadinessCoordinator, ReadinessTimings, WAKING_MESSAGE, ceiling_message,
};
pub use timers::Timers;

pub use ledgerx_client::{self, LedgerClient};
pub use ledgerx_types::{
    BackendState, BackendUnavailable, FlashDirection, NoticeKind, NoticeState,
};
