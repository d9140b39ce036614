//! Live view of the two demo wallets and the completed-transfer feed.
//!
//! The dashboard polls on a fixed interval. A poll that comes due while the
//! previous one is still in flight is dropped, not queued. Snapshots are
//! published on a `watch` channel so any number of views can follow along.
//!
//! When a wallet balance moves, its [`WalletView::flash`] holds the direction
//! for `balance_flash`; a newer move restarts the highlight.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Local};
use futures_util::future::try_join;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

use ledgerx_client::LedgerClient;
use ledgerx_types::{Account, AccountNumber, ApiError, FlashDirection, Page, Transaction};

use crate::error::ActionError;
use crate::readiness::ReadinessCoordinator;
use crate::timers::Timers;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_BALANCE_FLASH: Duration = Duration::from_millis(700);
pub const DEFAULT_RECENT_LIMIT: u32 = 20;
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// One of the two wallets the dashboard follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalletKey {
    A,
    B,
}

impl WalletKey {
    pub const ALL: [Self; 2] = [Self::A, Self::B];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::A => "Account A",
            Self::B => "Account B",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletView {
    pub account: Option<Account>,
    pub flash: Option<FlashDirection>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub wallet_a: WalletView,
    pub wallet_b: WalletView,
    /// Most recent completed transactions, newest first as served.
    pub transactions: Vec<Transaction>,
    /// First failure of the last poll; `None` after a clean poll.
    pub live_error: Option<String>,
    pub last_polled_at: Option<DateTime<Local>>,
    /// `true` until the first poll has finished.
    pub initial_loading: bool,
}

impl Default for DashboardSnapshot {
    fn default() -> Self {
        Self {
            wallet_a: WalletView::default(),
            wallet_b: WalletView::default(),
            transactions: Vec::new(),
            live_error: None,
            last_polled_at: None,
            initial_loading: true,
        }
    }
}

impl DashboardSnapshot {
    #[must_use]
    pub fn wallet(&self, key: WalletKey) -> &WalletView {
        match key {
            WalletKey::A => &self.wallet_a,
            WalletKey::B => &self.wallet_b,
        }
    }

    fn wallet_mut(&mut self, key: WalletKey) -> &mut WalletView {
        match key {
            WalletKey::A => &mut self.wallet_a,
            WalletKey::B => &mut self.wallet_b,
        }
    }

    /// Currency of whichever wallet holds `account_number`, if loaded.
    #[must_use]
    pub fn currency_of(&self, account_number: &AccountNumber) -> Option<&str> {
        WalletKey::ALL
            .into_iter()
            .filter_map(|key| self.wallet(key).account.as_ref())
            .find(|account| &account.account_number == account_number)
            .map(|account| account.currency.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub account_a: AccountNumber,
    pub account_b: AccountNumber,
    pub poll_interval: Duration,
    pub balance_flash: Duration,
    pub recent_limit: u32,
    pub page_size: u32,
}

impl DashboardOptions {
    #[must_use]
    pub fn new(account_a: AccountNumber, account_b: AccountNumber) -> Self {
        Self {
            account_a,
            account_b,
            poll_interval: DEFAULT_POLL_INTERVAL,
            balance_flash: DEFAULT_BALANCE_FLASH,
            recent_limit: DEFAULT_RECENT_LIMIT,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    fn account(&self, key: WalletKey) -> &AccountNumber {
        match key {
            WalletKey::A => &self.account_a,
            WalletKey::B => &self.account_b,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Another poll was in flight.
    Skipped,
    Completed { live_error: Option<String> },
}

struct PollGuard<'a>(&'a AtomicBool);

impl Drop for PollGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct DashboardInner {
    client: LedgerClient,
    readiness: ReadinessCoordinator,
    options: DashboardOptions,
    snapshot_tx: Arc<watch::Sender<DashboardSnapshot>>,
    previous_balances: Mutex<[Option<f64>; 2]>,
    polling: AtomicBool,
    flash_timers: Timers<WalletKey>,
}

#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("options", &self.inner.options)
            .field("polling", &self.inner.polling.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    #[must_use]
    pub fn new(
        client: LedgerClient,
        readiness: ReadinessCoordinator,
        options: DashboardOptions,
    ) -> Self {
        let (snapshot_tx, _rx) = watch::channel(DashboardSnapshot::default());
        Self {
            inner: Arc::new(DashboardInner {
                client,
                readiness,
                options,
                snapshot_tx: Arc::new(snapshot_tx),
                previous_balances: Mutex::new([None, None]),
                polling: AtomicBool::new(false),
                flash_timers: Timers::new(),
            }),
        }
    }

    #[must_use]
    pub fn options(&self) -> &DashboardOptions {
        &self.inner.options
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Run one poll cycle unless one is already running.
    ///
    /// Wallets and the recent feed are fetched concurrently and settle
    /// independently: a failing feed does not discard fresh balances.
    pub async fn refresh(&self) -> PollOutcome {
        if self.inner.polling.swap(true, Ordering::AcqRel) {
            tracing::debug!("Poll already in flight; skipping");
            return PollOutcome::Skipped;
        }
        let _guard = PollGuard(&self.inner.polling);

        let (wallets, recent) = tokio::join!(self.fetch_wallets(), self.fetch_recent());

        let mut failures = Vec::new();
        match wallets {
            Ok((a, b)) => {
                self.apply_wallet(WalletKey::A, a);
                self.apply_wallet(WalletKey::B, b);
            }
            Err(err) => failures.push(err),
        }
        match recent {
            Ok(transactions) => self
                .inner
                .snapshot_tx
                .send_modify(|snapshot| snapshot.transactions = transactions),
            Err(err) => failures.push(err),
        }

        let live_error = failures.first().map(|err| err.message().to_string());
        if let Some(err) = failures.first() {
            tracing::warn!(code = %err.code(), error = %err, failures = failures.len(), "Live feed issue");
        }

        let published = live_error.clone();
        self.inner.snapshot_tx.send_modify(|snapshot| {
            snapshot.live_error = published;
            snapshot.last_polled_at = Some(Local::now());
            snapshot.initial_loading = false;
        });

        PollOutcome::Completed { live_error }
    }

    async fn fetch_wallets(&self) -> Result<(Account, Account), ApiError> {
        let client = &self.inner.client;
        try_join(
            client.get_account(self.inner.options.account(WalletKey::A)),
            client.get_account(self.inner.options.account(WalletKey::B)),
        )
        .await
    }

    async fn fetch_recent(&self) -> Result<Vec<Transaction>, ApiError> {
        let page = self
            .inner
            .client
            .list_transactions(0, self.inner.options.recent_limit)
            .await?;
        Ok(page
            .items
            .into_iter()
            .filter(Transaction::is_completed)
            .collect())
    }

    fn apply_wallet(&self, key: WalletKey, account: Account) {
        let direction = {
            let mut previous = self
                .inner
                .previous_balances
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let slot = &mut previous[key as usize];
            let direction = slot.and_then(|prev| FlashDirection::between(prev, account.balance));
            *slot = Some(account.balance);
            direction
        };

        self.inner.snapshot_tx.send_modify(|snapshot| {
            let wallet = snapshot.wallet_mut(key);
            wallet.account = Some(account);
            if direction.is_some() {
                wallet.flash = direction;
            }
        });

        if let Some(direction) = direction {
            tracing::debug!(wallet = key.label(), ?direction, "Balance changed");
            let tx = Arc::clone(&self.inner.snapshot_tx);
            self.inner
                .flash_timers
                .replace(key, self.inner.options.balance_flash, move || {
                    tx.send_modify(|snapshot| snapshot.wallet_mut(key).flash = None);
                });
        }
    }

    /// Poll immediately and then every `poll_interval` until `shutdown` resolves.
    ///
    /// Each tick runs on its own task, so a slow poll makes later ticks skip
    /// rather than pile up behind it.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(self.inner.options.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = ticker.tick() => {
                    while in_flight.try_join_next().is_some() {}
                    let dashboard = self.clone();
                    in_flight.spawn(async move { dashboard.refresh().await });
                }
            }
        }

        in_flight.abort_all();
        self.inner.flash_timers.cancel_all();
        tracing::debug!("Dashboard polling stopped");
    }

    /// Readiness-gated page of the full transaction history.
    pub async fn open_page(&self, page: u32) -> Result<Page<Transaction>, ActionError> {
        self.inner.readiness.ensure_ready().await?;
        let page = self
            .inner
            .client
            .list_transactions(page, self.inner.options.page_size)
            .await?;
        Ok(page)
    }
}
