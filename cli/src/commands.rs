//! Subcommand implementations on top of the orchestration engine.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use ledgerx_client::{ClientOptions, LedgerClient};
use ledgerx_config::Settings;
use ledgerx_engine::{
    ActionError, Dashboard, DashboardOptions, DashboardSnapshot, DeskOptions, NoticeState,
    ReadinessCoordinator, ReadinessTimings, TransferDesk, WalletKey,
};
use ledgerx_types::{AccountNumber, Page, Transaction};

use crate::args::Command;
use crate::format;

/// Everything one CLI invocation needs, wired together.
pub struct Session {
    settings: Settings,
    client: LedgerClient,
    readiness: ReadinessCoordinator,
    dashboard: Dashboard,
    desk: TransferDesk,
    notice_printer: JoinHandle<()>,
}

impl Session {
    pub fn new(settings: Settings) -> Result<Self> {
        let options = ClientOptions::new(settings.base_url.clone())
            .with_health_path(settings.health_path.clone())
            .with_connect_timeout(settings.connect_timeout);
        let client = LedgerClient::new(options).context("failed to build LedgerX client")?;

        let timings = ReadinessTimings {
            attempt_timeout: settings.attempt_timeout,
            retry_interval: settings.retry_interval,
            max_wait: settings.max_wait,
            ready_flash: settings.ready_flash,
        };
        let readiness = ReadinessCoordinator::new(Arc::new(client.clone()), timings);

        let dashboard = Dashboard::new(
            client.clone(),
            readiness.clone(),
            DashboardOptions {
                poll_interval: settings.poll_interval,
                balance_flash: settings.balance_flash,
                recent_limit: settings.recent_limit,
                page_size: settings.page_size,
                ..DashboardOptions::new(settings.account_a.clone(), settings.account_b.clone())
            },
        );

        let desk = TransferDesk::new(
            client.clone(),
            readiness.clone(),
            DeskOptions {
                currency: settings.currency.clone(),
                stress_amount: settings.stress_amount,
                ..DeskOptions::new(settings.account_a.clone(), settings.account_b.clone())
            },
        )
        .with_dashboard(dashboard.clone());

        let notice_printer = spawn_notice_printer(readiness.notices());
        readiness.start();

        Ok(Self {
            settings,
            client,
            readiness,
            dashboard,
            desk,
            notice_printer,
        })
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        tracing::info!(?command, base_url = %self.settings.base_url, "Running command");
        match command {
            Command::Status => self.status().await,
            Command::Account { accounts } => self.accounts(accounts).await,
            Command::Transactions { page } => self.transactions(page).await,
            Command::Transfer { amount, reverse } => {
                if reverse {
                    self.desk.swap_direction();
                }
                self.transfer(&amount).await
            }
            Command::Stress { count, reverse } => {
                if reverse {
                    self.desk.swap_direction();
                }
                let count = count.map_or(self.settings.stress_concurrency, |n| n as usize);
                self.stress(count).await
            }
            Command::Reset => self.reset().await,
            Command::Watch => self.watch().await,
        }
    }

    pub fn shutdown(self) {
        self.readiness.shutdown();
        self.notice_printer.abort();
    }

    async fn status(&self) -> Result<()> {
        self.readiness.ensure_ready().await.map_err(action_error)?;
        println!(
            "Backend {} is {}.",
            self.settings.base_url,
            self.readiness.current_state()
        );
        Ok(())
    }

    async fn accounts(&self, accounts: Vec<String>) -> Result<()> {
        let numbers = if accounts.is_empty() {
            vec![self.settings.account_a.clone(), self.settings.account_b.clone()]
        } else {
            accounts
                .into_iter()
                .map(AccountNumber::new)
                .collect::<Result<Vec<_>, _>>()?
        };

        self.readiness.ensure_ready().await.map_err(action_error)?;
        for number in &numbers {
            let account = self
                .client
                .get_account(number)
                .await
                .map_err(action_error)?;
            println!(
                "{:<14} {:>16}",
                account.account_number,
                format::money(account.balance, &account.currency)
            );
        }
        Ok(())
    }

    async fn transactions(&self, page: u32) -> Result<()> {
        let listing = self.dashboard.open_page(page).await.map_err(action_error)?;
        println!(
            "Page {} of {} ({} transactions)",
            listing.page_number + 1,
            listing.total_pages.max(1),
            listing.total_elements
        );
        for transaction in &listing.items {
            println!("{}", transaction_row(transaction));
        }
        if listing.items.is_empty() {
            println!("No transactions on this page.");
        }
        if let Some(hint) = page_hint(&listing) {
            println!("{hint}");
        }
        Ok(())
    }

    async fn transfer(&self, amount: &str) -> Result<()> {
        let transaction = self
            .desk
            .manual_transfer(amount)
            .await
            .map_err(action_error)?;
        println!(
            "Transfer completed: transaction {} processed successfully.",
            transaction.short_id()
        );
        self.print_wallets(&self.dashboard.snapshot());
        Ok(())
    }

    async fn stress(&self, count: usize) -> Result<()> {
        println!(
            "Sending {count} concurrent transfers of {} from {} to {}...",
            self.settings.stress_amount,
            self.desk.source(),
            self.desk.destination()
        );
        let summary = self.desk.stress_test(count).await.map_err(action_error)?;
        println!("Concurrency simulation complete: {}", summary.describe());
        self.print_wallets(&self.dashboard.snapshot());
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        self.desk.reset().await.map_err(action_error)?;
        println!("Demo state reset.");
        self.print_wallets(&self.dashboard.snapshot());
        Ok(())
    }

    async fn watch(&self) -> Result<()> {
        println!(
            "Polling every {}ms for wallets and completed ledger events. Ctrl-C to stop.",
            self.settings.poll_interval.as_millis()
        );
        let printer =
            spawn_snapshot_printer(self.dashboard.subscribe(), self.settings.currency.clone());
        self.dashboard
            .run(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await;
        printer.abort();
        Ok(())
    }

    fn print_wallets(&self, snapshot: &DashboardSnapshot) {
        for key in WalletKey::ALL {
            let wallet = snapshot.wallet(key);
            if let Some(account) = &wallet.account {
                println!(
                    "  {} ({}): {}{}",
                    key.label(),
                    account.account_number,
                    format::money(account.balance, &account.currency),
                    format::flash_marker(wallet.flash)
                );
            }
        }
        if let Some(error) = &snapshot.live_error {
            println!("  Live feed issue: {error}");
        }
    }
}

fn action_error(err: impl Into<ActionError>) -> anyhow::Error {
    let err = err.into();
    anyhow!("{}: {err}", err.title())
}

fn transaction_row(transaction: &Transaction) -> String {
    let amount = transaction
        .amount
        .map(|amount| format::money(amount, transaction.currency.as_deref().unwrap_or("USD")))
        .unwrap_or_else(|| "n/a".to_string());
    format!(
        "{:<8}  {:<7}  {:>12} -> {:<12}  {:>14}  {}",
        transaction.short_id(),
        transaction.status.label(),
        transaction.from_account.as_deref().unwrap_or("n/a"),
        transaction.to_account.as_deref().unwrap_or("n/a"),
        amount,
        format::timestamp(&transaction.created_at)
    )
}

/// Navigation hint for the pages around `listing`.
fn page_hint(listing: &Page<Transaction>) -> Option<String> {
    let mut hints = Vec::new();
    if listing.has_previous() {
        hints.push(format!(
            "previous: ledgerx transactions --page {}",
            listing.page_number - 1
        ));
    }
    if listing.has_next() {
        hints.push(format!(
            "next: ledgerx transactions --page {}",
            listing.page_number + 1
        ));
    }
    (!hints.is_empty()).then(|| hints.join(" | "))
}

fn spawn_notice_printer(mut notices: watch::Receiver<Option<NoticeState>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while notices.changed().await.is_ok() {
            let notice = notices.borrow_and_update().clone();
            if let Some(notice) = notice {
                eprintln!("{}", format::notice_line(&notice));
            }
        }
    })
}

fn spawn_snapshot_printer(
    mut snapshots: watch::Receiver<DashboardSnapshot>,
    fallback_currency: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_polled = None;
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            if snapshot.last_polled_at == last_polled {
                continue;
            }
            last_polled = snapshot.last_polled_at;
            println!("{}", snapshot_line(&snapshot, &fallback_currency));
        }
    })
}

fn snapshot_line(snapshot: &DashboardSnapshot, fallback_currency: &str) -> String {
    let synced = snapshot
        .last_polled_at
        .map_or_else(|| "--:--:--".to_string(), |at| at.format("%H:%M:%S").to_string());
    let wallets: Vec<String> = WalletKey::ALL
        .into_iter()
        .map(|key| {
            let wallet = snapshot.wallet(key);
            let balance = wallet.account.as_ref().map_or_else(
                || "n/a".to_string(),
                |account| format::money(account.balance, &account.currency),
            );
            format!("{} {balance}{}", key.label(), format::flash_marker(wallet.flash))
        })
        .collect();

    let mut line = format!(
        "[{synced}] {} | {} completed",
        wallets.join(" | "),
        snapshot.transactions.len()
    );
    if let Some(latest) = snapshot.transactions.first()
        && let Some(amount) = latest.amount
    {
        let currency = latest.currency.as_deref().unwrap_or(fallback_currency);
        line.push_str(&format!(
            " (latest {} {})",
            latest.short_id(),
            format::money(amount, currency)
        ));
    }
    if let Some(error) = &snapshot.live_error {
        line.push_str(&format!(" | Live feed issue: {error}"));
    }
    line
}
