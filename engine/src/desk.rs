//! User-triggered transfer actions.
//!
//! Every action that reaches the service waits on the readiness gate first.
//! Input validation happens before that, so a bad amount never waits on a
//! sleeping backend.

use tracing::info;

use ledgerx_client::LedgerClient;
use ledgerx_types::{AccountNumber, Amount, Transaction, TransferRequest};

use crate::dashboard::Dashboard;
use crate::error::ActionError;
use crate::fanout::{BatchSummary, FanOutOrchestrator};
use crate::readiness::ReadinessCoordinator;

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_STRESS_CONCURRENCY: usize = 50;

#[derive(Debug, Clone)]
pub struct DeskOptions {
    pub source: AccountNumber,
    pub destination: AccountNumber,
    /// Used until the dashboard has loaded the source wallet.
    pub currency: String,
    pub stress_amount: Amount,
}

impl DeskOptions {
    #[must_use]
    pub fn new(source: AccountNumber, destination: AccountNumber) -> Self {
        Self {
            source,
            destination,
            currency: DEFAULT_CURRENCY.to_string(),
            stress_amount: Amount::ONE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransferDesk {
    client: LedgerClient,
    readiness: ReadinessCoordinator,
    fanout: FanOutOrchestrator,
    options: DeskOptions,
    dashboard: Option<Dashboard>,
}

impl TransferDesk {
    #[must_use]
    pub fn new(client: LedgerClient, readiness: ReadinessCoordinator, options: DeskOptions) -> Self {
        let fanout = FanOutOrchestrator::new(client.clone(), readiness.clone());
        Self {
            client,
            readiness,
            fanout,
            options,
            dashboard: None,
        }
    }

    /// Refresh `dashboard` after each completed action and take the
    /// transfer currency from its wallets.
    #[must_use]
    pub fn with_dashboard(mut self, dashboard: Dashboard) -> Self {
        self.dashboard = Some(dashboard);
        self
    }

    #[must_use]
    pub fn source(&self) -> &AccountNumber {
        &self.options.source
    }

    #[must_use]
    pub fn destination(&self) -> &AccountNumber {
        &self.options.destination
    }

    pub fn swap_direction(&mut self) {
        std::mem::swap(&mut self.options.source, &mut self.options.destination);
        info!(
            from = %self.options.source,
            to = %self.options.destination,
            "Transfer direction swapped"
        );
    }

    fn currency(&self) -> String {
        self.dashboard
            .as_ref()
            .and_then(|dashboard| {
                dashboard
                    .snapshot()
                    .currency_of(&self.options.source)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| self.options.currency.clone())
    }

    fn request(&self, amount: Amount) -> TransferRequest {
        TransferRequest::new(
            self.options.source.clone(),
            self.options.destination.clone(),
            amount,
            self.currency(),
        )
    }

    async fn refresh_dashboard(&self) {
        if let Some(dashboard) = &self.dashboard {
            dashboard.refresh().await;
        }
    }

    /// Transfer the amount typed by the user from source to destination.
    pub async fn manual_transfer(&self, amount_input: &str) -> Result<Transaction, ActionError> {
        let amount = Amount::parse(amount_input)?;
        self.readiness.ensure_ready().await?;

        let transaction = self.client.submit_transfer(&self.request(amount)).await?;
        info!(
            transaction = transaction.short_id(),
            amount = %amount,
            "Transfer completed"
        );
        self.refresh_dashboard().await;
        Ok(transaction)
    }

    /// Fire `count` identical small transfers at once.
    pub async fn stress_test(&self, count: usize) -> Result<BatchSummary, ActionError> {
        let template = self.request(self.options.stress_amount);
        let summary = self.fanout.run_batch(&template, count).await?;
        self.refresh_dashboard().await;
        Ok(summary)
    }

    /// Restore the demo wallets to their seeded balances.
    pub async fn reset(&self) -> Result<(), ActionError> {
        self.readiness.ensure_ready().await?;
        self.client.reset_demo_state().await?;
        info!("Demo state reset");
        self.refresh_dashboard().await;
        Ok(())
    }
}
