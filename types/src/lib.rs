//! Core domain types for LedgerX.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application: the HTTP client,
//! the orchestration engine, and the terminal front end.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod error;
mod ids;
mod page;
mod readiness;

pub use error::{
    ApiError, ApiErrorCode, BackendUnavailable, DEFAULT_UNAVAILABLE_MESSAGE, ResponseBody,
};
pub use ids::{AccountNumber, EmptyAccountNumber};
pub use page::Page;
pub use readiness::{BackendState, FlashDirection, NoticeKind, NoticeState};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Accounts
// ============================================================================

/// A wallet as reported by the ledger service.
///
/// Read-only from the client's perspective: always fetched fresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub account_number: AccountNumber,
    pub balance: f64,
    pub currency: String,
}

// ============================================================================
// Transactions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    /// Any status string this client does not know about.
    #[serde(other)]
    Unknown,
}

impl TransactionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Short human label used by transaction tables.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Success",
            Self::Failed => "Failed",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub idempotency_key: String,
    pub status: TransactionStatus,
    pub created_at: String,
    #[serde(default)]
    pub from_account: Option<String>,
    #[serde(default)]
    pub to_account: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl Transaction {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == TransactionStatus::Completed
    }

    /// First eight characters of the transaction id, for compact display.
    #[must_use]
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(8) {
            Some((idx, _)) => &self.id[..idx],
            None => &self.id,
        }
    }
}

// ============================================================================
// Transfers
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidAmount {
    #[error("amount '{0}' is not a number")]
    NotANumber(String),
    #[error("amount must be a finite number")]
    NotFinite,
    #[error("amount must be greater than 0 (got {0})")]
    NotPositive(f64),
}

/// A transfer amount: positive and finite by construction.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Amount(f64);

impl Amount {
    pub const ONE: Self = Self(1.0);

    pub fn new(value: f64) -> Result<Self, InvalidAmount> {
        if !value.is_finite() {
            return Err(InvalidAmount::NotFinite);
        }
        if value <= 0.0 {
            return Err(InvalidAmount::NotPositive(value));
        }
        Ok(Self(value))
    }

    /// Parse user-entered amount text.
    pub fn parse(raw: &str) -> Result<Self, InvalidAmount> {
        let trimmed = raw.trim();
        let value = trimmed
            .parse::<f64>()
            .map_err(|_| InvalidAmount::NotANumber(trimmed.to_string()))?;
        Self::new(value)
    }

    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Amount {
    type Error = InvalidAmount;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for f64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Body of `POST /api/v1/transfers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    from_account: AccountNumber,
    to_account: AccountNumber,
    amount: Amount,
    currency: String,
}

impl TransferRequest {
    #[must_use]
    pub fn new(
        from_account: AccountNumber,
        to_account: AccountNumber,
        amount: Amount,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            from_account,
            to_account,
            amount,
            currency: currency.into(),
        }
    }

    #[must_use]
    pub fn from_account(&self) -> &AccountNumber {
        &self.from_account
    }

    #[must_use]
    pub fn to_account(&self) -> &AccountNumber {
        &self.to_account
    }

    #[must_use]
    pub const fn amount(&self) -> Amount {
        self.amount
    }

    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// The same transfer in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            from_account: self.to_account.clone(),
            to_account: self.from_account.clone(),
            amount: self.amount,
            currency: self.currency.clone(),
        }
    }
}
