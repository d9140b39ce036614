use thiserror::Error;

use ledgerx_types::{ApiError, ApiErrorCode, BackendUnavailable, InvalidAmount};

/// Why a user-triggered action did not complete.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    /// Rejected locally; nothing was sent.
    #[error("Enter a transfer amount greater than 0 ({0}).")]
    InvalidAmount(#[from] InvalidAmount),
    #[error(transparent)]
    Unavailable(#[from] BackendUnavailable),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ActionError {
    /// Short heading for user-facing output.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "Invalid amount",
            Self::Unavailable(_) => "Backend unavailable",
            Self::Api(err) => match err.code() {
                ApiErrorCode::Conflict => "Conflict detected",
                ApiErrorCode::InsufficientFunds => "Insufficient funds",
                _ => "Request failed",
            },
        }
    }

    #[must_use]
    pub fn api_code(&self) -> Option<ApiErrorCode> {
        match self {
            Self::Api(err) => Some(err.code()),
            _ => None,
        }
    }
}
