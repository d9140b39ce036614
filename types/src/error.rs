//! Classified failures of remote ledger operations.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Default message for [`BackendUnavailable`].
pub const DEFAULT_UNAVAILABLE_MESSAGE: &str = "Backend unavailable. Please try again later.";

/// Category of a failed ledger API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    Conflict,
    InsufficientFunds,
    NotFound,
    BadRequest,
    HttpError,
    NetworkError,
}

impl ApiErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Conflict => "CONFLICT",
            Self::InsufficientFunds => "INSUFFICIENT_FUNDS",
            Self::NotFound => "NOT_FOUND",
            Self::BadRequest => "BAD_REQUEST",
            Self::HttpError => "HTTP_ERROR",
            Self::NetworkError => "NETWORK_ERROR",
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw response body kept alongside a classified error for diagnostics.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResponseBody {
    #[default]
    Empty,
    Json(Value),
    Text(String),
}

impl ResponseBody {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Json(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// A failed ledger API call, classified by [`ApiErrorCode`].
///
/// `status` and `details` are for diagnostics only; branch on `code`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ApiError {
    code: ApiErrorCode,
    status: Option<u16>,
    message: String,
    details: ResponseBody,
}

impl ApiError {
    #[must_use]
    pub fn new(
        code: ApiErrorCode,
        status: Option<u16>,
        message: impl Into<String>,
        details: ResponseBody,
    ) -> Self {
        Self {
            code,
            status,
            message: message.into(),
            details,
        }
    }

    #[must_use]
    pub const fn code(&self) -> ApiErrorCode {
        self.code
    }

    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn details(&self) -> &ResponseBody {
        &self.details
    }
}

/// The remote service never became reachable during this session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendUnavailable {
    message: String,
}

impl BackendUnavailable {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Default for BackendUnavailable {
    fn default() -> Self {
        Self::new(DEFAULT_UNAVAILABLE_MESSAGE)
    }
}
