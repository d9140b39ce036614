//! Mapping of failed HTTP exchanges onto [`ApiErrorCode`] categories.
//!
//! | Status | Code |
//! |--------|------|
//! | 409 | `CONFLICT` |
//! | 422 | `INSUFFICIENT_FUNDS` |
//! | 404 | `NOT_FOUND` |
//! | 400 | `BAD_REQUEST` |
//! | other non-2xx | `HTTP_ERROR` |
//! | transport failure | `NETWORK_ERROR` |
//!
//! A human-readable message from the server body wins over the default text.

use ledgerx_types::{ApiError, ApiErrorCode, ResponseBody};

pub const CONFLICT_MESSAGE: &str =
    "Transfer conflict detected from a concurrent update. Please retry.";
pub const INSUFFICIENT_FUNDS_MESSAGE: &str =
    "Insufficient funds for this transfer. Lower the amount or change source account.";
pub const NOT_FOUND_MESSAGE: &str = "Requested resource was not found.";
pub const BAD_REQUEST_MESSAGE: &str = "Invalid request payload.";
pub const NETWORK_MESSAGE: &str = "Unable to reach LedgerX API. Check that the backend is running.";
pub const TIMEOUT_MESSAGE: &str = "LedgerX API did not respond in time.";

/// Message the server put in the body, if any.
///
/// Accepts a JSON object with a non-blank `message` field, a bare JSON string,
/// or a non-blank plain-text body.
#[must_use]
pub fn extract_backend_message(body: &ResponseBody) -> Option<&str> {
    let message = match body {
        ResponseBody::Empty => return None,
        ResponseBody::Text(text) => text.as_str(),
        ResponseBody::Json(value) => value
            .get("message")
            .and_then(|message| message.as_str())
            .or_else(|| value.as_str())?,
    };

    if message.trim().is_empty() {
        None
    } else {
        Some(message)
    }
}

/// Classify a non-success HTTP response.
#[must_use]
pub fn classify_status(status: u16, body: ResponseBody) -> ApiError {
    let (code, default_message) = match status {
        409 => (ApiErrorCode::Conflict, CONFLICT_MESSAGE.to_string()),
        422 => (
            ApiErrorCode::InsufficientFunds,
            INSUFFICIENT_FUNDS_MESSAGE.to_string(),
        ),
        404 => (ApiErrorCode::NotFound, NOT_FOUND_MESSAGE.to_string()),
        400 => (ApiErrorCode::BadRequest, BAD_REQUEST_MESSAGE.to_string()),
        other => (
            ApiErrorCode::HttpError,
            format!("Request failed with HTTP {other}."),
        ),
    };

    let message = extract_backend_message(&body)
        .map(ToString::to_string)
        .unwrap_or(default_message);

    ApiError::new(code, Some(status), message, body)
}

/// Classify a transport-level failure (connect, timeout, broken body stream).
#[must_use]
pub fn transport_error(error: &reqwest::Error) -> ApiError {
    let message = if error.is_timeout() {
        TIMEOUT_MESSAGE
    } else {
        NETWORK_MESSAGE
    };
    ApiError::new(
        ApiErrorCode::NetworkError,
        None,
        message,
        ResponseBody::Text(error.to_string()),
    )
}
