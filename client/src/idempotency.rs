//! Idempotency tokens for transfer submission.
//!
//! Every call to [`crate::LedgerClient::submit_transfer`] mints a fresh token.
//! Tokens are never shared between logically separate calls, fan-out
//! iterations included; deduplication is done by the ledger service, keyed on
//! the header value it receives.

use std::fmt;

use reqwest::RequestBuilder;
use uuid::Uuid;

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// A random 128-bit token sent as the `Idempotency-Key` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdempotencyKey(Uuid);

impl IdempotencyKey {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Attach this key to an outgoing request.
    pub fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(IDEMPOTENCY_KEY_HEADER, self.0.to_string())
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
