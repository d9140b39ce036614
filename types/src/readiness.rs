use std::fmt;

use serde::{Deserialize, Serialize};

/// Reachability of the remote ledger service for the current session.
///
/// `Ready` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendState {
    #[default]
    Waking,
    Ready,
    Error,
}

impl BackendState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waking => "waking",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Waking)
    }
}

impl fmt::Display for BackendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Waking,
    Ready,
    Error,
}

/// A readiness notice for human display. Purely observational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeState {
    pub kind: NoticeKind,
    pub message: String,
}

impl NoticeState {
    #[must_use]
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Direction of the last balance change, for highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlashDirection {
    Up,
    Down,
}

impl FlashDirection {
    /// Direction from `previous` to `next`, or `None` when unchanged.
    #[must_use]
    pub fn between(previous: f64, next: f64) -> Option<Self> {
        if next > previous {
            Some(Self::Up)
        } else if next < previous {
            Some(Self::Down)
        } else {
            None
        }
    }
}
