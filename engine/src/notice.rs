//! The readiness notice shown to the user.
//!
//! At most one notice is visible at a time. A "ready" notice is a flash: it
//! clears itself after a delay unless another notice replaces it first.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use ledgerx_types::{NoticeKind, NoticeState};

use crate::timers::Timers;

pub struct NoticeBoard {
    tx: Arc<watch::Sender<Option<NoticeState>>>,
    flash_timer: Timers<()>,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            tx: Arc::new(tx),
            flash_timer: Timers::new(),
        }
    }
}

impl std::fmt::Debug for NoticeBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoticeBoard")
            .field("current", &*self.tx.borrow())
            .finish_non_exhaustive()
    }
}

impl NoticeBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<NoticeState>> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn current(&self) -> Option<NoticeState> {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn is_showing(&self, kind: NoticeKind) -> bool {
        self.tx
            .borrow()
            .as_ref()
            .is_some_and(|notice| notice.kind == kind)
    }

    /// Show a persistent notice, canceling any pending flash clear.
    ///
    /// Re-showing an identical notice does not wake subscribers.
    pub fn show(&self, notice: NoticeState) {
        self.flash_timer.cancel(&());
        self.tx.send_if_modified(|current| {
            if current.as_ref() == Some(&notice) {
                return false;
            }
            *current = Some(notice);
            true
        });
    }

    /// Show `notice` and clear it after `duration`.
    pub fn flash(&self, notice: NoticeState, duration: Duration) {
        self.show(notice.clone());
        let tx = Arc::clone(&self.tx);
        self.flash_timer.replace((), duration, move || {
            tx.send_if_modified(|current| {
                if current.as_ref() != Some(&notice) {
                    return false;
                }
                *current = None;
                true
            });
        });
    }

    pub fn clear(&self) {
        self.flash_timer.cancel(&());
        self.tx.send_if_modified(|current| current.take().is_some());
    }

    pub fn cancel_flash(&self) {
        self.flash_timer.cancel(&());
    }
}
