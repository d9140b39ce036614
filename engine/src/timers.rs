//! Keyed, cancelable one-shot timers.
//!
//! Each key holds at most one pending timer. Arming a key again aborts the
//! previous timer; the generation check under the map lock guarantees that a
//! superseded timer never runs its callback, even if it already woke up.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

struct Slot {
    generation: u64,
    handle: JoinHandle<()>,
}

type SlotMap<K> = Arc<Mutex<HashMap<K, Slot>>>;

fn lock<K>(slots: &Mutex<HashMap<K, Slot>>) -> MutexGuard<'_, HashMap<K, Slot>> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Timers<K> {
    slots: SlotMap<K>,
    next_generation: AtomicU64,
}

impl<K> Default for Timers<K> {
    fn default() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }
}

impl<K> std::fmt::Debug for Timers<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timers")
            .field("pending", &lock(&self.slots).len())
            .finish()
    }
}

impl<K> Timers<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `key` to run `callback` after `delay`, canceling whatever was pending.
    ///
    /// The callback runs while the timer map is locked, so it must not call back
    /// into this `Timers`.
    pub fn replace<F>(&self, key: K, delay: Duration, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let slots = Arc::clone(&self.slots);
        let task_key = key.clone();

        let mut guard = lock(&self.slots);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut guard = lock(&slots);
            let current = guard
                .get(&task_key)
                .is_some_and(|slot| slot.generation == generation);
            if current {
                guard.remove(&task_key);
                callback();
            }
        });
        if let Some(previous) = guard.insert(key, Slot { generation, handle }) {
            previous.handle.abort();
        }
    }

    /// Cancel the pending timer for `key`. Returns whether one was pending.
    pub fn cancel(&self, key: &K) -> bool {
        match lock(&self.slots).remove(key) {
            Some(slot) => {
                slot.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        for (_, slot) in lock(&self.slots).drain() {
            slot.handle.abort();
        }
    }

    #[must_use]
    pub fn is_pending(&self, key: &K) -> bool {
        lock(&self.slots).contains_key(key)
    }
}

impl<K> Drop for Timers<K> {
    fn drop(&mut self) {
        for (_, slot) in lock(&self.slots).drain() {
            slot.handle.abort();
        }
    }
}
