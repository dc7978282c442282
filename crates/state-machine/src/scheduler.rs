//! Keyed debouncing of remote writes
//!
//! Each key owns one slot holding the latest pending payload and a timer.
//! Scheduling overwrites the payload and restarts the timer; when the timer
//! fires it persists whatever the slot holds at that moment. Keys never
//! interfere with each other, and a slot only lives while it has a payload.
//!
//! A timer is only ever aborted while it is still sleeping: the fired task
//! removes its slot under the lock before it starts persisting, so an
//! in-flight write always runs to completion.

use futures::FutureExt;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

type PersistFn<V> = dyn Fn(String, V) -> BoxFuture<'static, bool> + Send + Sync;
type CurrentFn<V> = dyn Fn(&V) -> Option<V> + Send + Sync;

struct Slot<V> {
    pending: V,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

struct Inner<V> {
    window: Duration,
    persist: Box<PersistFn<V>>,
    current: Option<Box<CurrentFn<V>>>,
    slots: Mutex<HashMap<String, Slot<V>>>,
    // never reused, so a timer can't match a slot created after its own
    generations: AtomicU64,
}

/// Coalesces bursts of values per key into a single persist call
pub struct Debouncer<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for Debouncer<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Debouncer<V>
where
    V: Clone + PartialEq + Send + 'static,
{
    /// `persist` returns whether the value reached the store
    pub fn new<F, Fut>(window: Duration, persist: F) -> Self
    where
        F: Fn(String, V) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self::build(window, persist, None)
    }

    /// Like [`Debouncer::new`], skipping values equal to what is stored
    ///
    /// `current` maps a due value to the value persisted for the same
    /// entity right now. It is asked when the timer fires, so writes made
    /// around the debouncer are taken into account.
    pub fn with_current<F, Fut, C>(window: Duration, persist: F, current: C) -> Self
    where
        F: Fn(String, V) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
        C: Fn(&V) -> Option<V> + Send + Sync + 'static,
    {
        Self::build(window, persist, Some(Box::new(current)))
    }

    fn build<F, Fut>(window: Duration, persist: F, current: Option<Box<CurrentFn<V>>>) -> Self
    where
        F: Fn(String, V) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                window,
                persist: Box::new(move |key: String, value: V| persist(key, value).boxed()),
                current,
                slots: Mutex::new(HashMap::new()),
                generations: AtomicU64::new(0),
            }),
        }
    }

    pub fn window(&self) -> Duration {
        self.inner.window
    }

    /// Store `value` as the latest payload for `key` and restart its timer
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let generation = self.inner.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let mut slots = self.inner.lock();
        let inner = Arc::clone(&self.inner);
        let timer_key = key.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(inner.window).await;
            if let Some(value) = inner.take_due(&timer_key, Some(generation)) {
                inner.persist(timer_key, value).await;
            }
        });
        let previous = slots.insert(
            key,
            Slot {
                pending: value,
                generation,
                timer: Some(timer),
            },
        );
        if let Some(timer) = previous.and_then(|slot| slot.timer) {
            timer.abort();
        }
        tracing::trace!(generation, "Debounced write rescheduled");
    }

    /// Persist the pending value of `key` now instead of waiting for its timer
    pub async fn flush(&self, key: &str) -> bool {
        match self.inner.take_due(key, None) {
            Some(value) => self.inner.persist(key.to_string(), value).await,
            None => false,
        }
    }

    pub async fn flush_all(&self) -> usize {
        let mut flushed = 0;
        for key in self.pending_keys() {
            if self.flush(&key).await {
                flushed += 1;
            }
        }
        flushed
    }

    /// Drop the pending value of `key` without persisting it
    pub fn cancel(&self, key: &str) -> bool {
        let Some(slot) = self.inner.lock().remove(key) else {
            return false;
        };
        if let Some(timer) = slot.timer {
            timer.abort();
        }
        true
    }

    /// Keys with a value waiting to be persisted, sorted
    pub fn pending_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl<V> Inner<V>
where
    V: Clone + PartialEq,
{
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot<V>>> {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Remove the slot of `key` and hand out its value if it is still due
    ///
    /// A timer passes its generation and loses to any later `schedule`;
    /// a flush passes `None` and cancels the running timer.
    fn take_due(&self, key: &str, generation: Option<u64>) -> Option<V> {
        let mut slots = self.lock();
        if let Some(generation) = generation
            && slots.get(key)?.generation != generation
        {
            return None;
        }
        let slot = slots.remove(key)?;
        if generation.is_none()
            && let Some(timer) = slot.timer
        {
            timer.abort();
        }
        Some(slot.pending)
    }

    async fn persist(&self, key: String, value: V) -> bool {
        let unchanged = self
            .current
            .as_ref()
            .is_some_and(|current| current(&value).as_ref() == Some(&value));
        if unchanged {
            tracing::debug!(key, "Skipping write identical to the persisted value");
            return false;
        }
        (self.persist)(key, value).await
    }
}
