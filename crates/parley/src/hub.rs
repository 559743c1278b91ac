// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broadcast hub: fans each published event out to every live subscriber.
//!
//! Subscribers live in a table keyed by opaque [`SubscriberId`]s, each with
//! its own bounded queue. `publish` never blocks: it takes the table's read
//! lock for one pass of `try_send`, and a subscriber whose queue is full
//! simply misses that event. A subscriber that registers while a publish is
//! in flight may or may not receive that event.
//!
//! [`Subscription`] removes its own entry when dropped, so a stream that
//! ends for any reason releases its slot.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

/// Opaque handle identifying one registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Per-call delivery counts from [`BroadcastHub::publish`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers whose queue accepted the event.
    pub delivered: usize,
    /// Subscribers that missed the event because their queue was full.
    pub dropped: usize,
    /// Subscribers whose receiving side is already gone.
    pub closed: usize,
}

struct HubInner<T> {
    subscribers: RwLock<HashMap<SubscriberId, mpsc::Sender<T>>>,
    next_id: AtomicU64,
    capacity: usize,
    dropped_total: AtomicU64,
}

impl<T> HubInner<T> {
    fn remove(&self, id: SubscriberId) -> bool {
        self.subscribers.write().remove(&id).is_some()
    }
}

/// Fan-out hub over a dynamic set of subscribers. Cheap to clone.
pub struct BroadcastHub<T> {
    inner: Arc<HubInner<T>>,
}

impl<T> Clone for BroadcastHub<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T: Clone + Send + 'static> BroadcastHub<T> {
    /// Create a hub whose subscribers each buffer at most `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                subscribers: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                capacity: capacity.max(1),
                dropped_total: AtomicU64::new(0),
            }),
        }
    }

    /// Add a subscriber with its own delivery queue.
    pub fn register(&self) -> Subscription<T> {
        let id = SubscriberId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.inner.capacity);
        self.inner.subscribers.write().insert(id, tx);
        debug!(subscriber = %id, "subscriber registered");
        Subscription { id, rx, hub: Arc::downgrade(&self.inner) }
    }

    /// Remove a subscriber. Returns `false` if it was already gone.
    ///
    /// Once this returns, no later `publish` will deliver to `id`.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let removed = self.inner.remove(id);
        if removed {
            debug!(subscriber = %id, "subscriber unregistered");
        }
        removed
    }

    /// Offer `event` to every subscriber registered when delivery starts.
    pub fn publish(&self, event: &T) -> PublishReport {
        let mut report = PublishReport::default();
        let subscribers = self.inner.subscribers.read();
        for (id, tx) in subscribers.iter() {
            match tx.try_send(event.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    debug!(subscriber = %id, "subscriber queue full, dropping event");
                    report.dropped += 1;
                }
                Err(TrySendError::Closed(_)) => report.closed += 1,
            }
        }
        drop(subscribers);

        if report.dropped > 0 {
            self.inner.dropped_total.fetch_add(report.dropped as u64, Ordering::Relaxed);
        }
        report
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }

    /// Events dropped for full queues since the hub was created.
    pub fn dropped_total(&self) -> u64 {
        self.inner.dropped_total.load(Ordering::Relaxed)
    }
}

/// Receiving side of one registration. Unregisters itself on drop.
pub struct Subscription<T> {
    id: SubscriberId,
    rx: mpsc::Receiver<T>,
    hub: Weak<HubInner<T>>,
}

impl<T> Subscription<T> {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next delivered event. `None` once this subscriber has
    /// been unregistered (and drained) or the hub is gone.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Take an already-delivered event without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            if hub.remove(self.id) {
                debug!(subscriber = %self.id, "subscriber released");
            }
        }
    }
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;
