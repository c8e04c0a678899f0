//! In-process typed event bus.
//!
//! Push-based: subscribers register callbacks invoked synchronously on
//! dispatch. Unlike a bare listener list, `subscribe` hands back a
//! [`Subscription`] guard whose drop removes the callback - listener
//! lifecycle is enforced by ownership, not by convention. The scene
//! dispatcher leans on this to guarantee at most one view's listeners are
//! attached at any time.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::sync::lock;

type Callback<E> = Box<dyn Fn(&E) + Send + 'static>;

struct BusInner<E> {
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<u64, Callback<E>>>,
}

/// Typed event bus. Clones share the subscriber set.
pub struct EventBus<E> {
    inner: Arc<BusInner<E>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                next_id: AtomicU64::new(0),
                subscribers: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Register a callback; it stays attached for the lifetime of the
    /// returned [`Subscription`].
    #[must_use = "dropping the subscription unsubscribes"]
    pub fn subscribe(&self, callback: impl Fn(&E) + Send + 'static) -> Subscription<E> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.inner.subscribers).insert(id, Box::new(callback));
        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Invoke every subscriber with the event.
    pub fn dispatch(&self, event: &E) {
        let subscribers = lock(&self.inner.subscribers);
        for callback in subscribers.values() {
            callback(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner.subscribers).len()
    }
}

/// Guard for one bus subscription; dropping it unsubscribes.
pub struct Subscription<E> {
    id: u64,
    inner: Weak<BusInner<E>>,
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            lock(&inner.subscribers).remove(&self.id);
        }
    }
}
