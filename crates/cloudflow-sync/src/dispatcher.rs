//! In-process pub/sub fan-out for push-channel events.
//!
//! Consumers register per-kind callbacks and get a [`Subscription`] guard
//! back; dropping the guard unregisters the callback. Publish stamps the
//! payload with an arrival timestamp, then invokes every matching callback
//! synchronously in registration order. A panicking callback is isolated
//! and logged; remaining callbacks still run.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use cloudflow_core::events::{DispatchedEvent, EventKind, PushEvent};
use parking_lot::Mutex;
use tracing::{trace, warn};

type Callback = Arc<dyn Fn(&DispatchedEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: HashMap<EventKind, Vec<(u64, Callback)>>,
}

impl Registry {
    fn remove(&mut self, kind: EventKind, id: u64) {
        if let Some(entries) = self.subscribers.get_mut(&kind) {
            entries.retain(|(entry_id, _)| *entry_id != id);
            if entries.is_empty() {
                let _ = self.subscribers.remove(&kind);
            }
        }
    }
}

/// Per-kind callback fan-out. Cheap to clone; clones share one registry.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    registry: Arc<Mutex<Registry>>,
}

impl EventDispatcher {
    /// Create an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for events of `kind`.
    ///
    /// The callback stays registered until the returned [`Subscription`]
    /// is dropped. Callbacks run on the publisher's task, so they should
    /// hand heavy work off to a channel rather than block.
    #[must_use]
    pub fn subscribe(
        &self,
        kind: EventKind,
        callback: impl Fn(&DispatchedEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry
            .subscribers
            .entry(kind)
            .or_default()
            .push((id, Arc::new(callback)));
        Subscription {
            kind,
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Stamp `payload` with the current timestamp and deliver it to every
    /// callback registered for its kind. Returns the delivery count.
    ///
    /// Callbacks are snapshotted before invocation, so a callback may
    /// subscribe or unsubscribe without deadlocking; registry changes take
    /// effect from the next publish.
    pub fn publish(&self, payload: PushEvent) -> usize {
        let event = DispatchedEvent::now(payload);
        let kind = event.kind();
        let callbacks: Vec<Callback> = {
            let registry = self.registry.lock();
            registry
                .subscribers
                .get(&kind)
                .map(|entries| entries.iter().map(|(_, cb)| Arc::clone(cb)).collect())
                .unwrap_or_default()
        };
        trace!(%kind, subscribers = callbacks.len(), "publishing event");
        for callback in &callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(&event))).is_err() {
                warn!(%kind, "event callback panicked; continuing with remaining subscribers");
            }
        }
        callbacks.len()
    }

    /// Number of callbacks currently registered for `kind`.
    #[must_use]
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.registry
            .lock()
            .subscribers
            .get(&kind)
            .map_or(0, Vec::len)
    }
}

/// Registration guard returned by [`EventDispatcher::subscribe`].
///
/// Dropping it removes the callback. Holds only a weak reference to the
/// registry, so a leaked guard never keeps a dispatcher alive.
pub struct Subscription {
    kind: EventKind,
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().remove(self.kind, self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .finish()
    }
}
