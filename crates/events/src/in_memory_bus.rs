//! In-memory broadcast bus.

use std::sync::{Arc, Mutex, Weak};

use thiserror::Error;

use crate::bus::{EventBus, Handler, Subscription, SubscriptionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InMemoryBusError {
    /// Publish failed due to internal lock poisoning.
    #[error("event bus registry lock poisoned")]
    Poisoned,
}

struct Registry<M> {
    next_id: u64,
    handlers: Vec<(SubscriptionId, Handler<M>)>,
}

impl<M> Default for Registry<M> {
    fn default() -> Self {
        Self {
            next_id: 1,
            handlers: Vec::new(),
        }
    }
}

/// In-memory pub/sub bus.
///
/// - No IO / no async
/// - Handlers run on the publishing thread, outside the registry lock
/// - Subscriptions hold only a weak reference, so a dropped bus never keeps
///   handlers alive and a late unsubscribe is a no-op
pub struct InMemoryEventBus<M> {
    registry: Arc<Mutex<Registry<M>>>,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }
}

impl<M> core::fmt::Debug for InMemoryEventBus<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let subscribers = self
            .registry
            .lock()
            .map(|r| r.handlers.len())
            .unwrap_or_default();
        f.debug_struct("InMemoryEventBus")
            .field("subscribers", &subscribers)
            .finish()
    }
}

fn release<M>(registry: Weak<Mutex<Registry<M>>>, id: SubscriptionId) {
    let Some(registry) = registry.upgrade() else {
        return;
    };
    // Never propagate a poisoned lock out of a destructor.
    let mut guard = match registry.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    guard.handlers.retain(|(existing, _)| *existing != id);
    tracing::trace!(subscription = %id, "handler released");
}

impl<M> EventBus for InMemoryEventBus<M>
where
    M: 'static,
{
    type Message = M;
    type Error = InMemoryBusError;

    fn publish(&self, message: M) -> Result<usize, Self::Error> {
        // Snapshot the handlers so they can publish or unsubscribe re-entrantly.
        let handlers: Vec<Handler<M>> = {
            let registry = self.registry.lock().map_err(|_| InMemoryBusError::Poisoned)?;
            registry.handlers.iter().map(|(_, h)| h.clone()).collect()
        };

        for handler in &handlers {
            handler(&message);
        }

        Ok(handlers.len())
    }

    fn subscribe(&self, handler: Handler<M>) -> Subscription {
        // If the lock is poisoned, we still return a subscription;
        // it just won't receive messages.
        let Ok(mut registry) = self.registry.lock() else {
            tracing::warn!("event bus poisoned; returning detached subscription");
            return Subscription::detached(SubscriptionId::new(0));
        };

        let id = SubscriptionId::new(registry.next_id);
        registry.next_id += 1;
        registry.handlers.push((id, handler));
        drop(registry);

        let weak = Arc::downgrade(&self.registry);
        Subscription::new(id, move || release(weak, id))
    }

    fn subscriber_count(&self) -> usize {
        self.registry
            .lock()
            .map(|r| r.handlers.len())
            .unwrap_or_default()
    }
}
