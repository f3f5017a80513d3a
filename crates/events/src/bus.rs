//! Event publishing/subscription abstraction (mechanics only).
//!
//! This module provides the **broadcast pattern** used across the application:
//! a publisher announces a message, every live subscriber is invoked with it.
//!
//! ## Design Philosophy
//!
//! - **Callback delivery**: subscribers are plain handlers invoked on the
//!   publishing thread. In a UI this is the event loop, so delivery is
//!   synchronous and ordered.
//! - **No payload assumptions**: the message type is generic; session signals
//!   carry no data at all.
//! - **Scoped registration**: `subscribe()` returns a [`Subscription`] that
//!   deregisters the handler when dropped, including on early return or panic
//!   unwinding.
//!
//! Handlers must be idempotent. A signal may be published several times for
//! one underlying condition (e.g. several API calls failing at once).

use std::sync::Arc;

/// Handler invoked for every published message.
pub type Handler<M> = Arc<dyn Fn(&M) + Send + Sync>;

/// Identity of a registered handler within one bus.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A live registration on a bus.
///
/// Dropping the subscription removes the handler. There is no way to leak a
/// registration by forgetting to call a cleanup function; use
/// [`Subscription::unsubscribe`] to make the release point explicit.
///
/// ## Usage Pattern
///
/// ```ignore
/// let bus = InMemoryEventBus::<SessionSignal>::new();
/// let _sub = bus.subscribe(Arc::new(|signal: &SessionSignal| {
///     tracing::info!(?signal, "received");
/// }));
/// bus.publish(SessionSignal::Unauthorized)?;
/// // `_sub` dropped at end of scope -> handler removed
/// ```
#[must_use = "dropping a Subscription immediately deregisters its handler"]
pub struct Subscription {
    id: SubscriptionId,
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(id: SubscriptionId, release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            id,
            release: Some(Box::new(release)),
        }
    }

    /// A subscription that was never attached to a bus.
    pub fn detached(id: SubscriptionId) -> Self {
        Self { id, release: None }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Deregister now.
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("attached", &self.release.is_some())
            .finish()
    }
}

/// Domain-agnostic broadcast bus (pub/sub abstraction).
///
/// ## Delivery
///
/// `publish()` invokes every handler registered at the time of the call and
/// returns how many were invoked. Handlers registered or removed by another
/// handler during delivery take effect from the next publish.
///
/// ## Thread Safety
///
/// The trait requires `Send + Sync` so one bus instance can be shared through
/// `Arc` by every collaborator that needs to publish.
pub trait EventBus: Send + Sync {
    type Message;
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: Self::Message) -> Result<usize, Self::Error>;

    fn subscribe(&self, handler: Handler<Self::Message>) -> Subscription;

    /// Number of live handlers.
    fn subscriber_count(&self) -> usize;
}

impl<B> EventBus for Arc<B>
where
    B: EventBus + ?Sized,
{
    type Message = B::Message;
    type Error = B::Error;

    fn publish(&self, message: Self::Message) -> Result<usize, Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self, handler: Handler<Self::Message>) -> Subscription {
        (**self).subscribe(handler)
    }

    fn subscriber_count(&self) -> usize {
        (**self).subscriber_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn drop_runs_release_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let sub = Subscription::new(SubscriptionId::new(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(sub.id().as_u64(), 1);
        drop(sub);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn explicit_unsubscribe_does_not_release_twice() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let sub = Subscription::new(SubscriptionId::new(7), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sub.unsubscribe();
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn release_runs_on_early_exit() {
        fn early_exit(released: Arc<AtomicUsize>) -> Result<(), &'static str> {
            let _sub = Subscription::new(SubscriptionId::new(2), move || {
                released.fetch_add(1, Ordering::SeqCst);
            });
            Err("bail")
        }

        let released = Arc::new(AtomicUsize::new(0));
        assert!(early_exit(released.clone()).is_err());
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}
