//! `gatehouse-events`: application-lifetime broadcast channels.
//!
//! The bus here is the write path for session invalidation: any collaborator
//! may publish, subscribers react. Subscriptions are RAII handles.

pub mod bus;
pub mod in_memory_bus;
pub mod signal;

pub use bus::{EventBus, Handler, Subscription, SubscriptionId};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use signal::{SessionSignal, SignalBus, UNAUTHORIZED_EVENT};
