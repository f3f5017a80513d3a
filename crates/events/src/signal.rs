//! Session signals broadcast across the application.

use serde::{Deserialize, Serialize};

use crate::in_memory_bus::InMemoryEventBus;

/// Wire name of the unauthorized signal (DOM event type, log field).
pub const UNAUTHORIZED_EVENT: &str = "unauthorized";

/// A session-level announcement. Carries no payload.
///
/// Any collaborator that learns the session is no longer valid (typically the
/// API transport receiving an authorization failure) publishes `Unauthorized`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionSignal {
    Unauthorized,
}

impl SessionSignal {
    pub fn event_name(&self) -> &'static str {
        match self {
            SessionSignal::Unauthorized => UNAUTHORIZED_EVENT,
        }
    }

    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            UNAUTHORIZED_EVENT => Some(SessionSignal::Unauthorized),
            _ => None,
        }
    }
}

impl core::fmt::Display for SessionSignal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.event_name())
    }
}

/// The application-lifetime session signal bus.
pub type SignalBus = InMemoryEventBus<SessionSignal>;
