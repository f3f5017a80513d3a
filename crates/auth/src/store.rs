//! Process-wide Permission/Role store.
//!
//! The store owns the actor's permission and role sets. It is constructed
//! explicitly and shared through `Arc`; tests build isolated instances.
//!
//! Writes never patch: every `set_actor_authorization` builds a fresh
//! [`AuthorizationSnapshot`] and swaps it in whole, so a reader sees either the
//! old sets or the new ones. Listeners are notified after the swap, on the
//! writing thread, before the write call returns.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use gatehouse_events::{EventBus, InMemoryEventBus, Subscription};

use crate::evaluator::{self, NameQuery};
use crate::names::{NameEntry, Permission, Role, normalize};

/// Immutable view of the actor's grants at one revision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationSnapshot {
    permissions: HashSet<Permission>,
    roles: HashSet<Role>,
    revision: u64,
}

impl AuthorizationSnapshot {
    pub fn new<P, R>(permissions: P, roles: R) -> Self
    where
        P: IntoIterator,
        P::Item: Into<NameEntry>,
        R: IntoIterator,
        R::Item: Into<NameEntry>,
    {
        Self {
            permissions: normalize(permissions).map(Permission::new).collect(),
            roles: normalize(roles).map(Role::new).collect(),
            revision: 0,
        }
    }

    pub fn contains_permission(&self, name: &str) -> bool {
        self.permissions.contains(name)
    }

    pub fn contains_role(&self, name: &str) -> bool {
        self.roles.contains(name)
    }

    pub fn permissions(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.iter()
    }

    /// Sorted permission names (stable output for logs and display).
    pub fn permission_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.permissions.iter().map(Permission::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Sorted role names.
    pub fn role_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.roles.iter().map(Role::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty() && self.roles.is_empty()
    }

    /// Monotonic write counter of the store that produced this snapshot.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Same grants, ignoring revision.
    pub fn same_grants(&self, other: &Self) -> bool {
        self.permissions == other.permissions && self.roles == other.roles
    }
}

/// Notification delivered to store listeners after a write.
#[derive(Debug, Clone)]
pub enum AuthorizationChange {
    Replaced(Arc<AuthorizationSnapshot>),
    Cleared(Arc<AuthorizationSnapshot>),
}

impl AuthorizationChange {
    pub fn snapshot(&self) -> &Arc<AuthorizationSnapshot> {
        match self {
            AuthorizationChange::Replaced(s) | AuthorizationChange::Cleared(s) => s,
        }
    }
}

/// Permission/Role store with an explicit set/clear lifecycle.
#[derive(Debug, Default)]
pub struct AuthorizationStore {
    current: RwLock<Arc<AuthorizationSnapshot>>,
    changes: InMemoryEventBus<AuthorizationChange>,
}

impl AuthorizationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace both sets. Not a merge.
    ///
    /// Entries may be bare names or `{name}` objects; empty entries are
    /// dropped silently.
    pub fn set_actor_authorization<P, R>(&self, permissions: P, roles: R)
    where
        P: IntoIterator,
        P::Item: Into<NameEntry>,
        R: IntoIterator,
        R::Item: Into<NameEntry>,
    {
        let next = AuthorizationSnapshot::new(permissions, roles);
        let snapshot = self.swap(next);
        tracing::debug!(
            revision = snapshot.revision(),
            permissions = snapshot.permissions.len(),
            roles = snapshot.roles.len(),
            "actor authorization replaced"
        );
        self.notify(AuthorizationChange::Replaced(snapshot));
    }

    /// Reset both sets to empty.
    pub fn clear(&self) {
        let snapshot = self.swap(AuthorizationSnapshot::default());
        tracing::debug!(revision = snapshot.revision(), "actor authorization cleared");
        self.notify(AuthorizationChange::Cleared(snapshot));
    }

    pub fn snapshot(&self) -> Arc<AuthorizationSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn has_permission(&self, query: impl Into<NameQuery>) -> bool {
        evaluator::has_permission(&self.snapshot(), query)
    }

    pub fn has_role(&self, query: impl Into<NameQuery>) -> bool {
        evaluator::has_role(&self.snapshot(), query)
    }

    /// Register a change listener. Dropping the subscription removes it.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&AuthorizationChange) + Send + Sync + 'static,
    {
        self.changes.subscribe(Arc::new(handler))
    }

    pub fn listener_count(&self) -> usize {
        self.changes.subscriber_count()
    }

    fn swap(&self, mut next: AuthorizationSnapshot) -> Arc<AuthorizationSnapshot> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        next.revision = current.revision + 1;
        let next = Arc::new(next);
        *current = next.clone();
        next
    }

    fn notify(&self, change: AuthorizationChange) {
        if let Err(e) = self.changes.publish(change) {
            tracing::warn!(error = ?e, "authorization change notification failed");
        }
    }
}
