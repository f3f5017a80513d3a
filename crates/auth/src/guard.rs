//! Rendering guards: the access state machine behind every gated fragment.
//!
//! A guard instance moves through three explicit states:
//!
//! ```text
//!   mount ──► Unresolved ──resolve──► Granted ◄──store/props change──► Denied
//! ```
//!
//! `Unresolved` renders nothing at all, neither children nor fallback, so no
//! gated content flashes before the first client-side evaluation. Once
//! resolved, the guard re-evaluates on every requirement or store change and
//! never goes back to `Unresolved`.

use std::sync::{Arc, Mutex, PoisonError};

use gatehouse_events::Subscription;

use crate::evaluator::{NameQuery, has_permission, has_role};
use crate::store::{AuthorizationSnapshot, AuthorizationStore};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum GuardState {
    #[default]
    Unresolved,
    Granted,
    Denied,
}

/// What a guard should put on screen.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Render {
    Nothing,
    Children,
    Fallback,
}

impl GuardState {
    pub fn from_decision(granted: bool) -> Self {
        if granted {
            GuardState::Granted
        } else {
            GuardState::Denied
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, GuardState::Unresolved)
    }

    pub fn render(&self) -> Render {
        match self {
            GuardState::Unresolved => Render::Nothing,
            GuardState::Granted => Render::Children,
            GuardState::Denied => Render::Fallback,
        }
    }
}

/// An access requirement a guard checks against a snapshot.
pub trait Requirement {
    /// Nothing configured; the guard is vacuously granted.
    fn is_unconstrained(&self) -> bool;

    fn evaluate(&self, snapshot: &AuthorizationSnapshot) -> bool;
}

fn configured(query: &Option<NameQuery>) -> Option<&NameQuery> {
    query.as_ref().filter(|q| !q.is_empty())
}

/// Role-only guard requirement.
///
/// `role` and `any_roles` combine disjunctively: matching either is enough.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleRequirement {
    pub role: Option<String>,
    pub any_roles: Option<Vec<String>>,
}

impl RoleRequirement {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn role(role: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            any_roles: None,
        }
    }

    pub fn any_of<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            role: None,
            any_roles: Some(roles.into_iter().map(Into::into).collect()),
        }
    }

    fn queries(&self) -> [Option<NameQuery>; 2] {
        [
            self.role.clone().map(NameQuery::One),
            self.any_roles.clone().map(NameQuery::Any),
        ]
    }
}

impl Requirement for RoleRequirement {
    fn is_unconstrained(&self) -> bool {
        self.queries().iter().all(|q| configured(q).is_none())
    }

    fn evaluate(&self, snapshot: &AuthorizationSnapshot) -> bool {
        if self.is_unconstrained() {
            return true;
        }
        self.queries()
            .iter()
            .filter_map(configured)
            .any(|q| has_role(snapshot, q))
    }
}

/// Permission-or-role guard requirement.
///
/// Granted when the actor holds any listed permission OR any listed role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessRequirement {
    pub permissions: Option<NameQuery>,
    pub roles: Option<NameQuery>,
}

impl AccessRequirement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn permissions(mut self, query: impl Into<NameQuery>) -> Self {
        self.permissions = Some(query.into());
        self
    }

    pub fn roles(mut self, query: impl Into<NameQuery>) -> Self {
        self.roles = Some(query.into());
        self
    }
}

impl Requirement for AccessRequirement {
    fn is_unconstrained(&self) -> bool {
        configured(&self.permissions).is_none() && configured(&self.roles).is_none()
    }

    fn evaluate(&self, snapshot: &AuthorizationSnapshot) -> bool {
        if self.is_unconstrained() {
            return true;
        }
        let by_permission = configured(&self.permissions).is_some_and(|q| has_permission(snapshot, q));
        let by_role = configured(&self.roles).is_some_and(|q| has_role(snapshot, q));
        by_permission || by_role
    }
}

/// One guard instance (one mount).
#[derive(Debug, Clone)]
pub struct Guard<R> {
    requirement: R,
    state: GuardState,
}

impl<R: Requirement> Guard<R> {
    /// Mount a guard. Starts `Unresolved`.
    pub fn new(requirement: R) -> Self {
        Self {
            requirement,
            state: GuardState::Unresolved,
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    pub fn requirement(&self) -> &R {
        &self.requirement
    }

    pub fn render(&self) -> Render {
        self.state.render()
    }

    /// First client-side evaluation.
    pub fn resolve(&mut self, snapshot: &AuthorizationSnapshot) -> GuardState {
        self.state = GuardState::from_decision(self.requirement.evaluate(snapshot));
        self.state
    }

    /// Props changed. Re-evaluates only once resolved.
    pub fn set_requirement(&mut self, requirement: R, snapshot: &AuthorizationSnapshot) -> GuardState {
        self.requirement = requirement;
        self.store_changed(snapshot)
    }

    /// The store changed. Re-evaluates only once resolved.
    pub fn store_changed(&mut self, snapshot: &AuthorizationSnapshot) -> GuardState {
        if self.state.is_resolved() {
            self.resolve(snapshot);
        }
        self.state
    }
}

/// A guard bound to a live store.
///
/// Store writes re-evaluate the guard synchronously inside the write call, so
/// the next render never sees a stale decision. The store subscription is
/// released when this value is dropped.
pub struct WatchedGuard<R> {
    guard: Arc<Mutex<Guard<R>>>,
    store: Arc<AuthorizationStore>,
    _subscription: Subscription,
}

impl<R> WatchedGuard<R>
where
    R: Requirement + Send + 'static,
{
    pub fn mount(store: Arc<AuthorizationStore>, requirement: R) -> Self {
        let guard = Arc::new(Mutex::new(Guard::new(requirement)));

        let weak = Arc::downgrade(&guard);
        let subscription = store.subscribe(move |change| {
            if let Some(guard) = weak.upgrade() {
                guard
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .store_changed(change.snapshot());
            }
        });

        Self {
            guard,
            store,
            _subscription: subscription,
        }
    }

    pub fn resolve(&self) -> GuardState {
        let snapshot = self.store.snapshot();
        self.lock().resolve(&snapshot)
    }

    pub fn set_requirement(&self, requirement: R) -> GuardState {
        let snapshot = self.store.snapshot();
        self.lock().set_requirement(requirement, &snapshot)
    }

    pub fn state(&self) -> GuardState {
        self.lock().state()
    }

    pub fn render(&self) -> Render {
        self.lock().render()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Guard<R>> {
        self.guard.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(perms: &[&str], roles: &[&str]) -> Arc<AuthorizationStore> {
        let store = Arc::new(AuthorizationStore::new());
        store.set_actor_authorization(perms.iter().copied(), roles.iter().copied());
        store
    }

    #[test]
    fn renders_nothing_before_resolution() {
        let guard = Guard::new(RoleRequirement::role("admin"));
        assert_eq!(guard.state(), GuardState::Unresolved);
        assert_eq!(guard.render(), Render::Nothing);
    }

    #[test]
    fn unconstrained_guard_is_granted() {
        let store = store_with(&[], &[]);
        let mut role_guard = Guard::new(RoleRequirement::none());
        let mut access_guard = Guard::new(AccessRequirement::new());
        assert_eq!(role_guard.resolve(&store.snapshot()), GuardState::Granted);
        assert_eq!(access_guard.resolve(&store.snapshot()), GuardState::Granted);
    }

    #[test]
    fn empty_lists_count_as_unconstrained() {
        let store = store_with(&[], &[]);
        let mut guard = Guard::new(AccessRequirement::new().permissions(Vec::<String>::new()));
        assert_eq!(guard.resolve(&store.snapshot()), GuardState::Granted);
    }

    #[test]
    fn role_guard_matches_role_or_any_roles() {
        let store = store_with(&[], &["editor"]);
        let snapshot = store.snapshot();

        assert!(RoleRequirement::role("editor").evaluate(&snapshot));
        assert!(RoleRequirement::any_of(["admin", "editor"]).evaluate(&snapshot));
        assert!(!RoleRequirement::any_of(["admin"]).evaluate(&snapshot));

        let both = RoleRequirement {
            role: Some("admin".into()),
            any_roles: Some(vec!["editor".into()]),
        };
        assert!(both.evaluate(&snapshot));
    }

    #[test]
    fn access_guard_denies_role_only_actor_for_permission_requirement() {
        let store = store_with(&[], &["editor"]);
        let mut guard = Guard::new(AccessRequirement::new().permissions(["manage_users"]));
        assert_eq!(guard.resolve(&store.snapshot()), GuardState::Denied);
        assert_eq!(guard.render(), Render::Fallback);
    }

    #[test]
    fn access_guard_grants_with_permission() {
        let store = store_with(&["manage_users"], &[]);
        let mut guard = Guard::new(AccessRequirement::new().permissions(["manage_users"]));
        assert_eq!(guard.resolve(&store.snapshot()), GuardState::Granted);
        assert_eq!(guard.render(), Render::Children);
    }

    #[test]
    fn access_guard_accepts_permission_or_role() {
        let store = store_with(&[], &["admin"]);
        let requirement = AccessRequirement::new()
            .permissions("manage_users")
            .roles(["admin", "owner"]);
        assert!(requirement.evaluate(&store.snapshot()));
    }

    #[test]
    fn requirement_change_re_evaluates() {
        let store = store_with(&["view_reports"], &[]);
        let mut guard = Guard::new(AccessRequirement::new().permissions("view_reports"));
        guard.resolve(&store.snapshot());
        assert_eq!(guard.state(), GuardState::Granted);

        let state = guard.set_requirement(AccessRequirement::new().permissions("manage_users"), &store.snapshot());
        assert_eq!(state, GuardState::Denied);
    }

    #[test]
    fn unresolved_guard_stays_unresolved_on_changes() {
        let store = store_with(&["a"], &[]);
        let mut guard = Guard::new(AccessRequirement::new().permissions("a"));
        guard.store_changed(&store.snapshot());
        assert_eq!(guard.state(), GuardState::Unresolved);
    }

    #[test]
    fn watched_guard_follows_store_writes() {
        let store = store_with(&["manage_users"], &[]);
        let guard = WatchedGuard::mount(store.clone(), AccessRequirement::new().permissions("manage_users"));

        assert_eq!(guard.render(), Render::Nothing);
        assert_eq!(guard.resolve(), GuardState::Granted);

        store.clear();
        assert_eq!(guard.state(), GuardState::Denied);

        store.set_actor_authorization(["manage_users"], Vec::<&str>::new());
        assert_eq!(guard.state(), GuardState::Granted);
    }

    #[test]
    fn dropped_watched_guard_releases_subscription() {
        let store = store_with(&[], &[]);
        let guard = WatchedGuard::mount(store.clone(), RoleRequirement::role("admin"));
        assert_eq!(store.listener_count(), 1);
        drop(guard);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn zero_permission_actor_is_denied_guarded_content() {
        let store = store_with(&[], &[]);
        let mut guard = Guard::new(RoleRequirement::role("admin"));
        assert_eq!(guard.resolve(&store.snapshot()), GuardState::Denied);
    }
}
