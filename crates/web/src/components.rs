//! Leptos components: auth provider and rendering guards.
//!
//! ```no_run
//! use gatehouse_web::components::{AccessGuard, RoleGuard};
//! use leptos::*;
//!
//! fn admin_toolbar() -> impl IntoView {
//!     view! {
//!         <AccessGuard permissions="manage_users" fallback=|| "read only">
//!             <button>"Invite"</button>
//!         </AccessGuard>
//!         <AccessGuard permissions=vec!["export_reports".to_string()] roles="auditor">
//!             <a href="/admin/reports">"Reports"</a>
//!         </AccessGuard>
//!         <RoleGuard any_roles=vec!["admin".to_string(), "owner".to_string()]>
//!             <a href="/admin/settings">"Settings"</a>
//!         </RoleGuard>
//!     }
//! }
//! ```

use leptos::*;

use gatehouse_auth::{
    AccessRequirement, AuthSession, GuardState, NameQuery, Render, Requirement, RoleRequirement,
};

use crate::browser::UnauthorizedEventBridge;

/// Auth state shared with the component tree.
#[derive(Clone)]
pub struct AuthContext {
    pub session: AuthSession,
    /// Store revision; bumps on every store write.
    pub revision: ReadSignal<u64>,
}

pub fn use_auth() -> AuthContext {
    expect_context::<AuthContext>()
}

/// Wire `session` into the current reactive owner and provide [`AuthContext`].
///
/// Populates the store from the persisted record (once), registers the single
/// unauthorized listener, bridges DOM `unauthorized` events onto the bus, and
/// mirrors store writes into a signal. Everything is released when the owner
/// is cleaned up.
pub fn provide_auth(session: AuthSession) -> AuthContext {
    let (revision, set_revision) = create_signal(session.store().snapshot().revision());

    let store_subscription = session
        .store()
        .subscribe(move |change| set_revision.set(change.snapshot().revision()));
    let listener = session.bootstrap().mount();
    let bridge = UnauthorizedEventBridge::attach(session.signals().clone());

    on_cleanup(move || {
        drop(bridge);
        drop(listener);
        drop(store_subscription);
    });

    let context = AuthContext { session, revision };
    provide_context(context.clone());
    context
}

/// Mounts the authentication bootstrap for its subtree.
#[component]
pub fn AuthProvider(session: AuthSession, children: Children) -> impl IntoView {
    provide_auth(session);
    children()
}

/// Render `children` only if the actor holds `role` or any of `any_roles`.
#[component]
pub fn RoleGuard(
    #[prop(optional, into)] role: MaybeProp<String>,
    #[prop(optional, into)] any_roles: MaybeProp<Vec<String>>,
    #[prop(optional, into)] fallback: ViewFn,
    children: ChildrenFn,
) -> impl IntoView {
    let state = guard_state(move || RoleRequirement {
        role: role.get(),
        any_roles: any_roles.get(),
    });
    render_guarded(state, fallback, children)
}

/// Render `children` if the actor holds any listed permission or any listed
/// role. Each prop takes a single name or a list of names.
#[component]
pub fn AccessGuard(
    #[prop(optional, into)] permissions: Option<NameQuery>,
    #[prop(optional, into)] roles: Option<NameQuery>,
    #[prop(optional, into)] fallback: ViewFn,
    children: ChildrenFn,
) -> impl IntoView {
    let state = guard_state(move || AccessRequirement {
        permissions: permissions.clone(),
        roles: roles.clone(),
    });
    render_guarded(state, fallback, children)
}

/// Guard state for `requirement`, driven by the store revision in context.
///
/// Effects run after mount on the client, so the state stays Unresolved
/// until the first trusted evaluation. Re-evaluates when the store revision
/// or any signal read by `requirement` changes.
pub fn guard_state<R, F>(requirement: F) -> ReadSignal<GuardState>
where
    R: Requirement + 'static,
    F: Fn() -> R + 'static,
{
    let auth = use_auth();
    let state = create_rw_signal(GuardState::Unresolved);

    create_effect(move |_| {
        let _ = auth.revision.get();
        let snapshot = auth.session.store().snapshot();
        state.set(GuardState::from_decision(requirement().evaluate(&snapshot)));
    });

    state.read_only()
}

fn render_guarded(
    state: ReadSignal<GuardState>,
    fallback: ViewFn,
    children: ChildrenFn,
) -> impl IntoView {
    move || match state.get().render() {
        Render::Nothing => ().into_view(),
        Render::Children => children().into_view(),
        Render::Fallback => fallback.run(),
    }
}
