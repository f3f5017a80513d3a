//! `gatehouse-web`
//!
//! **Responsibility:** browser side of the authorization core.
//!
//! This crate provides (wasm32 only):
//! - Leptos guard components (`RoleGuard`, `AccessGuard`)
//! - `AuthProvider`: bootstrap, unauthorized listener, store-change signal
//! - Browser adapters for credential storage, navigation, and the DOM
//!   `unauthorized` event
//!
//! Native builds only re-export the core types, so workspace-wide native
//! builds and tests stay green.

pub use gatehouse_auth::{AccessRequirement, AuthSession, GuardState, NameQuery, RoleRequirement, SessionConfig};

#[cfg(target_arch = "wasm32")]
pub mod browser;
#[cfg(target_arch = "wasm32")]
pub mod components;

/// Build a browser-backed session and install the panic hook.
///
/// ```ignore
/// let session = gatehouse_web::boot(SessionConfig::default());
/// leptos::mount_to_body(move || view! {
///     <AuthProvider session=session.clone()>
///         <AdminShell/>
///     </AuthProvider>
/// });
/// ```
#[cfg(target_arch = "wasm32")]
pub fn boot(config: SessionConfig) -> AuthSession {
    use std::sync::Arc;

    console_error_panic_hook::set_once();

    AuthSession::new(
        config.clone(),
        Arc::new(browser::BrowserCredentialStore::new(config)),
        Arc::new(browser::BrowserNavigator),
        Arc::new(gatehouse_events::SignalBus::new()),
    )
}
