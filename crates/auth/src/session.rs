//! Application-level wiring of the authorization core.
//!
//! One `AuthSession` is built at application start and handed to the
//! component tree. It owns the store, the logout flow, and the bootstrap, and
//! shares the signal bus with every collaborator that may publish on it.

use std::sync::Arc;

use serde_json::Value;

use gatehouse_events::SignalBus;

use crate::bootstrap::AuthBootstrap;
use crate::config::SessionConfig;
use crate::credentials::CredentialStore;
use crate::error::SessionError;
use crate::logout::{LogoutFlow, LogoutOutcome, LogoutReason, Navigator};
use crate::record::SessionRecord;
use crate::store::AuthorizationStore;

#[derive(Clone)]
pub struct AuthSession {
    config: SessionConfig,
    credentials: Arc<dyn CredentialStore>,
    store: Arc<AuthorizationStore>,
    signals: Arc<SignalBus>,
    logout: Arc<LogoutFlow>,
    bootstrap: Arc<AuthBootstrap>,
}

impl AuthSession {
    pub fn new(
        config: SessionConfig,
        credentials: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
        signals: Arc<SignalBus>,
    ) -> Self {
        let store = Arc::new(AuthorizationStore::new());
        let logout = Arc::new(LogoutFlow::new(
            config.clone(),
            credentials.clone(),
            store.clone(),
            navigator,
        ));
        let bootstrap = Arc::new(AuthBootstrap::new(
            credentials.clone(),
            store.clone(),
            logout.clone(),
            signals.clone(),
        ));

        Self {
            config,
            credentials,
            store,
            signals,
            logout,
            bootstrap,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<AuthorizationStore> {
        &self.store
    }

    pub fn signals(&self) -> &Arc<SignalBus> {
        &self.signals
    }

    pub fn bootstrap(&self) -> &Arc<AuthBootstrap> {
        &self.bootstrap
    }

    pub fn logout_flow(&self) -> &Arc<LogoutFlow> {
        &self.logout
    }

    /// Whether the running page holds a credential.
    pub fn is_authenticated(&self) -> bool {
        self.credentials.in_page_credential().is_some()
    }

    /// Establish a session from a successful sign-in response.
    ///
    /// The record is validated before anything is written, so a bad response
    /// leaves the previous state untouched.
    pub fn sign_in(&self, token: &str, user: &Value) -> Result<(), SessionError> {
        if token.trim().is_empty() {
            return Err(SessionError::EmptyToken);
        }
        let record = SessionRecord::from_value(user)?;

        self.credentials.persist(token, &user.to_string())?;
        self.store
            .set_actor_authorization(record.permissions, record.roles);
        self.logout.release();

        let snapshot = self.store.snapshot();
        tracing::info!(
            permissions = snapshot.permission_names().len(),
            roles = snapshot.role_names().len(),
            "signed in"
        );
        Ok(())
    }

    /// Target after a successful sign-in; see [`SessionConfig::post_sign_in_path`].
    pub fn post_sign_in_path(&self, redirect: Option<&str>) -> String {
        self.config.post_sign_in_path(redirect)
    }

    /// Explicit "sign out".
    pub fn logout(&self) -> LogoutOutcome {
        self.logout.logout(LogoutReason::UserRequested)
    }
}

impl core::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthSession")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("logout", &self.logout)
            .field("bootstrap", &self.bootstrap)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::InMemoryCredentialStore;
    use crate::guard::{AccessRequirement, GuardState, WatchedGuard};
    use crate::logout::InMemoryNavigator;
    use gatehouse_events::{EventBus, SessionSignal};
    use serde_json::json;

    fn session(at: &str) -> (AuthSession, Arc<InMemoryCredentialStore>, Arc<InMemoryNavigator>) {
        let credentials = Arc::new(InMemoryCredentialStore::default());
        let navigator = Arc::new(InMemoryNavigator::at(at));
        let session = AuthSession::new(
            SessionConfig::default(),
            credentials.clone(),
            navigator.clone(),
            Arc::new(SignalBus::new()),
        );
        (session, credentials, navigator)
    }

    #[test]
    fn sign_in_persists_and_populates() {
        let (session, credentials, _) = session("/");
        let user = json!({"id": 1, "permissions": ["manage_users"], "roles": [{"name": "admin"}]});

        session.sign_in("abc", &user).unwrap();

        assert!(session.is_authenticated());
        assert_eq!(credentials.navigation_visible_credential().as_deref(), Some("abc"));
        assert!(session.store().has_permission("manage_users"));
        assert!(session.store().has_role("admin"));
    }

    #[test]
    fn bad_sign_in_response_changes_nothing() {
        let (session, credentials, _) = session("/");
        let err = session.sign_in("abc", &json!({"roles": []})).unwrap_err();

        assert!(matches!(err, SessionError::MalformedRecord(_)));
        assert!(!session.is_authenticated());
        assert!(credentials.cookie_writes().is_empty());
    }

    #[test]
    fn sign_in_after_logout_allows_a_new_redirect() {
        let (session, _, navigator) = session("/admin");
        let user = json!({"permissions": [], "roles": []});

        session.sign_in("abc", &user).unwrap();
        assert_eq!(session.logout(), LogoutOutcome::Navigated);

        session.sign_in("def", &user).unwrap();
        assert_eq!(session.logout(), LogoutOutcome::Navigated);
        assert_eq!(navigator.navigations().len(), 2);
    }

    #[test]
    fn unauthorized_signal_tears_down_guards() {
        let (session, _, navigator) = session("/admin/users");
        let _listener = session.bootstrap().mount();
        session
            .sign_in("abc", &json!({"permissions": ["manage_users"], "roles": []}))
            .unwrap();

        let guard = WatchedGuard::mount(
            session.store().clone(),
            AccessRequirement::new().permissions("manage_users"),
        );
        assert_eq!(guard.resolve(), GuardState::Granted);

        session.signals().publish(SessionSignal::Unauthorized).unwrap();

        assert_eq!(guard.state(), GuardState::Denied);
        assert!(!session.is_authenticated());
        assert_eq!(navigator.navigations(), vec!["/".to_string()]);
    }
}
