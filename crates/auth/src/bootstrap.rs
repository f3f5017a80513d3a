//! Authentication bootstrap: one-shot store derivation plus the single
//! unauthorized-signal listener.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use gatehouse_events::{EventBus, SessionSignal, SignalBus, Subscription};

use crate::credentials::CredentialStore;
use crate::logout::{LogoutFlow, LogoutReason};
use crate::record::SessionRecord;
use crate::store::AuthorizationStore;

/// Result of [`AuthBootstrap::initialize`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BootstrapOutcome {
    /// No persisted record; the store stays empty.
    Anonymous,
    /// The record could not be read; logged, the store stays empty.
    Malformed,
    /// Store populated from the record.
    Populated,
    /// A previous call already ran.
    AlreadyInitialized,
}

pub struct AuthBootstrap {
    credentials: Arc<dyn CredentialStore>,
    store: Arc<AuthorizationStore>,
    logout: Arc<LogoutFlow>,
    signals: Arc<SignalBus>,
    initialized: AtomicBool,
    listener: Mutex<Option<Subscription>>,
}

impl AuthBootstrap {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        store: Arc<AuthorizationStore>,
        logout: Arc<LogoutFlow>,
        signals: Arc<SignalBus>,
    ) -> Self {
        Self {
            credentials,
            store,
            logout,
            signals,
            initialized: AtomicBool::new(false),
            listener: Mutex::new(None),
        }
    }

    /// Populate the store from the persisted user record. Runs once.
    pub fn initialize(&self) -> BootstrapOutcome {
        if self.initialized.swap(true, Ordering::AcqRel) {
            return BootstrapOutcome::AlreadyInitialized;
        }

        let Some(raw) = self.credentials.user_record() else {
            tracing::debug!("no persisted session record; starting anonymous");
            return BootstrapOutcome::Anonymous;
        };

        match SessionRecord::parse(&raw) {
            Ok(record) => {
                self.store
                    .set_actor_authorization(record.permissions, record.roles);
                BootstrapOutcome::Populated
            }
            Err(e) => {
                tracing::warn!(error = %e, "ignoring persisted session record");
                BootstrapOutcome::Malformed
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Register the unauthorized listener. Returns `false` if it was already
    /// registered; there is never more than one.
    pub fn activate(&self) -> bool {
        let mut listener = self.listener.lock().unwrap_or_else(PoisonError::into_inner);
        if listener.is_some() {
            return false;
        }

        let logout = self.logout.clone();
        let subscription = self.signals.subscribe(Arc::new(move |signal: &SessionSignal| {
            match signal {
                SessionSignal::Unauthorized => {
                    let outcome = logout.logout(LogoutReason::Unauthorized);
                    tracing::debug!(?outcome, "handled unauthorized signal");
                }
            }
        }));
        *listener = Some(subscription);
        true
    }

    /// Release the listener, if registered.
    pub fn deactivate(&self) {
        let released = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        // Dropped outside the lock.
        drop(released);
    }

    pub fn is_active(&self) -> bool {
        self.listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Initialize and activate for a scope. The returned guard deactivates on
    /// drop, but only if it was the one that activated.
    pub fn mount(self: &Arc<Self>) -> AuthListener {
        self.initialize();
        let owns = self.activate();
        AuthListener {
            bootstrap: self.clone(),
            owns,
        }
    }
}

impl core::fmt::Debug for AuthBootstrap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthBootstrap")
            .field("initialized", &self.is_initialized())
            .field("active", &self.is_active())
            .finish()
    }
}

/// Scoped bootstrap mount; see [`AuthBootstrap::mount`].
#[must_use = "dropping an AuthListener immediately releases the unauthorized listener"]
#[derive(Debug)]
pub struct AuthListener {
    bootstrap: Arc<AuthBootstrap>,
    owns: bool,
}

impl Drop for AuthListener {
    fn drop(&mut self) {
        if self.owns {
            self.bootstrap.deactivate();
        }
    }
}
