//! Logout flow.
//!
//! Invoked by explicit user action or by the unauthorized signal. Order:
//!
//! 1. Clear persisted session (client storage and cookie).
//! 2. Clear the Permission/Role store.
//! 3. Navigate to the entry path, unless already there or a redirect is
//!    already in flight.
//!
//! Navigation is fire-and-forget: logout is complete once the request to
//! navigate has been issued. A request the navigator rejects, or one that
//! has not settled within [`SessionConfig::redirect_settle_timeout`], no
//! longer counts as in flight.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::config::SessionConfig;
use crate::credentials::CredentialStore;
use crate::error::SessionError;
use crate::store::AuthorizationStore;

/// Page navigation as seen by the running application.
pub trait Navigator: Send + Sync {
    /// Path of the page currently shown (no query string).
    fn current_path(&self) -> String;

    /// Request navigation. Must not block on completion.
    fn navigate(&self, path: &str) -> Result<(), SessionError>;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LogoutReason {
    /// Published on the unauthorized signal bus.
    Unauthorized,
    /// The actor pressed "sign out".
    UserRequested,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LogoutOutcome {
    Navigated,
    AlreadyAtEntry,
    RedirectInFlight,
    /// The navigator rejected the request; the next logout tries again.
    NavigationFailed,
}

pub struct LogoutFlow {
    config: SessionConfig,
    credentials: Arc<dyn CredentialStore>,
    store: Arc<AuthorizationStore>,
    navigator: Arc<dyn Navigator>,
    /// When the pending redirect was requested.
    redirect_requested: Mutex<Option<DateTime<Utc>>>,
}

impl LogoutFlow {
    pub fn new(
        config: SessionConfig,
        credentials: Arc<dyn CredentialStore>,
        store: Arc<AuthorizationStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            config,
            credentials,
            store,
            navigator,
            redirect_requested: Mutex::new(None),
        }
    }

    pub fn logout(&self, reason: LogoutReason) -> LogoutOutcome {
        self.logout_at(reason, Utc::now())
    }

    fn logout_at(&self, reason: LogoutReason, now: DateTime<Utc>) -> LogoutOutcome {
        if let Err(e) = self.credentials.clear() {
            tracing::warn!(error = %e, ?reason, "failed to clear persisted session");
        }
        self.store.clear();

        let current = self.navigator.current_path();
        if self.config.is_entry_path(&current) {
            tracing::debug!(?reason, path = %current, "logout at entry path; no navigation");
            return LogoutOutcome::AlreadyAtEntry;
        }

        {
            let mut requested = self.pending();
            if let Some(at) = *requested {
                if now - at < self.config.redirect_settle_timeout() {
                    tracing::debug!(?reason, "logout redirect already in flight");
                    return LogoutOutcome::RedirectInFlight;
                }
                tracing::warn!(?reason, requested_at = %at, "logout redirect never settled; retrying");
            }
            *requested = Some(now);
        }

        match self.navigator.navigate(&self.config.entry_path) {
            Ok(()) => {
                tracing::info!(?reason, from = %current, to = %self.config.entry_path, "logged out");
                LogoutOutcome::Navigated
            }
            Err(e) => {
                tracing::warn!(error = %e, ?reason, from = %current, "logout navigation failed");
                self.release();
                LogoutOutcome::NavigationFailed
            }
        }
    }

    pub fn is_redirecting(&self) -> bool {
        self.pending().is_some()
    }

    /// Report that navigation finished. Arriving at the entry path releases
    /// the re-entrancy flag.
    pub fn navigation_settled(&self, path: &str) {
        if self.config.is_entry_path(path) {
            self.release();
        }
    }

    /// Forget the pending redirect; the next logout navigates again.
    pub(crate) fn release(&self) {
        *self.pending() = None;
    }

    fn pending(&self) -> MutexGuard<'_, Option<DateTime<Utc>>> {
        self.redirect_requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl core::fmt::Debug for LogoutFlow {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LogoutFlow")
            .field("entry_path", &self.config.entry_path)
            .field("redirecting", &self.is_redirecting())
            .finish()
    }
}

/// In-memory navigator (tests, native dev tools).
///
/// `navigate` only records the request; [`InMemoryNavigator::complete`]
/// moves the current path, which models navigation still being in flight
/// between the two calls.
#[derive(Debug)]
pub struct InMemoryNavigator {
    current: Mutex<String>,
    requested: Mutex<Vec<String>>,
    failing: Mutex<bool>,
}

impl InMemoryNavigator {
    pub fn at(path: impl Into<String>) -> Self {
        Self {
            current: Mutex::new(path.into()),
            requested: Mutex::new(Vec::new()),
            failing: Mutex::new(false),
        }
    }

    /// Make subsequent `navigate` calls fail (and record nothing).
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap_or_else(PoisonError::into_inner) = failing;
    }

    pub fn navigations(&self) -> Vec<String> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Finish the most recent navigation. Returns the new path.
    pub fn complete(&self) -> Option<String> {
        let target = self.navigations().last().cloned()?;
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = target.clone();
        Some(target)
    }
}

impl Navigator for InMemoryNavigator {
    fn current_path(&self) -> String {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn navigate(&self, path: &str) -> Result<(), SessionError> {
        if *self.failing.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(SessionError::navigation(format!("cannot navigate to {path}")));
        }
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_string());
        Ok(())
    }
}
