//! Session credential storage.
//!
//! The credential lives in two places that may transiently disagree:
//!
//! - **in-page** (client storage): trusted by the logout flow and sign-in
//!   state of the running page.
//! - **navigation-visible** (cookie): the only signal the route gate sees.

use std::sync::{Mutex, PoisonError};

use chrono::Utc;

use crate::config::SessionConfig;
use crate::cookie;
use crate::error::SessionError;

/// Read/write access to the persisted session.
///
/// Implementations must be cheap to call and must not panic; storage failures
/// are returned as [`SessionError::StorageUnavailable`].
pub trait CredentialStore: Send + Sync {
    /// Token in client storage.
    fn in_page_credential(&self) -> Option<String>;

    /// Token in the session cookie.
    fn navigation_visible_credential(&self) -> Option<String>;

    /// Raw serialized user record.
    fn user_record(&self) -> Option<String>;

    /// Write the token to both slots and the user record to client storage.
    fn persist(&self, token: &str, user_record: &str) -> Result<(), SessionError>;

    /// Remove token, user record, and expire the cookie.
    fn clear(&self) -> Result<(), SessionError>;
}

#[derive(Debug, Default)]
struct Slots {
    token: Option<String>,
    user: Option<String>,
    cookie: Option<String>,
    cookie_writes: Vec<String>,
    unavailable: bool,
}

/// In-memory credential store (tests, native dev tools).
///
/// Cookie writes are recorded verbatim so callers can inspect what a browser
/// would have received.
#[derive(Debug)]
pub struct InMemoryCredentialStore {
    config: SessionConfig,
    slots: Mutex<Slots>,
}

impl InMemoryCredentialStore {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            slots: Mutex::new(Slots::default()),
        }
    }

    /// Seed client storage directly (simulates data left by a previous load).
    pub fn with_user_record(self, record: impl Into<String>) -> Self {
        self.lock().user = Some(record.into());
        self
    }

    pub fn with_token(self, token: impl Into<String>) -> Self {
        let token = token.into();
        {
            let mut slots = self.lock();
            slots.token = Some(token.clone());
            slots.cookie = Some(token);
        }
        self
    }

    /// Simulate storage failures (quota, disabled storage).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Drop only the cookie (e.g. it expired while the page stayed open).
    pub fn expire_cookie(&self) {
        self.lock().cookie = None;
    }

    pub fn cookie_writes(&self) -> Vec<String> {
        self.lock().cookie_writes.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn in_page_credential(&self) -> Option<String> {
        self.lock().token.clone()
    }

    fn navigation_visible_credential(&self) -> Option<String> {
        self.lock().cookie.clone()
    }

    fn user_record(&self) -> Option<String> {
        self.lock().user.clone()
    }

    fn persist(&self, token: &str, user_record: &str) -> Result<(), SessionError> {
        if token.trim().is_empty() {
            return Err(SessionError::EmptyToken);
        }
        let mut slots = self.lock();
        if slots.unavailable {
            return Err(SessionError::storage("client storage disabled"));
        }
        slots.token = Some(token.to_string());
        slots.user = Some(user_record.to_string());
        slots.cookie = Some(token.to_string());
        let written = cookie::session_cookie(
            &self.config.cookie_name,
            token,
            self.config.cookie_max_age(),
            Utc::now(),
        );
        slots.cookie_writes.push(written);
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        let mut slots = self.lock();
        // The cookie is not client storage; it is expired even when storage fails.
        slots.cookie = None;
        slots.cookie_writes.push(cookie::expired_cookie(&self.config.cookie_name));
        if slots.unavailable {
            return Err(SessionError::storage("client storage disabled"));
        }
        slots.token = None;
        slots.user = None;
        Ok(())
    }
}
