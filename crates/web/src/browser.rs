//! Browser adapters (client storage, cookie, location, DOM events).

use std::sync::Arc;

use chrono::Utc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, HtmlDocument, Storage, Window};

use gatehouse_auth::cookie::{expired_cookie, find_cookie, session_cookie};
use gatehouse_auth::{CredentialStore, Navigator, SessionConfig, SessionError};
use gatehouse_events::{EventBus, SessionSignal, SignalBus, UNAUTHORIZED_EVENT};

fn window() -> Result<Window, SessionError> {
    web_sys::window().ok_or_else(|| SessionError::storage("no window object"))
}

fn local_storage() -> Result<Storage, SessionError> {
    window()?
        .local_storage()
        .map_err(|e| SessionError::storage(format!("localStorage: {e:?}")))?
        .ok_or_else(|| SessionError::storage("localStorage disabled"))
}

fn html_document() -> Result<HtmlDocument, SessionError> {
    window()?
        .document()
        .and_then(|doc| doc.dyn_into::<HtmlDocument>().ok())
        .ok_or_else(|| SessionError::storage("no html document"))
}

/// `localStorage` + `document.cookie`.
#[derive(Debug, Clone)]
pub struct BrowserCredentialStore {
    config: SessionConfig,
}

impl BrowserCredentialStore {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    fn read(&self, key: &str) -> Option<String> {
        local_storage()
            .ok()?
            .get_item(key)
            .ok()
            .flatten()
            .filter(|v| !v.is_empty())
    }

    fn write_cookie(&self, value: &str) -> Result<(), SessionError> {
        html_document()?
            .set_cookie(value)
            .map_err(|e| SessionError::storage(format!("document.cookie: {e:?}")))
    }
}

impl CredentialStore for BrowserCredentialStore {
    fn in_page_credential(&self) -> Option<String> {
        self.read(&self.config.token_storage_key)
    }

    fn navigation_visible_credential(&self) -> Option<String> {
        let cookies = html_document().ok()?.cookie().ok()?;
        find_cookie(&cookies, &self.config.cookie_name).map(str::to_string)
    }

    fn user_record(&self) -> Option<String> {
        self.read(&self.config.user_storage_key)
    }

    fn persist(&self, token: &str, user_record: &str) -> Result<(), SessionError> {
        if token.trim().is_empty() {
            return Err(SessionError::EmptyToken);
        }
        let storage = local_storage()?;
        storage
            .set_item(&self.config.token_storage_key, token)
            .and_then(|_| storage.set_item(&self.config.user_storage_key, user_record))
            .map_err(|e| SessionError::storage(format!("localStorage write: {e:?}")))?;

        self.write_cookie(&session_cookie(
            &self.config.cookie_name,
            token,
            self.config.cookie_max_age(),
            Utc::now(),
        ))
    }

    fn clear(&self) -> Result<(), SessionError> {
        // Expire the cookie first; it is what the route gate trusts.
        let cookie = self.write_cookie(&expired_cookie(&self.config.cookie_name));

        let storage = local_storage()?;
        storage
            .remove_item(&self.config.token_storage_key)
            .and_then(|_| storage.remove_item(&self.config.user_storage_key))
            .map_err(|e| SessionError::storage(format!("localStorage remove: {e:?}")))?;

        cookie
    }
}

/// Full-page navigation through `window.location`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn current_path(&self) -> String {
        web_sys::window()
            .and_then(|w| w.location().pathname().ok())
            .unwrap_or_default()
    }

    fn navigate(&self, path: &str) -> Result<(), SessionError> {
        let window = web_sys::window().ok_or_else(|| SessionError::navigation("no window"))?;
        window
            .location()
            .set_href(path)
            .map_err(|e| SessionError::navigation(format!("{e:?}")))
    }
}

/// Forwards DOM `unauthorized` events on `window` to the signal bus.
///
/// The listener is removed when the bridge is dropped.
pub struct UnauthorizedEventBridge {
    target: Window,
    callback: Closure<dyn FnMut(Event)>,
}

impl UnauthorizedEventBridge {
    pub fn attach(signals: Arc<SignalBus>) -> Option<Self> {
        let target = web_sys::window()?;
        let callback = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            if let Err(e) = signals.publish(SessionSignal::Unauthorized) {
                tracing::warn!(error = ?e, "failed to publish unauthorized signal");
            }
        });

        if let Err(e) = target
            .add_event_listener_with_callback(UNAUTHORIZED_EVENT, callback.as_ref().unchecked_ref())
        {
            tracing::warn!(error = ?e, "failed to attach unauthorized listener");
            return None;
        }

        Some(Self { target, callback })
    }
}

impl Drop for UnauthorizedEventBridge {
    fn drop(&mut self) {
        let _ = self.target.remove_event_listener_with_callback(
            UNAUTHORIZED_EVENT,
            self.callback.as_ref().unchecked_ref(),
        );
    }
}

/// Announce an invalid session from code that has no handle on the bus
/// (e.g. a JS fetch wrapper calling into wasm).
#[wasm_bindgen(js_name = dispatchUnauthorized)]
pub fn dispatch_unauthorized() -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    match Event::new(UNAUTHORIZED_EVENT) {
        Ok(event) => window.dispatch_event(&event).unwrap_or(false),
        Err(_) => false,
    }
}
