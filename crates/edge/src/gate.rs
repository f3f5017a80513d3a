//! Route gate decision (pure).
//!
//! Runs ahead of page delivery and sees only the request path and whether the
//! session cookie is present. Token format and expiry are not checked here;
//! the backend API rejects stale tokens and the page reacts through the
//! unauthorized signal.
//!
//! Rules, first match wins:
//!
//! 1. API surface, framework assets, and any path with a file extension pass.
//! 2. Protected area: no cookie redirects to the entry path with
//!    `redirect=<requested path>`; a cookie passes.
//! 3. Entry path with a cookie redirects to the landing page.
//! 4. Everything else passes.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::config::EdgeConfig;

/// Query-value escape set: RFC 3986 unreserved characters plus `/` stay
/// readable.
const RETURN_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    PassThrough,
    Redirect(String),
}

#[derive(Debug, Clone)]
pub struct RouteGate {
    config: EdgeConfig,
}

impl RouteGate {
    pub fn new(config: EdgeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    pub fn decide(&self, path: &str, has_session_cookie: bool) -> GateDecision {
        let session = &self.config.session;

        if self.is_ungated(path) {
            return GateDecision::PassThrough;
        }

        if session.is_protected(path) {
            if has_session_cookie {
                return GateDecision::PassThrough;
            }
            return GateDecision::Redirect(format!(
                "{}?redirect={}",
                session.entry_path,
                encode_query_value(path)
            ));
        }

        if session.is_entry_path(path) && has_session_cookie {
            return GateDecision::Redirect(session.landing_path.clone());
        }

        GateDecision::PassThrough
    }

    fn is_ungated(&self, path: &str) -> bool {
        under_prefix(path, &self.config.api_prefix)
            || self
                .config
                .asset_prefixes
                .iter()
                .any(|prefix| under_prefix(path, prefix))
            || has_file_extension(path)
    }
}

fn under_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// `/favicon.ico`, `/robots.txt`, `/images/logo.svg`…
fn has_file_extension(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or_default();
    last.rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
}

fn encode_query_value(value: &str) -> String {
    utf8_percent_encode(value, RETURN_PATH).to_string()
}
