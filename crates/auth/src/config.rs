//! Session layer configuration.

use serde::{Deserialize, Serialize};

/// Names and paths shared by the route gate, the logout flow, and the
/// browser credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Navigation-visible cookie carrying the session credential.
    pub cookie_name: String,
    /// Client storage key of the session credential.
    pub token_storage_key: String,
    /// Client storage key of the serialized user record.
    pub user_storage_key: String,
    /// Public entry (sign-in) path.
    pub entry_path: String,
    /// Default page of the protected area.
    pub landing_path: String,
    /// Path prefix of the protected area.
    pub protected_prefix: String,
    /// Lifetime of the session cookie written on sign-in.
    pub cookie_max_age_secs: i64,
    /// How long a logout redirect may stay unsettled before another logout
    /// is allowed to navigate again.
    pub redirect_settle_ms: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "token".to_string(),
            token_storage_key: "token".to_string(),
            user_storage_key: "user".to_string(),
            entry_path: "/".to_string(),
            landing_path: "/admin/dashboard".to_string(),
            protected_prefix: "/admin".to_string(),
            cookie_max_age_secs: 7 * 24 * 60 * 60,
            redirect_settle_ms: 5_000,
        }
    }
}

impl SessionConfig {
    pub fn is_entry_path(&self, path: &str) -> bool {
        normalize_path(path) == normalize_path(&self.entry_path)
    }

    /// `/admin` itself and everything below it.
    pub fn is_protected(&self, path: &str) -> bool {
        let prefix = normalize_path(&self.protected_prefix);
        let path = normalize_path(path);
        path == prefix
            || path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Where to send the actor after sign-in, given the entry page's
    /// `redirect` query value.
    ///
    /// Only same-origin paths inside the protected area are honoured;
    /// anything else (absent, absolute URLs, `//host`, backslashes) lands on
    /// the default landing page.
    pub fn post_sign_in_path(&self, redirect: Option<&str>) -> String {
        redirect
            .map(str::trim)
            .filter(|r| r.starts_with('/') && !r.starts_with("//") && !r.contains('\\'))
            .filter(|r| self.is_protected(r.split(['?', '#']).next().unwrap_or_default()))
            .map(str::to_string)
            .unwrap_or_else(|| self.landing_path.clone())
    }

    pub fn cookie_max_age(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cookie_max_age_secs.max(0))
    }

    pub fn redirect_settle_timeout(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.redirect_settle_ms.max(0))
    }
}

/// Strip a trailing slash (except for the root).
fn normalize_path(path: &str) -> &str {
    if path.is_empty() {
        return "/";
    }
    match path.strip_suffix('/') {
        Some("") | None => path,
        Some(trimmed) => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_deployed_layout() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.cookie_name, "token");
        assert_eq!(cfg.entry_path, "/");
        assert_eq!(cfg.landing_path, "/admin/dashboard");
    }

    #[test]
    fn protected_prefix_matches_segment_boundaries() {
        let cfg = SessionConfig::default();
        assert!(cfg.is_protected("/admin"));
        assert!(cfg.is_protected("/admin/"));
        assert!(cfg.is_protected("/admin/users/42"));
        assert!(!cfg.is_protected("/administrator"));
        assert!(!cfg.is_protected("/"));
    }

    #[test]
    fn entry_path_comparison_ignores_trailing_slash() {
        let cfg = SessionConfig {
            entry_path: "/login".into(),
            ..SessionConfig::default()
        };
        assert!(cfg.is_entry_path("/login/"));
        assert!(!cfg.is_entry_path("/"));
        assert!(SessionConfig::default().is_entry_path(""));
    }

    #[test]
    fn post_sign_in_path_honours_protected_redirects_only() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.post_sign_in_path(Some("/admin/users")), "/admin/users");
        assert_eq!(cfg.post_sign_in_path(Some("/admin/users?page=2")), "/admin/users?page=2");
        assert_eq!(cfg.post_sign_in_path(None), "/admin/dashboard");
        assert_eq!(cfg.post_sign_in_path(Some("")), "/admin/dashboard");
        assert_eq!(cfg.post_sign_in_path(Some("/about")), "/admin/dashboard");
        assert_eq!(cfg.post_sign_in_path(Some("https://evil.example/admin")), "/admin/dashboard");
        assert_eq!(cfg.post_sign_in_path(Some("//evil.example/admin")), "/admin/dashboard");
        assert_eq!(cfg.post_sign_in_path(Some("/\\evil.example")), "/admin/dashboard");
    }

    #[test]
    fn partial_config_deserializes_with_defaults() {
        let cfg: SessionConfig = serde_json::from_str(r#"{"entry_path": "/login"}"#).unwrap();
        assert_eq!(cfg.entry_path, "/login");
        assert_eq!(cfg.cookie_name, "token");
    }
}
