//! Edge configuration, read from `GATEHOUSE_*` environment variables.

use std::net::SocketAddr;

use thiserror::Error;

use gatehouse_auth::SessionConfig;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EdgeConfigError {
    #[error("entry path '{0}' lies inside the protected area; every visit would redirect to itself")]
    EntryPathProtected(String),

    #[error("landing path '{0}' is outside the protected area")]
    LandingPathUnprotected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeConfig {
    pub bind_addr: SocketAddr,
    /// Backend API surface; never gated.
    pub api_prefix: String,
    /// Framework asset prefixes; never gated.
    pub asset_prefixes: Vec<String>,
    pub session: SessionConfig,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            api_prefix: "/api".to_string(),
            asset_prefixes: vec!["/pkg".to_string(), "/_next".to_string(), "/static".to_string()],
            session: SessionConfig::default(),
        }
    }
}

impl EdgeConfig {
    pub fn from_env() -> Result<Self, EdgeConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys keep their default;
    /// invalid values are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EdgeConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(raw) = lookup("GATEHOUSE_BIND_ADDR") {
            match raw.parse() {
                Ok(addr) => cfg.bind_addr = addr,
                Err(_) => tracing::warn!(value = %raw, "invalid GATEHOUSE_BIND_ADDR; using {}", cfg.bind_addr),
            }
        }

        set_path(&lookup, "GATEHOUSE_API_PREFIX", &mut cfg.api_prefix);
        set_path(&lookup, "GATEHOUSE_ENTRY_PATH", &mut cfg.session.entry_path);
        set_path(&lookup, "GATEHOUSE_LANDING_PATH", &mut cfg.session.landing_path);
        set_path(&lookup, "GATEHOUSE_PROTECTED_PREFIX", &mut cfg.session.protected_prefix);

        if let Some(raw) = lookup("GATEHOUSE_ASSET_PREFIXES") {
            let prefixes: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|p| p.starts_with('/'))
                .map(str::to_string)
                .collect();
            if prefixes.is_empty() {
                tracing::warn!(value = %raw, "GATEHOUSE_ASSET_PREFIXES has no valid prefixes; keeping defaults");
            } else {
                cfg.asset_prefixes = prefixes;
            }
        }

        if let Some(raw) = lookup("GATEHOUSE_SESSION_COOKIE") {
            let name = raw.trim();
            if name.is_empty() || name.contains([';', '=', ' ']) {
                tracing::warn!(value = %raw, "invalid GATEHOUSE_SESSION_COOKIE; using '{}'", cfg.session.cookie_name);
            } else {
                cfg.session.cookie_name = name.to_string();
            }
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), EdgeConfigError> {
        if self.session.is_protected(&self.session.entry_path) {
            return Err(EdgeConfigError::EntryPathProtected(self.session.entry_path.clone()));
        }
        if !self.session.is_protected(&self.session.landing_path) {
            return Err(EdgeConfigError::LandingPathUnprotected(self.session.landing_path.clone()));
        }
        Ok(())
    }
}

fn set_path<F>(lookup: &F, key: &str, target: &mut String)
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    let value = raw.trim();
    if value.starts_with('/') {
        *target = value.to_string();
    } else {
        tracing::warn!(key, value = %raw, "path must start with '/'; using '{}'", target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let cfg = EdgeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, EdgeConfig::default());
    }

    #[test]
    fn overrides_apply() {
        let cfg = EdgeConfig::from_lookup(lookup(&[
            ("GATEHOUSE_BIND_ADDR", "127.0.0.1:9000"),
            ("GATEHOUSE_ENTRY_PATH", "/login"),
            ("GATEHOUSE_ASSET_PREFIXES", "/assets, /pkg"),
            ("GATEHOUSE_SESSION_COOKIE", "sid"),
        ]))
        .unwrap();

        assert_eq!(cfg.bind_addr, SocketAddr::from(([127, 0, 0, 1], 9000)));
        assert_eq!(cfg.session.entry_path, "/login");
        assert_eq!(cfg.asset_prefixes, vec!["/assets".to_string(), "/pkg".to_string()]);
        assert_eq!(cfg.session.cookie_name, "sid");
    }

    #[test]
    fn invalid_values_fall_back() {
        let cfg = EdgeConfig::from_lookup(lookup(&[
            ("GATEHOUSE_BIND_ADDR", "not-an-addr"),
            ("GATEHOUSE_ENTRY_PATH", "login"),
            ("GATEHOUSE_SESSION_COOKIE", "a=b"),
        ]))
        .unwrap();

        assert_eq!(cfg.bind_addr, EdgeConfig::default().bind_addr);
        assert_eq!(cfg.session.entry_path, "/");
        assert_eq!(cfg.session.cookie_name, "token");
    }

    #[test]
    fn entry_inside_protected_area_is_rejected() {
        let err = EdgeConfig::from_lookup(lookup(&[("GATEHOUSE_ENTRY_PATH", "/admin/login")])).unwrap_err();
        assert_eq!(err, EdgeConfigError::EntryPathProtected("/admin/login".into()));
    }

    #[test]
    fn landing_outside_protected_area_is_rejected() {
        let err = EdgeConfig::from_lookup(lookup(&[("GATEHOUSE_LANDING_PATH", "/home")])).unwrap_err();
        assert_eq!(err, EdgeConfigError::LandingPathUnprotected("/home".into()));
    }
}
