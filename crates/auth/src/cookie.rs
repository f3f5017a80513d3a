//! Session cookie helpers (header parsing and `Set-Cookie`/`document.cookie`
//! value construction).

use chrono::{DateTime, Duration, Utc};

const COOKIE_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Find a cookie value in a `Cookie` header (`a=1; token=abc`).
///
/// An empty value counts as absent.
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
}

/// Cookie string that stores the session credential.
pub fn session_cookie(name: &str, value: &str, max_age: Duration, now: DateTime<Utc>) -> String {
    let expires = now + max_age;
    format!(
        "{name}={value}; Path=/; Max-Age={}; Expires={}; SameSite=Lax",
        max_age.num_seconds(),
        expires.format(COOKIE_DATE_FORMAT)
    )
}

/// Cookie string that removes the session credential by setting an
/// already-past expiry.
pub fn expired_cookie(name: &str) -> String {
    format!(
        "{name}=; Path=/; Max-Age=0; Expires={}",
        DateTime::<Utc>::UNIX_EPOCH.format(COOKIE_DATE_FORMAT)
    )
}

/// Whether a cookie string written by this module removes its cookie.
pub fn is_expiring(cookie: &str) -> bool {
    cookie
        .split(';')
        .any(|attr| attr.trim().eq_ignore_ascii_case("max-age=0"))
}
