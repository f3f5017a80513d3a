use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use gatehouse_auth::cookie::find_cookie;

use crate::gate::{GateDecision, RouteGate};

#[derive(Clone)]
pub struct GateState {
    pub gate: Arc<RouteGate>,
}

/// Apply the route gate to every request.
///
/// Stateless per request: reads only the path and the `Cookie` header.
pub async fn route_gate(
    State(state): State<GateState>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let cookie_name = &state.gate.config().session.cookie_name;
    let has_cookie = session_cookie_present(req.headers(), cookie_name);
    let path = req.uri().path().to_owned();

    match state.gate.decide(&path, has_cookie) {
        GateDecision::PassThrough => next.run(req).await,
        GateDecision::Redirect(location) => {
            tracing::debug!(path = %path, location = %location, has_cookie, "route gate redirect");
            Redirect::temporary(&location).into_response()
        }
    }
}

/// Whether any `Cookie` header carries a non-empty session cookie.
///
/// Header values that are not valid visible ASCII are skipped: an unreadable
/// cookie is treated as no cookie.
fn session_cookie_present(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| find_cookie(value, name).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn finds_cookie_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(header::COOKIE, HeaderValue::from_static("token=abc"));
        assert!(session_cookie_present(&headers, "token"));
    }

    #[test]
    fn unreadable_header_counts_as_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_bytes(b"token=\xff\xfe").unwrap());
        assert!(!session_cookie_present(&headers, "token"));
    }

    #[test]
    fn no_header_is_absent() {
        assert!(!session_cookie_present(&HeaderMap::new(), "token"));
    }
}
