//! Router: health endpoint and page shells, all behind the route gate.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
};
use serde::Deserialize;
use tower::ServiceBuilder;

use crate::config::EdgeConfig;
use crate::gate::RouteGate;
use crate::middleware::{GateState, route_gate};

pub fn build_app(config: EdgeConfig) -> Router {
    let gate_state = GateState {
        gate: Arc::new(RouteGate::new(config)),
    };

    Router::new()
        .route("/api/health", get(health))
        .route("/", get(entry_page))
        .route("/admin", get(admin_page_root))
        .route("/admin/*rest", get(admin_page))
        .fallback(not_found)
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn_with_state(
            gate_state,
            route_gate,
        )))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct EntryQuery {
    redirect: Option<String>,
}

/// Sign-in shell. The client app mounts here and forwards to `redirect`
/// after a successful sign-in.
async fn entry_page(Query(query): Query<EntryQuery>) -> Html<String> {
    let redirect = query.redirect.unwrap_or_default();
    Html(format!(
        "<!doctype html><html><body data-page=\"entry\" data-redirect=\"{}\"><div id=\"app\"></div></body></html>",
        escape_attr(&redirect)
    ))
}

async fn admin_page_root() -> Html<String> {
    admin_shell("")
}

async fn admin_page(Path(rest): Path<String>) -> Html<String> {
    admin_shell(&rest)
}

fn admin_shell(rest: &str) -> Html<String> {
    Html(format!(
        "<!doctype html><html><body data-page=\"admin\" data-route=\"/admin/{}\"><div id=\"app\"></div></body></html>",
        escape_attr(rest)
    ))
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

fn escape_attr(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
