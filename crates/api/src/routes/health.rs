//! Liveness endpoint.

use axum::{Json, Router, extract::State, routing::get};
use custody_shared::types::Currency;
use serde::Serialize;

use crate::AppState;

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Currency policy bands are evaluated in.
    pub base_currency: Currency,
    /// Requests currently held in the store.
    pub requests: usize,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        base_currency: state.workflow.service().resolver().table().base_currency(),
        requests: state.workflow.requests().len(),
    })
}

/// Creates the health route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
