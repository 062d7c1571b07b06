//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST routes for policies and approval requests
//! - Mapping of domain errors to JSON error responses
//! - A tracing-backed notifier for workflow transitions

pub mod error;
pub mod notify;
pub mod routes;

use axum::Router;
use custody_core::workflow::Notifier;
use custody_db::WorkflowRepository;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use notify::TracingNotifier;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Request store and workflow transitions.
    pub workflow: Arc<WorkflowRepository>,
    /// Receives every successful transition.
    pub notifier: Arc<dyn Notifier>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
