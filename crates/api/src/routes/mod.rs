//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod health;
pub mod policies;
pub mod requests;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(policies::routes())
        .merge(requests::routes())
}
