//! Mapping of domain errors onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use custody_core::policy::PolicyError;
use custody_core::workflow::WorkflowError;
use custody_shared::AppError;
use serde_json::json;

/// Any error a handler can return.
#[derive(Debug)]
pub enum ApiError {
    /// Policy resolution failed.
    Policy(PolicyError),
    /// A workflow transition was refused.
    Workflow(WorkflowError),
    /// Request parsing or other edge failure.
    App(AppError),
}

impl ApiError {
    /// Shorthand for a 400 with a message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::App(AppError::Validation(message.into()))
    }

    fn parts(&self) -> (u16, &'static str, String) {
        match self {
            Self::Policy(e) => (e.status_code(), e.error_code(), e.to_string()),
            Self::Workflow(e) => (e.status_code(), e.error_code(), e.to_string()),
            Self::App(e) => (e.status_code(), e.error_code(), e.to_string()),
        }
    }
}

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        Self::Policy(err)
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        Self::Workflow(err)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error_code = code, error = %message, "request failed");
            return (
                status,
                Json(json!({
                    "error": code,
                    "message": "An error occurred"
                })),
            )
                .into_response();
        }

        (
            status,
            Json(json!({
                "error": code,
                "message": message
            })),
        )
            .into_response()
    }
}
