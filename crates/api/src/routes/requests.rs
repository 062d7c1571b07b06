//! Approval request routes.
//!
//! Covers submission, lookup and the four approver-facing transitions
//! shared by withdrawals, group creation and expenses.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use custody_core::policy::Approver;
use custody_core::workflow::{
    ApprovableRequest, ApprovalStateMachine, ApprovalView, NewRequest, Notifier, RequestKind,
    RequestStatus, WorkflowAction,
};
use custody_db::{RequestFilter, Transition};
use custody_shared::types::{PageMeta, PageRequest, RequestId};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

/// Creates the request routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/requests", post(create_request).get(list_requests))
        .route("/requests/{id}", get(get_request))
        .route("/requests/{id}/approve", post(approve_request))
        .route("/requests/{id}/reject", post(reject_request))
        .route("/requests/{id}/reapprove", post(reapprove_request))
        .route("/requests/{id}/archive", post(archive_request))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing requests.
#[derive(Debug, Default, Deserialize)]
pub struct ListRequestsQuery {
    /// Filter by kind (`withdrawal`, `group_creation`, `expense`).
    pub kind: Option<String>,
    /// Filter by aggregate status.
    pub status: Option<String>,
    /// Only requests whose chain includes this approver.
    pub approver: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Body for approving.
#[derive(Debug, Deserialize)]
pub struct ApproveBody {
    /// Who is approving.
    pub approver: String,
    /// Version the caller last saw.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// Body for rejecting.
#[derive(Debug, Deserialize)]
pub struct RejectBody {
    /// Who is rejecting.
    pub approver: String,
    /// Why.
    pub reason: String,
    /// Version the caller last saw.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// Body for reapprove and archive.
#[derive(Debug, Deserialize)]
pub struct VersionBody {
    /// Version the caller last saw.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// A request with its derived approval state.
#[derive(Debug, Serialize)]
pub struct RequestResponse {
    /// Stored request.
    pub request: ApprovableRequest,
    /// Aggregate and per-approver status.
    pub approval: ApprovalView,
}

impl From<ApprovableRequest> for RequestResponse {
    fn from(request: ApprovableRequest) -> Self {
        let approval = ApprovalStateMachine::evaluate(&request);
        Self { request, approval }
    }
}

/// Result of a transition.
#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    /// The request after the transition.
    #[serde(flatten)]
    pub request: RequestResponse,
    /// Audit record of the transition.
    pub action: WorkflowAction,
}

/// Paginated list of requests.
#[derive(Debug, Serialize)]
pub struct ListRequestsResponse {
    /// Requests on this page.
    pub data: Vec<RequestResponse>,
    /// Pagination metadata.
    pub meta: PageMeta,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/requests` - Submit a withdrawal, group creation or expense.
async fn create_request(
    State(state): State<AppState>,
    Json(body): Json<NewRequest>,
) -> Result<(StatusCode, Json<TransitionResponse>), ApiError> {
    let transition = state.workflow.submit(body)?;
    Ok((StatusCode::CREATED, Json(state.respond(transition))))
}

/// GET `/requests` - List requests, newest first.
async fn list_requests(
    State(state): State<AppState>,
    Query(query): Query<ListRequestsQuery>,
) -> Result<Json<ListRequestsResponse>, ApiError> {
    let filter = RequestFilter {
        kind: query
            .kind
            .as_deref()
            .map(|k| {
                RequestKind::parse(k).ok_or_else(|| ApiError::validation(format!("Invalid kind: {k}")))
            })
            .transpose()?,
        status: query
            .status
            .as_deref()
            .map(|s| {
                RequestStatus::parse(s)
                    .ok_or_else(|| ApiError::validation(format!("Invalid status: {s}")))
            })
            .transpose()?,
        approver: query.approver.as_deref().map(Approver::new),
    };
    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };

    let result = state.workflow.list(&filter, &page).await;
    Ok(Json(ListRequestsResponse {
        data: result.data.into_iter().map(RequestResponse::from).collect(),
        meta: result.meta,
    }))
}

/// GET `/requests/{id}` - Fetch one request with its approval view.
async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RequestResponse>, ApiError> {
    let request = state.workflow.get(parse_id(&id)?).await?;
    Ok(Json(request.into()))
}

/// POST `/requests/{id}/approve` - Record an approval.
async fn approve_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ApproveBody>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let transition = state
        .workflow
        .approve(
            parse_id(&id)?,
            &Approver::new(&body.approver),
            body.expected_version,
        )
        .await?;
    Ok(Json(state.respond(transition)))
}

/// POST `/requests/{id}/reject` - Record a rejection.
async fn reject_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RejectBody>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let transition = state
        .workflow
        .reject(
            parse_id(&id)?,
            &Approver::new(&body.approver),
            &body.reason,
            body.expected_version,
        )
        .await?;
    Ok(Json(state.respond(transition)))
}

/// POST `/requests/{id}/reapprove` - Reopen a rejected request.
async fn reapprove_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<VersionBody>>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let expected_version = body.and_then(|Json(b)| b.expected_version);
    let transition = state
        .workflow
        .reapprove(parse_id(&id)?, expected_version)
        .await?;
    Ok(Json(state.respond(transition)))
}

/// POST `/requests/{id}/archive` - Archive a rejected request.
async fn archive_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<VersionBody>>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let expected_version = body.and_then(|Json(b)| b.expected_version);
    let transition = state
        .workflow
        .archive(parse_id(&id)?, expected_version)
        .await?;
    Ok(Json(state.respond(transition)))
}

fn parse_id(raw: &str) -> Result<RequestId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::validation(format!("Invalid request id: {raw}")))
}

impl AppState {
    /// Notifies and shapes a completed transition.
    fn respond(&self, (request, action): Transition) -> TransitionResponse {
        self.notifier.notify(&request, &action);
        TransitionResponse {
            request: request.into(),
            action,
        }
    }
}
