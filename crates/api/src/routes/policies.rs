//! Approval policy routes.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use custody_core::policy::{
    ApprovalPolicy, PolicyDescription, TransactionType, TransactionTypePolicy,
};
use custody_shared::types::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

/// Creates the policy routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/policies", get(list_policies))
        .route("/policies/resolve", post(resolve_policy))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response listing every configured policy.
#[derive(Debug, Serialize)]
pub struct PoliciesResponse {
    /// Currency band thresholds are expressed in.
    pub base_currency: Currency,
    /// Amount bands.
    pub approval_policies: Vec<ApprovalPolicy>,
    /// Transaction-type policies.
    pub transaction_type_policies: Vec<TransactionTypePolicy>,
}

/// Request body for resolving approvers.
#[derive(Debug, Deserialize)]
pub struct ResolvePolicyRequest {
    /// Transaction amount.
    pub amount: Decimal,
    /// Transaction currency.
    pub currency: Currency,
    /// Optional risk tag.
    #[serde(default)]
    pub transaction_type: Option<TransactionType>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/policies` - List approval and transaction-type policies.
async fn list_policies(State(state): State<AppState>) -> Json<PoliciesResponse> {
    let table = state.workflow.service().resolver().table();
    Json(PoliciesResponse {
        base_currency: table.base_currency(),
        approval_policies: table.approval_policies().to_vec(),
        transaction_type_policies: table.transaction_type_policies().to_vec(),
    })
}

/// POST `/policies/resolve` - Resolve the approver chain for an amount.
async fn resolve_policy(
    State(state): State<AppState>,
    Json(body): Json<ResolvePolicyRequest>,
) -> Result<Json<PolicyDescription>, ApiError> {
    let description = state.workflow.service().resolver().describe_policy(
        body.amount,
        body.currency,
        body.transaction_type,
    )?;
    Ok(Json(description))
}
