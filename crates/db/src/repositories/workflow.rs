//! Workflow repository for request state transitions.
//!
//! Couples the request store with [`WorkflowService`]: every transition
//! runs under the request's lock against a working copy and is committed
//! only if the service accepts it.

use std::sync::Arc;

use chrono::Utc;
use custody_core::policy::Approver;
use custody_core::workflow::{
    ApprovableRequest, NewRequest, WorkflowAction, WorkflowError, WorkflowService,
};
use custody_shared::types::{PageRequest, PageResponse, RequestId};

use super::request::{RequestFilter, RequestRepository};

/// A request after a transition, with the action that produced it.
pub type Transition = (ApprovableRequest, WorkflowAction);

/// Workflow repository for request state transitions.
#[derive(Clone)]
pub struct WorkflowRepository {
    requests: Arc<RequestRepository>,
    service: WorkflowService,
}

impl WorkflowRepository {
    /// Creates a new workflow repository.
    #[must_use]
    pub fn new(requests: Arc<RequestRepository>, service: WorkflowService) -> Self {
        Self { requests, service }
    }

    /// The underlying request store.
    #[must_use]
    pub fn requests(&self) -> &RequestRepository {
        &self.requests
    }

    /// The workflow service used for transitions.
    #[must_use]
    pub fn service(&self) -> &WorkflowService {
        &self.service
    }

    /// Submits and stores a new request.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A required field is blank or the amount is not positive
    /// - No approval policy covers the amount
    pub fn submit(&self, input: NewRequest) -> Result<Transition, WorkflowError> {
        let (request, action) = self.service.submit(input, Utc::now())?;
        self.requests.insert(request.clone())?;

        tracing::info!(
            request_id = %request.id(),
            kind = %request.kind(),
            requested_by = request.requested_by(),
            approvers = request.slots().len(),
            "request submitted"
        );
        Ok((request, action))
    }

    /// Returns a request by id.
    pub async fn get(&self, id: RequestId) -> Result<ApprovableRequest, WorkflowError> {
        self.requests.get(id).await
    }

    /// Lists stored requests, newest first.
    pub async fn list(
        &self,
        filter: &RequestFilter,
        page: &PageRequest,
    ) -> PageResponse<ApprovableRequest> {
        self.requests.list(filter, page).await
    }

    /// Records an approval.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Request is not found or was changed since `expected_version`
    /// - Request is not pending
    /// - Approver is not the one whose turn it is
    pub async fn approve(
        &self,
        id: RequestId,
        approver: &Approver,
        expected_version: Option<u64>,
    ) -> Result<Transition, WorkflowError> {
        let result = self
            .requests
            .update(id, expected_version, |request| {
                self.service.approve(request, approver, Utc::now())
            })
            .await;
        log_outcome(id, "approve", &result);
        result
    }

    /// Records a rejection.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Request is not found or was changed since `expected_version`
    /// - Reason is blank
    /// - Request is not pending
    /// - Approver is not in the chain or already decided
    pub async fn reject(
        &self,
        id: RequestId,
        approver: &Approver,
        reason: &str,
        expected_version: Option<u64>,
    ) -> Result<Transition, WorkflowError> {
        let result = self
            .requests
            .update(id, expected_version, |request| {
                self.service.reject(request, approver, reason, Utc::now())
            })
            .await;
        log_outcome(id, "reject", &result);
        result
    }

    /// Reopens a rejected request for a new approval cycle.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is missing, stale or not rejected.
    pub async fn reapprove(
        &self,
        id: RequestId,
        expected_version: Option<u64>,
    ) -> Result<Transition, WorkflowError> {
        let result = self
            .requests
            .update(id, expected_version, |request| {
                self.service.reapprove(request, Utc::now())
            })
            .await;
        log_outcome(id, "reapprove", &result);
        result
    }

    /// Archives a rejected request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is missing, stale or not rejected.
    pub async fn archive(
        &self,
        id: RequestId,
        expected_version: Option<u64>,
    ) -> Result<Transition, WorkflowError> {
        let result = self
            .requests
            .update(id, expected_version, |request| {
                self.service.archive(request, Utc::now())
            })
            .await;
        log_outcome(id, "archive", &result);
        result
    }
}

fn log_outcome(id: RequestId, action: &str, result: &Result<Transition, WorkflowError>) {
    match result {
        Ok((request, transition)) => tracing::info!(
            request_id = %id,
            action,
            approver = transition.approver().map(Approver::as_str),
            status = %transition.new_status(),
            version = request.version(),
            "workflow transition applied"
        ),
        Err(err) => tracing::warn!(
            request_id = %id,
            action,
            error_code = err.error_code(),
            error = %err,
            "workflow transition refused"
        ),
    }
}
