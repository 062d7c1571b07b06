//! Workflow service for request state transitions.
//!
//! This module enforces the transition contracts of the approval
//! workflow. Every method validates first and mutates only on success,
//! so a failed call leaves the request exactly as it was.

use chrono::{DateTime, Utc};
use custody_shared::WorkflowConfig;

use crate::policy::{Approver, PolicyResolver};
use crate::workflow::error::WorkflowError;
use crate::workflow::request::{ApprovableRequest, NewRequest, RequestDetails};
use crate::workflow::state::ApprovalStateMachine;
use crate::workflow::types::{ApproverStatus, Decision, RequestStatus, WorkflowAction};

/// Service for managing request workflow transitions.
///
/// Holds the policy resolver used at submission and the workflow
/// configuration. Cheap to clone.
#[derive(Clone)]
pub struct WorkflowService {
    resolver: PolicyResolver,
    config: WorkflowConfig,
}

impl WorkflowService {
    /// Creates a service.
    #[must_use]
    pub fn new(resolver: PolicyResolver, config: WorkflowConfig) -> Self {
        Self { resolver, config }
    }

    /// The resolver used to freeze approver chains.
    #[must_use]
    pub fn resolver(&self) -> &PolicyResolver {
        &self.resolver
    }

    /// The workflow configuration.
    #[must_use]
    pub fn config(&self) -> WorkflowConfig {
        self.config
    }

    /// Submit a new request for approval.
    ///
    /// # Arguments
    /// * `input` - Kind-specific details, risk tag and submitter
    /// * `at` - Submission time
    ///
    /// # Returns
    /// * `Ok((request, WorkflowAction::Submit))` with the chain frozen
    /// * `Err(WorkflowError::Validation)` if a required field is blank or the amount is not positive
    /// * `Err(WorkflowError::Policy)` if no approver chain can be resolved
    pub fn submit(
        &self,
        input: NewRequest,
        at: DateTime<Utc>,
    ) -> Result<(ApprovableRequest, WorkflowAction), WorkflowError> {
        validate_new_request(&input)?;

        let amount = input.details.amount();
        let required_approvers = self.resolver.resolve_required_approvers(
            amount.amount,
            amount.currency,
            input.transaction_type,
        )?;

        let request = ApprovableRequest::new(input, required_approvers.clone(), at);
        let action = WorkflowAction::Submit {
            new_status: ApprovalStateMachine::aggregate_status(&request),
            submitted_by: request.requested_by().to_string(),
            submitted_at: at,
            required_approvers,
        };
        Ok((request, action))
    }

    /// Record an approval.
    ///
    /// # Returns
    /// * `Ok(WorkflowAction::Approve)` if the approver was `ready`
    /// * `Err(WorkflowError::InvalidTransition)` if the request is not pending
    /// * `Err(WorkflowError::IneligibleApprover)` if the approver is not in the chain or not `ready`
    pub fn approve(
        &self,
        request: &mut ApprovableRequest,
        approver: &Approver,
        at: DateTime<Utc>,
    ) -> Result<WorkflowAction, WorkflowError> {
        ensure_status(request, RequestStatus::Pending, "approve")?;
        let position = eligible_position(request, approver, |s| s == ApproverStatus::Ready)?;

        request.set_decision(position, Decision::Approved { approved_at: at });
        request.bump_version();

        Ok(WorkflowAction::Approve {
            new_status: ApprovalStateMachine::aggregate_status(request),
            approver: approver.clone(),
            approved_at: at,
        })
    }

    /// Record a rejection.
    ///
    /// Any undecided approver may reject while the request is pending,
    /// including one still waiting on earlier approvers.
    ///
    /// # Returns
    /// * `Ok(WorkflowAction::Reject)` on success
    /// * `Err(WorkflowError::InvalidTransition)` if the request is not pending
    /// * `Err(WorkflowError::RejectionReasonRequired)` if the reason is blank
    /// * `Err(WorkflowError::IneligibleApprover)` if the approver is not in the chain or already decided
    pub fn reject(
        &self,
        request: &mut ApprovableRequest,
        approver: &Approver,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<WorkflowAction, WorkflowError> {
        ensure_status(request, RequestStatus::Pending, "reject")?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(WorkflowError::RejectionReasonRequired);
        }
        let position = eligible_position(request, approver, |s| {
            matches!(s, ApproverStatus::Ready | ApproverStatus::Waiting)
        })?;

        request.set_decision(
            position,
            Decision::Rejected {
                rejected_at: at,
                reason: reason.to_string(),
            },
        );
        request.bump_version();

        Ok(WorkflowAction::Reject {
            new_status: ApprovalStateMachine::aggregate_status(request),
            approver: approver.clone(),
            rejected_at: at,
            rejection_reason: reason.to_string(),
        })
    }

    /// Send a rejected request back for approval.
    ///
    /// The closed cycle is appended to the request's history. Whether
    /// earlier approvals survive depends on
    /// [`WorkflowConfig::discard_approvals_on_reapprove`].
    ///
    /// # Returns
    /// * `Ok(WorkflowAction::Reapprove)` on success
    /// * `Err(WorkflowError::InvalidTransition)` if the request is not rejected
    pub fn reapprove(
        &self,
        request: &mut ApprovableRequest,
        at: DateTime<Utc>,
    ) -> Result<WorkflowAction, WorkflowError> {
        ensure_status(request, RequestStatus::Rejected, "reapprove")?;

        let discard = self.config.discard_approvals_on_reapprove;
        request.close_cycle(at, discard);
        request.bump_version();

        Ok(WorkflowAction::Reapprove {
            new_status: ApprovalStateMachine::aggregate_status(request),
            cycle: request.cycle(),
            approvals_discarded: discard,
            reapproved_at: at,
        })
    }

    /// Archive a rejected request. Archived requests are terminal.
    ///
    /// # Returns
    /// * `Ok(WorkflowAction::Archive)` on success
    /// * `Err(WorkflowError::InvalidTransition)` if the request is not rejected
    pub fn archive(
        &self,
        request: &mut ApprovableRequest,
        at: DateTime<Utc>,
    ) -> Result<WorkflowAction, WorkflowError> {
        ensure_status(request, RequestStatus::Rejected, "archive")?;

        request.mark_archived(at);
        request.bump_version();

        Ok(WorkflowAction::Archive {
            new_status: ApprovalStateMachine::aggregate_status(request),
            archived_at: at,
        })
    }
}

fn ensure_status(
    request: &ApprovableRequest,
    expected: RequestStatus,
    action: &'static str,
) -> Result<(), WorkflowError> {
    let from = ApprovalStateMachine::aggregate_status(request);
    if from == expected {
        Ok(())
    } else {
        Err(WorkflowError::InvalidTransition { from, action })
    }
}

fn eligible_position(
    request: &ApprovableRequest,
    approver: &Approver,
    allowed: impl Fn(ApproverStatus) -> bool,
) -> Result<usize, WorkflowError> {
    let position = request
        .position_of(approver)
        .ok_or_else(|| WorkflowError::IneligibleApprover {
            approver: approver.clone(),
            status: None,
        })?;
    let status = ApprovalStateMachine::approver_statuses(&request.slots()[..=position])[position];
    if allowed(status) {
        Ok(position)
    } else {
        Err(WorkflowError::IneligibleApprover {
            approver: approver.clone(),
            status: Some(status),
        })
    }
}

fn validate_new_request(input: &NewRequest) -> Result<(), WorkflowError> {
    require("requested_by", &input.requested_by)?;

    match &input.details {
        RequestDetails::Withdrawal {
            destination_address,
            network,
            ..
        } => {
            require("destination_address", destination_address)?;
            require("network", network)?;
        }
        RequestDetails::GroupCreation {
            group_name,
            manager,
            ..
        } => {
            require("group_name", group_name)?;
            require("manager", manager)?;
        }
        RequestDetails::Expense {
            group_name,
            description,
            ..
        } => {
            require("group_name", group_name)?;
            require("description", description)?;
        }
    }

    let amount = input.details.amount();
    if amount.is_zero() || amount.is_negative() {
        return Err(WorkflowError::Validation(format!(
            "amount must be positive, got {amount}"
        )));
    }
    Ok(())
}

fn require(field: &str, value: &str) -> Result<(), WorkflowError> {
    if value.trim().is_empty() {
        Err(WorkflowError::Validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}
