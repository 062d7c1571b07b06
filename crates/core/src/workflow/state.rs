//! Sequential approval state machine.
//!
//! Derives per-approver and aggregate status from a request's recorded
//! decisions. Read-only and idempotent: it never mutates a request.

use serde::Serialize;

use crate::policy::Approver;
use crate::workflow::request::ApprovableRequest;
use crate::workflow::types::{ApproverSlot, ApproverStatus, Decision, RequestStatus};

/// One approver with its derived status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApproverView {
    /// Position in the chain (0-indexed).
    pub position: usize,
    /// The approver.
    pub approver: Approver,
    /// Derived status.
    pub status: ApproverStatus,
}

/// Progress through the approver chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalProgress {
    /// Approvals recorded in the current cycle.
    pub approved: usize,
    /// Length of the chain.
    pub required: usize,
    /// The approver who may act now, if any.
    pub next_approver: Option<Approver>,
}

/// Full derived view of a request's approval state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalView {
    /// Aggregate status.
    pub status: RequestStatus,
    /// Per-approver statuses in chain order.
    pub approvers: Vec<ApproverView>,
    /// Chain progress.
    pub progress: ApprovalProgress,
}

/// Stateless evaluator for the sequential approval chain.
///
/// Approver `i` may act only once approvers `0..i` have all approved.
/// A rejection anywhere blocks every undecided approver after it and
/// rejects the request as a whole.
pub struct ApprovalStateMachine;

impl ApprovalStateMachine {
    /// Derives the status of every slot in one pass.
    ///
    /// For the approver at position `i`:
    /// 1. approved if it approved
    /// 2. rejected if it rejected
    /// 3. blocked if any earlier approver rejected
    /// 4. waiting if any earlier approver has not approved
    /// 5. ready otherwise
    #[must_use]
    pub fn approver_statuses(slots: &[ApproverSlot]) -> Vec<ApproverStatus> {
        let mut prior_rejected = false;
        let mut prior_all_approved = true;

        slots
            .iter()
            .map(|slot| {
                let status = match slot.decision {
                    Decision::Approved { .. } => ApproverStatus::Approved,
                    Decision::Rejected { .. } => ApproverStatus::Rejected,
                    Decision::Pending if prior_rejected => ApproverStatus::Blocked,
                    Decision::Pending if !prior_all_approved => ApproverStatus::Waiting,
                    Decision::Pending => ApproverStatus::Ready,
                };
                prior_rejected |= slot.decision.is_rejected();
                prior_all_approved &= slot.decision.is_approved();
                status
            })
            .collect()
    }

    /// Derives the status of one approver, `None` if not in the chain.
    #[must_use]
    pub fn approver_status(
        request: &ApprovableRequest,
        approver: &Approver,
    ) -> Option<ApproverStatus> {
        let position = request.position_of(approver)?;
        Self::approver_statuses(&request.slots()[..=position])
            .last()
            .copied()
    }

    /// Derives the aggregate status of a request.
    #[must_use]
    pub fn aggregate_status(request: &ApprovableRequest) -> RequestStatus {
        if request.archived_at().is_some() {
            return RequestStatus::Archived;
        }
        Self::status_of_slots(request.slots())
    }

    /// Aggregate status from decisions alone (no archive flag).
    #[must_use]
    pub fn status_of_slots(slots: &[ApproverSlot]) -> RequestStatus {
        if slots.iter().any(|s| s.decision.is_rejected()) {
            RequestStatus::Rejected
        } else if slots.iter().all(|s| s.decision.is_approved()) {
            RequestStatus::Approved
        } else {
            RequestStatus::Pending
        }
    }

    /// Counts approvals and finds the approver who may act next.
    #[must_use]
    pub fn progress(request: &ApprovableRequest) -> ApprovalProgress {
        let statuses = Self::approver_statuses(request.slots());
        Self::progress_from(request, &statuses)
    }

    /// Computes the aggregate status, per-approver views and progress.
    #[must_use]
    pub fn evaluate(request: &ApprovableRequest) -> ApprovalView {
        let statuses = Self::approver_statuses(request.slots());
        let approvers = request
            .slots()
            .iter()
            .zip(&statuses)
            .enumerate()
            .map(|(position, (slot, status))| ApproverView {
                position,
                approver: slot.approver.clone(),
                status: *status,
            })
            .collect();

        ApprovalView {
            status: Self::aggregate_status(request),
            approvers,
            progress: Self::progress_from(request, &statuses),
        }
    }

    fn progress_from(request: &ApprovableRequest, statuses: &[ApproverStatus]) -> ApprovalProgress {
        let approved = statuses
            .iter()
            .filter(|s| **s == ApproverStatus::Approved)
            .count();
        let next_approver = if request.archived_at().is_some() {
            None
        } else {
            statuses
                .iter()
                .position(|s| *s == ApproverStatus::Ready)
                .map(|idx| request.slots()[idx].approver.clone())
        };

        ApprovalProgress {
            approved,
            required: statuses.len(),
            next_approver,
        }
    }
}
