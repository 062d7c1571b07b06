//! Workflow domain types for request approval management.
//!
//! This module defines the statuses, per-approver decisions and audit
//! actions shared by every approvable request kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::policy::Approver;

/// Aggregate status of an approvable request.
///
/// The valid transitions are:
/// - Pending → Approved (last approver approves)
/// - Pending → Rejected (any approver rejects)
/// - Rejected → Pending (reapprove)
/// - Rejected → Archived (archive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Collecting approvals.
    Pending,
    /// Every required approver has approved.
    Approved,
    /// At least one approver rejected.
    Rejected,
    /// Rejected and closed without further action.
    Archived,
}

impl RequestStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Archived => "archived",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived status of one required approver.
///
/// Never stored; recomputed from the request's decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApproverStatus {
    /// This approver approved.
    Approved,
    /// This approver rejected.
    Rejected,
    /// An earlier approver rejected; this one cannot act.
    Blocked,
    /// Earlier approvers have not all approved yet.
    Waiting,
    /// Every earlier approver approved; this one may act now.
    Ready,
}

impl ApproverStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Blocked => "blocked",
            Self::Waiting => "waiting",
            Self::Ready => "ready",
        }
    }
}

impl fmt::Display for ApproverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The decision recorded for one approver slot.
///
/// A slot holds at most one decision, so an approver can never be both
/// approved and rejected in the same cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Decision {
    /// No decision yet.
    Pending,
    /// Approved at the given time.
    Approved {
        /// When the approval was recorded.
        approved_at: DateTime<Utc>,
    },
    /// Rejected at the given time.
    Rejected {
        /// When the rejection was recorded.
        rejected_at: DateTime<Utc>,
        /// Why the approver rejected.
        reason: String,
    },
}

impl Decision {
    /// Returns true for an approval.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved { .. })
    }

    /// Returns true for a rejection.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// One entry of a request's frozen approver chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproverSlot {
    /// The required approver.
    pub approver: Approver,
    /// The approver's decision in the current cycle.
    pub decision: Decision,
}

impl ApproverSlot {
    /// Creates an undecided slot.
    #[must_use]
    pub fn pending(approver: Approver) -> Self {
        Self {
            approver,
            decision: Decision::Pending,
        }
    }
}

/// An approval, as recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    /// Who approved.
    pub user_name: Approver,
    /// When.
    pub approved_at: DateTime<Utc>,
}

/// A rejection, as recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionRecord {
    /// Who rejected.
    pub user_name: Approver,
    /// When.
    pub rejected_at: DateTime<Utc>,
    /// Why.
    pub reason: String,
}

/// Decisions of a closed approval cycle, kept after a reapprove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalCycle {
    /// Cycle number, starting at 1.
    pub cycle: u32,
    /// Approvals recorded during the cycle.
    pub approvals: Vec<ApprovalRecord>,
    /// Rejections recorded during the cycle.
    pub rejections: Vec<RejectionRecord>,
    /// When the cycle was closed.
    pub closed_at: DateTime<Utc>,
}

/// Workflow action representing a state transition with audit data.
///
/// Each variant captures the action performed, the resulting status,
/// and the audit trail information (who, when, why).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WorkflowAction {
    /// A request was submitted with a frozen approver chain.
    Submit {
        /// The new status after submission.
        new_status: RequestStatus,
        /// Who submitted the request.
        submitted_by: String,
        /// When the request was submitted.
        submitted_at: DateTime<Utc>,
        /// The chain resolved at submission.
        required_approvers: Vec<Approver>,
    },
    /// An approver approved.
    Approve {
        /// The new status after approval.
        new_status: RequestStatus,
        /// The approver who acted.
        approver: Approver,
        /// When the approval was recorded.
        approved_at: DateTime<Utc>,
    },
    /// An approver rejected.
    Reject {
        /// The new status after rejection.
        new_status: RequestStatus,
        /// The approver who acted.
        approver: Approver,
        /// When the rejection was recorded.
        rejected_at: DateTime<Utc>,
        /// The reason for rejection.
        rejection_reason: String,
    },
    /// A rejected request was sent back for approval.
    Reapprove {
        /// The new status after reapproval.
        new_status: RequestStatus,
        /// The cycle that was opened.
        cycle: u32,
        /// Whether earlier approvals were dropped.
        approvals_discarded: bool,
        /// When the request was reopened.
        reapproved_at: DateTime<Utc>,
    },
    /// A rejected request was archived.
    Archive {
        /// The new status after archiving.
        new_status: RequestStatus,
        /// When the request was archived.
        archived_at: DateTime<Utc>,
    },
}

impl WorkflowAction {
    /// Returns the new status resulting from this action.
    #[must_use]
    pub fn new_status(&self) -> RequestStatus {
        match self {
            Self::Submit { new_status, .. }
            | Self::Approve { new_status, .. }
            | Self::Reject { new_status, .. }
            | Self::Reapprove { new_status, .. }
            | Self::Archive { new_status, .. } => *new_status,
        }
    }

    /// Returns the action name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submit { .. } => "submit",
            Self::Approve { .. } => "approve",
            Self::Reject { .. } => "reject",
            Self::Reapprove { .. } => "reapprove",
            Self::Archive { .. } => "archive",
        }
    }

    /// Returns the approver who acted, for approve and reject.
    #[must_use]
    pub fn approver(&self) -> Option<&Approver> {
        match self {
            Self::Approve { approver, .. } | Self::Reject { approver, .. } => Some(approver),
            _ => None,
        }
    }
}
