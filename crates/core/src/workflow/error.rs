//! Workflow error types for request approval management.
//!
//! This module defines all error types that can occur during
//! workflow operations such as submissions, approvals and rejections.

use custody_shared::types::RequestId;
use thiserror::Error;

use crate::policy::{Approver, PolicyError};
use crate::workflow::types::{ApproverStatus, RequestStatus};

/// Errors that can occur during workflow operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Policy resolution failed at submission.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// The approver is not in the chain or may not act right now.
    #[error("{approver} cannot act on this request ({})", describe_status(.status.as_ref()))]
    IneligibleApprover {
        /// The approver who attempted to act.
        approver: Approver,
        /// Their derived status, `None` if not in the chain.
        status: Option<ApproverStatus>,
    },

    /// The action is not allowed from the request's current status.
    #[error("Cannot {action} a request that is {from}")]
    InvalidTransition {
        /// The current aggregate status.
        from: RequestStatus,
        /// The attempted action.
        action: &'static str,
    },

    /// Rejection reason is required but not provided.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,

    /// Submitted request data is malformed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Request not found.
    #[error("Request {0} not found")]
    RequestNotFound(RequestId),

    /// A request with this id already exists.
    #[error("Request {0} already exists")]
    DuplicateRequest(RequestId),

    /// The caller acted on a stale revision.
    #[error("Request changed concurrently (expected version {expected}, found {actual})")]
    VersionConflict {
        /// Version the caller last saw.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },
}

fn describe_status(status: Option<&ApproverStatus>) -> &'static str {
    status.map_or("not a required approver", ApproverStatus::as_str)
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Policy(err) => err.status_code(),

            Self::InvalidTransition { .. }
            | Self::RejectionReasonRequired
            | Self::Validation(_) => 400,

            Self::IneligibleApprover { .. } => 403,

            Self::RequestNotFound(_) => 404,

            Self::DuplicateRequest(_) | Self::VersionConflict { .. } => 409,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Policy(err) => err.error_code(),
            Self::IneligibleApprover { .. } => "INELIGIBLE_APPROVER",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::RequestNotFound(_) => "REQUEST_NOT_FOUND",
            Self::DuplicateRequest(_) => "DUPLICATE_REQUEST",
            Self::VersionConflict { .. } => "VERSION_CONFLICT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use custody_shared::types::Currency;
    use rust_decimal_macros::dec;

    #[test]
    fn test_invalid_transition_error() {
        let err = WorkflowError::InvalidTransition {
            from: RequestStatus::Approved,
            action: "reject",
        };
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
        assert_eq!(err.to_string(), "Cannot reject a request that is approved");
    }

    #[test]
    fn test_ineligible_approver_error() {
        let err = WorkflowError::IneligibleApprover {
            approver: Approver::from("CISO"),
            status: Some(ApproverStatus::Waiting),
        };
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "INELIGIBLE_APPROVER");
        assert_eq!(err.to_string(), "CISO cannot act on this request (waiting)");

        let err = WorkflowError::IneligibleApprover {
            approver: Approver::from("Intern"),
            status: None,
        };
        assert!(err.to_string().contains("not a required approver"));
    }

    #[test]
    fn test_rejection_reason_required_error() {
        let err = WorkflowError::RejectionReasonRequired;
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "REJECTION_REASON_REQUIRED");
    }

    #[test]
    fn test_request_not_found_error() {
        let err = WorkflowError::RequestNotFound(RequestId::new());
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "REQUEST_NOT_FOUND");
    }

    #[test]
    fn test_conflict_errors() {
        let err = WorkflowError::VersionConflict {
            expected: 2,
            actual: 3,
        };
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "VERSION_CONFLICT");

        let err = WorkflowError::DuplicateRequest(RequestId::new());
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "DUPLICATE_REQUEST");
    }

    #[test]
    fn test_policy_error_passes_through() {
        let err = WorkflowError::from(PolicyError::PolicyNotFound {
            currency: Currency::Usd,
            amount: dec!(10),
        });
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_code(), "POLICY_NOT_FOUND");
    }
}
