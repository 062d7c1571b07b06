//! Request approval workflow.
//!
//! This module implements the sequential approval state machine shared
//! by withdrawals, budget-group creation and expenses, and the
//! transition contracts that mutate a request.
//!
//! # Modules
//!
//! - `types` - Workflow domain types (RequestStatus, ApproverStatus, Decision, WorkflowAction)
//! - `request` - The approvable request and its kind-specific details
//! - `state` - Derived per-approver and aggregate status
//! - `service` - Submit, approve, reject, reapprove and archive
//! - `notification` - Outbound notification port
//! - `error` - Workflow-specific error types

pub mod error;
pub mod notification;
pub mod request;
pub mod service;
pub mod state;
pub mod types;

#[cfg(test)]
mod service_props;
#[cfg(test)]
mod state_props;

pub use error::WorkflowError;
pub use notification::Notifier;
pub use request::{ApprovableRequest, NewRequest, RequestDetails, RequestKind};
pub use service::WorkflowService;
pub use state::{ApprovalProgress, ApprovalStateMachine, ApprovalView, ApproverView};
pub use types::{
    ApprovalCycle, ApprovalRecord, ApproverSlot, ApproverStatus, Decision, RejectionRecord,
    RequestStatus, WorkflowAction,
};
