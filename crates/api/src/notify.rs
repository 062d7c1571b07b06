//! Notification delivery through the tracing pipeline.

use custody_core::workflow::{
    ApprovableRequest, ApprovalStateMachine, Notifier, WorkflowAction,
};

/// Emits one structured event per workflow transition.
///
/// Downstream delivery (mail, chat) subscribes to the `custody::notify`
/// target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, request: &ApprovableRequest, action: &WorkflowAction) {
        let next = ApprovalStateMachine::progress(request).next_approver;
        tracing::info!(
            target: "custody::notify",
            request_id = %request.id(),
            kind = %request.kind(),
            action = action.name(),
            status = %action.new_status(),
            actor = action.approver().map(|a| a.as_str()),
            next_approver = next.as_ref().map(|a| a.as_str()),
            "approval workflow notification"
        );
    }
}
