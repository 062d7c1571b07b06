//! Outbound notification port.

use crate::workflow::request::ApprovableRequest;
use crate::workflow::types::WorkflowAction;

/// Receives every successful workflow transition.
///
/// Implementations must not fail the transition; delivery problems are
/// theirs to log and swallow.
pub trait Notifier: Send + Sync {
    /// Called after `action` has been applied to `request`.
    fn notify(&self, request: &ApprovableRequest, action: &WorkflowAction);
}
