//! The approvable request shared by withdrawals, group creation and expenses.

use chrono::{DateTime, Utc};
use custody_shared::types::{Money, RequestId};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::policy::{Approver, TransactionType};
use crate::workflow::types::{
    ApprovalCycle, ApprovalRecord, ApproverSlot, Decision, RejectionRecord,
};

/// The kind of request awaiting approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Outbound transfer of funds to a whitelisted address.
    Withdrawal,
    /// Creation of a budget group.
    GroupCreation,
    /// Spending against a group budget.
    Expense,
}

impl RequestKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Withdrawal => "withdrawal",
            Self::GroupCreation => "group_creation",
            Self::Expense => "expense",
        }
    }

    /// Parses a kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "withdrawal" => Some(Self::Withdrawal),
            "group_creation" | "group" => Some(Self::GroupCreation),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific payload of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestDetails {
    /// Withdrawal to an external address.
    Withdrawal {
        /// Amount and asset to send.
        amount: Money,
        /// Whitelisted destination address.
        destination_address: String,
        /// Network the transfer is broadcast on.
        network: String,
        /// Optional memo / destination tag.
        #[serde(default)]
        memo: Option<String>,
    },
    /// Budget group creation.
    GroupCreation {
        /// Name of the new group.
        group_name: String,
        /// Budget allotted to the group.
        budget: Money,
        /// Person responsible for the group.
        manager: String,
    },
    /// Expense charged to a group.
    Expense {
        /// Group the expense is charged to.
        group_name: String,
        /// What the money is for.
        description: String,
        /// Amount spent.
        amount: Money,
    },
}

impl RequestDetails {
    /// The request kind.
    #[must_use]
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Withdrawal { .. } => RequestKind::Withdrawal,
            Self::GroupCreation { .. } => RequestKind::GroupCreation,
            Self::Expense { .. } => RequestKind::Expense,
        }
    }

    /// The amount the approval policy is resolved against.
    #[must_use]
    pub fn amount(&self) -> Money {
        match self {
            Self::Withdrawal { amount, .. } | Self::Expense { amount, .. } => *amount,
            Self::GroupCreation { budget, .. } => *budget,
        }
    }
}

/// Input for submitting a new request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRequest {
    /// Kind-specific payload.
    pub details: RequestDetails,
    /// Optional risk tag.
    #[serde(default)]
    pub transaction_type: Option<TransactionType>,
    /// Who is submitting.
    pub requested_by: String,
}

/// A request moving through the sequential approval chain.
///
/// The approver chain is frozen at submission. Decisions only change
/// through [`WorkflowService`](crate::workflow::WorkflowService).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovableRequest {
    id: RequestId,
    details: RequestDetails,
    transaction_type: Option<TransactionType>,
    requested_by: String,
    created_at: DateTime<Utc>,
    slots: Vec<ApproverSlot>,
    history: Vec<ApprovalCycle>,
    cycle: u32,
    archived_at: Option<DateTime<Utc>>,
    version: u64,
}

impl ApprovableRequest {
    pub(crate) fn new(
        input: NewRequest,
        required_approvers: Vec<Approver>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RequestId::new(),
            details: input.details,
            transaction_type: input.transaction_type,
            requested_by: input.requested_by.trim().to_string(),
            created_at,
            slots: required_approvers
                .into_iter()
                .map(ApproverSlot::pending)
                .collect(),
            history: Vec::new(),
            cycle: 1,
            archived_at: None,
            version: 1,
        }
    }

    /// Request identifier.
    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Kind-specific payload.
    #[must_use]
    pub fn details(&self) -> &RequestDetails {
        &self.details
    }

    /// Request kind.
    #[must_use]
    pub fn kind(&self) -> RequestKind {
        self.details.kind()
    }

    /// Risk tag given at submission.
    #[must_use]
    pub fn transaction_type(&self) -> Option<TransactionType> {
        self.transaction_type
    }

    /// Who submitted the request.
    #[must_use]
    pub fn requested_by(&self) -> &str {
        &self.requested_by
    }

    /// Submission time.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The frozen approver chain, in the order approvers must act.
    pub fn required_approvals(&self) -> impl Iterator<Item = &Approver> {
        self.slots.iter().map(|s| &s.approver)
    }

    /// Approver slots with their current decisions.
    #[must_use]
    pub fn slots(&self) -> &[ApproverSlot] {
        &self.slots
    }

    /// Position of an approver in the chain.
    #[must_use]
    pub fn position_of(&self, approver: &Approver) -> Option<usize> {
        self.slots.iter().position(|s| &s.approver == approver)
    }

    /// Approvals recorded in the current cycle, in chain order.
    #[must_use]
    pub fn approvals(&self) -> Vec<ApprovalRecord> {
        self.slots
            .iter()
            .filter_map(|slot| match &slot.decision {
                Decision::Approved { approved_at } => Some(ApprovalRecord {
                    user_name: slot.approver.clone(),
                    approved_at: *approved_at,
                }),
                _ => None,
            })
            .collect()
    }

    /// Rejections recorded in the current cycle, in chain order.
    #[must_use]
    pub fn rejections(&self) -> Vec<RejectionRecord> {
        self.slots
            .iter()
            .filter_map(|slot| match &slot.decision {
                Decision::Rejected {
                    rejected_at,
                    reason,
                } => Some(RejectionRecord {
                    user_name: slot.approver.clone(),
                    rejected_at: *rejected_at,
                    reason: reason.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Closed approval cycles, oldest first.
    #[must_use]
    pub fn history(&self) -> &[ApprovalCycle] {
        &self.history
    }

    /// Current approval cycle, starting at 1.
    #[must_use]
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    /// When the request was archived, if it was.
    #[must_use]
    pub fn archived_at(&self) -> Option<DateTime<Utc>> {
        self.archived_at
    }

    /// Monotonic revision, bumped by every successful transition.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn set_decision(&mut self, index: usize, decision: Decision) {
        self.slots[index].decision = decision;
    }

    pub(crate) fn close_cycle(&mut self, closed_at: DateTime<Utc>, discard_approvals: bool) {
        self.history.push(ApprovalCycle {
            cycle: self.cycle,
            approvals: self.approvals(),
            rejections: self.rejections(),
            closed_at,
        });
        for slot in &mut self.slots {
            if discard_approvals || slot.decision.is_rejected() {
                slot.decision = Decision::Pending;
            }
        }
        self.cycle += 1;
    }

    pub(crate) fn mark_archived(&mut self, archived_at: DateTime<Utc>) {
        self.archived_at = Some(archived_at);
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use custody_shared::types::Currency;
    use rust_decimal_macros::dec;

    fn withdrawal() -> NewRequest {
        NewRequest {
            details: RequestDetails::Withdrawal {
                amount: Money::new(dec!(1.5), Currency::Btc),
                destination_address: "bc1qexampleaddress".to_string(),
                network: "bitcoin".to_string(),
                memo: None,
            },
            transaction_type: None,
            requested_by: " ops-desk ".to_string(),
        }
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(RequestKind::parse("withdrawal"), Some(RequestKind::Withdrawal));
        assert_eq!(
            RequestKind::parse("GROUP_CREATION"),
            Some(RequestKind::GroupCreation)
        );
        assert_eq!(RequestKind::parse("group"), Some(RequestKind::GroupCreation));
        assert_eq!(RequestKind::parse("expense"), Some(RequestKind::Expense));
        assert_eq!(RequestKind::parse("deposit"), None);
    }

    #[test]
    fn test_details_amount() {
        let group = RequestDetails::GroupCreation {
            group_name: "Treasury".to_string(),
            budget: Money::new(dec!(30000000), Currency::Krw),
            manager: "Kim".to_string(),
        };
        assert_eq!(group.kind(), RequestKind::GroupCreation);
        assert_eq!(group.amount(), Money::new(dec!(30000000), Currency::Krw));
    }

    #[test]
    fn test_new_request_starts_undecided() {
        let request = ApprovableRequest::new(
            withdrawal(),
            vec![Approver::from("CFO"), Approver::from("CISO")],
            Utc::now(),
        );
        assert_eq!(request.kind(), RequestKind::Withdrawal);
        assert_eq!(request.requested_by(), "ops-desk");
        assert_eq!(request.cycle(), 1);
        assert_eq!(request.version(), 1);
        assert!(request.approvals().is_empty());
        assert!(request.rejections().is_empty());
        let chain: Vec<&str> = request.required_approvals().map(Approver::as_str).collect();
        assert_eq!(chain, vec!["CFO", "CISO"]);
        assert_eq!(request.position_of(&Approver::from("CISO")), Some(1));
        assert_eq!(request.position_of(&Approver::from("CEO")), None);
    }

    #[test]
    fn test_close_cycle_keeps_history() {
        let now = Utc::now();
        let mut request = ApprovableRequest::new(
            withdrawal(),
            vec![Approver::from("CFO"), Approver::from("CISO")],
            now,
        );
        request.set_decision(0, Decision::Approved { approved_at: now });
        request.set_decision(
            1,
            Decision::Rejected {
                rejected_at: now,
                reason: "Wrong network".to_string(),
            },
        );

        request.close_cycle(now, false);

        assert_eq!(request.cycle(), 2);
        assert_eq!(request.history().len(), 1);
        assert_eq!(request.history()[0].approvals.len(), 1);
        assert_eq!(request.history()[0].rejections.len(), 1);
        assert_eq!(request.approvals().len(), 1);
        assert!(request.rejections().is_empty());
    }

    #[test]
    fn test_serde_snapshot() {
        let request = ApprovableRequest::new(withdrawal(), vec![Approver::from("CFO")], Utc::now());
        let json = serde_json::to_string(&request).unwrap();
        let restored: ApprovableRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, request);
    }
}
