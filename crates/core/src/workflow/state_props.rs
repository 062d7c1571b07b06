//! Property-based tests for ApprovalStateMachine.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use crate::policy::Approver;
use crate::workflow::state::ApprovalStateMachine;
use crate::workflow::types::{ApproverSlot, ApproverStatus, Decision, RequestStatus};

fn arb_decision() -> impl Strategy<Value = Decision> {
    let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
    prop_oneof![
        3 => Just(Decision::Pending),
        3 => Just(Decision::Approved { approved_at: at }),
        1 => Just(Decision::Rejected {
            rejected_at: at,
            reason: "Policy breach".to_string(),
        }),
    ]
}

/// Chains of up to six approvers with arbitrary decisions.
fn arb_slots() -> impl Strategy<Value = Vec<ApproverSlot>> {
    prop::collection::vec(arb_decision(), 0..6).prop_map(|decisions| {
        decisions
            .into_iter()
            .enumerate()
            .map(|(idx, decision)| ApproverSlot {
                approver: Approver::new(format!("approver-{idx}")),
                decision,
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Ready means every earlier approver approved.
    #[test]
    fn prop_ready_only_after_all_prior_approved(slots in arb_slots()) {
        let statuses = ApprovalStateMachine::approver_statuses(&slots);
        for (idx, status) in statuses.iter().enumerate() {
            if *status == ApproverStatus::Ready {
                prop_assert!(slots[..idx].iter().all(|s| s.decision.is_approved()));
            }
        }
    }

    /// At most one approver is ready at a time.
    #[test]
    fn prop_at_most_one_ready(slots in arb_slots()) {
        let ready = ApprovalStateMachine::approver_statuses(&slots)
            .into_iter()
            .filter(|s| *s == ApproverStatus::Ready)
            .count();
        prop_assert!(ready <= 1);
    }

    /// Every undecided approver after a rejection is blocked.
    #[test]
    fn prop_rejection_blocks_downstream(slots in arb_slots()) {
        let statuses = ApprovalStateMachine::approver_statuses(&slots);
        if let Some(first) = slots.iter().position(|s| s.decision.is_rejected()) {
            for (slot, status) in slots.iter().zip(&statuses).skip(first + 1) {
                if matches!(slot.decision, Decision::Pending) {
                    prop_assert_eq!(*status, ApproverStatus::Blocked);
                }
            }
            prop_assert_eq!(
                ApprovalStateMachine::status_of_slots(&slots),
                RequestStatus::Rejected
            );
        }
    }

    /// Blocked never appears without an earlier rejection.
    #[test]
    fn prop_blocked_requires_prior_rejection(slots in arb_slots()) {
        let statuses = ApprovalStateMachine::approver_statuses(&slots);
        for (idx, status) in statuses.iter().enumerate() {
            if *status == ApproverStatus::Blocked {
                prop_assert!(slots[..idx].iter().any(|s| s.decision.is_rejected()));
            }
        }
    }

    /// The request is approved exactly when every slot approved.
    #[test]
    fn prop_approved_iff_all_approved(slots in arb_slots()) {
        let all = slots.iter().all(|s| s.decision.is_approved());
        let approved = ApprovalStateMachine::status_of_slots(&slots) == RequestStatus::Approved;
        prop_assert_eq!(all, approved);
    }

    /// Recorded decisions map straight to their status.
    #[test]
    fn prop_decided_slots_keep_their_decision(slots in arb_slots()) {
        let statuses = ApprovalStateMachine::approver_statuses(&slots);
        prop_assert_eq!(statuses.len(), slots.len());
        for (slot, status) in slots.iter().zip(&statuses) {
            match slot.decision {
                Decision::Approved { .. } => prop_assert_eq!(*status, ApproverStatus::Approved),
                Decision::Rejected { .. } => prop_assert_eq!(*status, ApproverStatus::Rejected),
                Decision::Pending => prop_assert!(matches!(
                    status,
                    ApproverStatus::Blocked | ApproverStatus::Waiting | ApproverStatus::Ready
                )),
            }
        }
    }

    /// Evaluating twice gives the same answer.
    #[test]
    fn prop_statuses_are_idempotent(slots in arb_slots()) {
        prop_assert_eq!(
            ApprovalStateMachine::approver_statuses(&slots),
            ApprovalStateMachine::approver_statuses(&slots)
        );
    }
}
