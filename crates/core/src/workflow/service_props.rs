//! Property-based tests for WorkflowService.
//!
//! Random operation sequences are replayed against a single request and
//! the workflow invariants are checked after every step.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use custody_shared::WorkflowConfig;
use custody_shared::types::{Currency, Money};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::currency::FixedRateTable;
use crate::policy::{Approver, PolicyResolver, PolicyTable, TransactionType};
use crate::workflow::request::{ApprovableRequest, NewRequest, RequestDetails};
use crate::workflow::service::WorkflowService;
use crate::workflow::state::ApprovalStateMachine;
use crate::workflow::types::{ApproverStatus, RequestStatus};

#[derive(Debug, Clone)]
enum Op {
    Approve(usize),
    Reject(usize),
    Reapprove,
    Archive,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..6).prop_map(Op::Approve),
        1 => (0usize..6).prop_map(Op::Reject),
        1 => Just(Op::Reapprove),
        1 => Just(Op::Archive),
    ]
}

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..500_000_000i64).prop_map(|n| Decimal::new(n, 0))
}

fn arb_transaction_type() -> impl Strategy<Value = Option<TransactionType>> {
    prop_oneof![
        Just(None),
        Just(Some(TransactionType::HighRisk)),
        Just(Some(TransactionType::CrossBorder)),
        Just(Some(TransactionType::LargeValue)),
    ]
}

fn service(discard: bool) -> WorkflowService {
    let resolver = PolicyResolver::new(
        PolicyTable::reference(),
        Arc::new(FixedRateTable::new(Currency::Krw)),
    )
    .expect("reference table");
    WorkflowService::new(
        resolver,
        WorkflowConfig {
            discard_approvals_on_reapprove: discard,
        },
    )
}

fn at(step: usize) -> DateTime<Utc> {
    let start = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
    start + chrono::Duration::minutes(i64::try_from(step).unwrap_or(i64::MAX))
}

fn submit(svc: &WorkflowService, amount: Decimal, tag: Option<TransactionType>) -> ApprovableRequest {
    let input = NewRequest {
        details: RequestDetails::Expense {
            group_name: "Operations".to_string(),
            description: "Validator hosting".to_string(),
            amount: Money::new(amount, Currency::Krw),
        },
        transaction_type: tag,
        requested_by: "Choi".to_string(),
    };
    svc.submit(input, at(0)).expect("submission succeeds").0
}

fn approver_at(request: &ApprovableRequest, idx: usize) -> Approver {
    let chain: Vec<&Approver> = request.required_approvals().collect();
    chain[idx % chain.len()].clone()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Failed operations leave the request untouched; successful ones bump
    /// the version by exactly one.
    #[test]
    fn prop_transitions_are_atomic(
        amount in arb_amount(),
        tag in arb_transaction_type(),
        discard in any::<bool>(),
        ops in prop::collection::vec(arb_op(), 1..24)
    ) {
        let svc = service(discard);
        let mut request = submit(&svc, amount, tag);

        for (step, op) in ops.into_iter().enumerate() {
            let before = request.clone();
            let now = at(step + 1);
            let result = match op {
                Op::Approve(idx) => {
                    let approver = approver_at(&request, idx);
                    svc.approve(&mut request, &approver, now)
                }
                Op::Reject(idx) => {
                    let approver = approver_at(&request, idx);
                    svc.reject(&mut request, &approver, "Missing invoice", now)
                }
                Op::Reapprove => svc.reapprove(&mut request, now),
                Op::Archive => svc.archive(&mut request, now),
            };

            match result {
                Ok(action) => {
                    prop_assert_eq!(request.version(), before.version() + 1);
                    prop_assert_eq!(
                        action.new_status(),
                        ApprovalStateMachine::aggregate_status(&request)
                    );
                }
                Err(_) => prop_assert_eq!(&request, &before),
            }
        }
    }

    /// Approvals only ever land on the ready approver, so the approved
    /// slots always form a prefix of the chain.
    #[test]
    fn prop_approvals_form_a_prefix(
        amount in arb_amount(),
        tag in arb_transaction_type(),
        discard in any::<bool>(),
        ops in prop::collection::vec(arb_op(), 1..24)
    ) {
        let svc = service(discard);
        let mut request = submit(&svc, amount, tag);

        for (step, op) in ops.into_iter().enumerate() {
            let now = at(step + 1);
            let _ = match op {
                Op::Approve(idx) => {
                    let approver = approver_at(&request, idx);
                    svc.approve(&mut request, &approver, now)
                }
                Op::Reject(idx) => {
                    let approver = approver_at(&request, idx);
                    svc.reject(&mut request, &approver, "Missing invoice", now)
                }
                Op::Reapprove => svc.reapprove(&mut request, now),
                Op::Archive => svc.archive(&mut request, now),
            };

            let approved: Vec<bool> = request
                .slots()
                .iter()
                .map(|s| s.decision.is_approved())
                .collect();
            let prefix = approved.iter().take_while(|a| **a).count();
            prop_assert!(approved[prefix..].iter().all(|a| !a));

            let status = ApprovalStateMachine::aggregate_status(&request);
            prop_assert_eq!(
                status == RequestStatus::Approved,
                prefix == approved.len()
            );
        }
    }

    /// Approving down the chain in order always ends approved.
    #[test]
    fn prop_in_order_approvals_complete(
        amount in arb_amount(),
        tag in arb_transaction_type()
    ) {
        let svc = service(true);
        let mut request = submit(&svc, amount, tag);
        let chain: Vec<Approver> = request.required_approvals().cloned().collect();

        for (step, approver) in chain.iter().enumerate() {
            prop_assert_eq!(
                ApprovalStateMachine::approver_status(&request, approver),
                Some(ApproverStatus::Ready)
            );
            prop_assert!(svc.approve(&mut request, approver, at(step + 1)).is_ok());
        }
        prop_assert_eq!(
            ApprovalStateMachine::aggregate_status(&request),
            RequestStatus::Approved
        );
    }

    /// Reapprove keeps every closed cycle in the history.
    #[test]
    fn prop_reapprove_preserves_history(
        amount in arb_amount(),
        discard in any::<bool>(),
        rounds in 1usize..5
    ) {
        let svc = service(discard);
        let mut request = submit(&svc, amount, None);

        for round in 0..rounds {
            let first = approver_at(&request, 0);
            let now = at(round * 2 + 1);
            if ApprovalStateMachine::approver_status(&request, &first) == Some(ApproverStatus::Ready) {
                svc.reject(&mut request, &first, "Resubmit with memo", now).expect("ready approver may reject");
            } else {
                let last = approver_at(&request, request.slots().len() - 1);
                svc.reject(&mut request, &last, "Resubmit with memo", now).expect("undecided approver may reject");
            }
            svc.reapprove(&mut request, at(round * 2 + 2)).expect("rejected request reopens");
        }

        prop_assert_eq!(request.history().len(), rounds);
        prop_assert_eq!(request.cycle() as usize, rounds + 1);
        prop_assert!(request.rejections().is_empty());
    }
}
