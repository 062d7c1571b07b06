//! Concurrent access tests for request transitions.
//!
//! These tests verify that:
//! - Racing approvals for the same slot produce exactly one success
//! - Racing writers with the same expected version produce exactly one success
//! - Independent requests progress in parallel without interference

#![allow(clippy::uninlined_format_args)]

use std::sync::Arc;

use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Barrier;

use custody_core::currency::FixedRateTable;
use custody_core::policy::{Approver, PolicyResolver, PolicyTable};
use custody_core::workflow::{
    ApprovalStateMachine, NewRequest, RequestDetails, RequestStatus, WorkflowError,
    WorkflowService,
};
use custody_db::{RequestFilter, RequestRepository, WorkflowRepository};
use custody_shared::WorkflowConfig;
use custody_shared::types::{Currency, Money, PageRequest};

fn repository() -> Arc<WorkflowRepository> {
    let resolver = PolicyResolver::new(
        PolicyTable::reference(),
        Arc::new(FixedRateTable::new(Currency::Krw)),
    )
    .expect("reference table is valid");
    let service = WorkflowService::new(resolver, WorkflowConfig::default());
    Arc::new(WorkflowRepository::new(
        Arc::new(RequestRepository::new()),
        service,
    ))
}

fn withdrawal(amount: Decimal) -> NewRequest {
    NewRequest {
        details: RequestDetails::Withdrawal {
            amount: Money::new(amount, Currency::Krw),
            destination_address: "0x4b1a9c7e".to_string(),
            network: "ethereum".to_string(),
            memo: None,
        },
        transaction_type: None,
        requested_by: "treasury-bot".to_string(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_approvals_for_one_slot() {
    const NUM_TASKS: usize = 32;

    let repo = repository();
    let (request, _) = repo
        .submit(withdrawal(dec!(50000000)))
        .expect("submission succeeds");
    let id = request.id();

    let barrier = Arc::new(Barrier::new(NUM_TASKS));
    let mut handles = Vec::with_capacity(NUM_TASKS);

    for _ in 0..NUM_TASKS {
        let repo = Arc::clone(&repo);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            repo.approve(id, &Approver::from("CFO"), None).await
        }));
    }

    let results = join_all(handles).await;

    let mut success_count = 0;
    for result in results {
        match result.expect("task panicked") {
            Ok(_) => success_count += 1,
            Err(err) => assert!(
                matches!(
                    err,
                    WorkflowError::IneligibleApprover { .. }
                ),
                "unexpected error: {}",
                err
            ),
        }
    }

    assert_eq!(success_count, 1);

    let stored = repo.get(id).await.expect("request exists");
    assert_eq!(stored.approvals().len(), 1);
    assert_eq!(stored.version(), 2);
    assert_eq!(
        ApprovalStateMachine::aggregate_status(&stored),
        RequestStatus::Pending
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_with_same_version() {
    const NUM_TASKS: usize = 16;

    let repo = repository();
    let (request, _) = repo
        .submit(withdrawal(dec!(50000000)))
        .expect("submission succeeds");
    let id = request.id();
    let version = request.version();

    let barrier = Arc::new(Barrier::new(NUM_TASKS));
    let mut handles = Vec::with_capacity(NUM_TASKS);

    for i in 0..NUM_TASKS {
        let repo = Arc::clone(&repo);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            if i % 2 == 0 {
                repo.approve(id, &Approver::from("CFO"), Some(version)).await
            } else {
                repo.reject(id, &Approver::from("CISO"), "Hold for review", Some(version))
                    .await
            }
        }));
    }

    let results = join_all(handles).await;

    let mut success_count = 0;
    let mut conflict_count = 0;
    for result in results {
        match result.expect("task panicked") {
            Ok(_) => success_count += 1,
            Err(WorkflowError::VersionConflict { expected, actual }) => {
                assert_eq!(expected, version);
                assert_eq!(actual, version + 1);
                conflict_count += 1;
            }
            Err(err) => panic!("unexpected error: {}", err),
        }
    }

    assert_eq!(success_count, 1);
    assert_eq!(conflict_count, NUM_TASKS - 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_independent_requests_progress_in_parallel() {
    const NUM_REQUESTS: usize = 50;

    let repo = repository();
    let mut ids = Vec::with_capacity(NUM_REQUESTS);
    for _ in 0..NUM_REQUESTS {
        let (request, _) = repo
            .submit(withdrawal(dec!(50000000)))
            .expect("submission succeeds");
        ids.push(request.id());
    }

    let handles = ids.iter().copied().map(|id| {
        let repo = Arc::clone(&repo);
        tokio::spawn(async move {
            repo.approve(id, &Approver::from("CFO"), None).await?;
            repo.approve(id, &Approver::from("CISO"), None).await
        })
    });

    for result in join_all(handles).await {
        let (_, action) = result.expect("task panicked").expect("approval succeeds");
        assert_eq!(action.new_status(), RequestStatus::Approved);
    }

    let approved = repo
        .list(
            &RequestFilter {
                status: Some(RequestStatus::Approved),
                ..RequestFilter::default()
            },
            &PageRequest {
                page: 1,
                per_page: 100,
            },
        )
        .await;
    assert_eq!(approved.meta.total, 50);
}
