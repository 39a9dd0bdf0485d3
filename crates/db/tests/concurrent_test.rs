//! Concurrent access tests for payouts, submissions and escrow.
//!
//! These tests verify that:
//! - Racing approvals on one bounty pay out exactly once
//! - Racing duplicate submissions leave a single pending submission
//! - Racing bounty creations never overdraw the creator
//! - Balances still match the ledger afterwards

#![allow(clippy::items_after_statements)]

mod common;

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Barrier;

use gitmarket_core::bounty::{BountyError, BountyStatus, SubmissionStatus};
use gitmarket_core::ledger::EntryKind;

use common::{assert_reconciled, funded_user, issue, pr_url, setup_service};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_double_approval_pays_once() {
    let service = setup_service().await;
    let creator = funded_user(&service).await;
    let solver = funded_user(&service).await;
    let bounty = service.create_bounty(creator, issue(1), 50).await.unwrap();
    let sub = service
        .submit_solution(bounty.id, solver, &pr_url(2), None)
        .await
        .unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let service = service.clone();
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                service.approve_submission(bounty.id, sub.id, creator).await
            })
        })
        .collect();

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|h| h.expect("task panicked"))
        .collect();

    let wins = results.iter().filter(|r| r.is_ok()).count();
    let lost_races = results
        .iter()
        .filter(|r| matches!(r, Err(BountyError::InvalidState(_))))
        .count();
    assert_eq!(wins, 1, "exactly one approval must commit: {results:?}");
    assert_eq!(lost_races, 1);

    assert_eq!(service.get_balance(solver).await.unwrap(), 150);
    let payouts = service
        .list_transactions(solver)
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.kind == EntryKind::BountyEarned)
        .count();
    assert_eq!(payouts, 1);
    assert_eq!(
        service.get_bounty(bounty.id).await.unwrap().status,
        BountyStatus::Paid
    );
    assert_reconciled(&service, &[creator, solver]).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_approving_competing_submissions_pays_one_solver() {
    const SOLVERS: usize = 8;

    let service = setup_service().await;
    let creator = funded_user(&service).await;
    let bounty = service.create_bounty(creator, issue(1), 40).await.unwrap();

    let mut pairs = Vec::with_capacity(SOLVERS);
    for n in 0..SOLVERS {
        let solver = funded_user(&service).await;
        let pr = i64::try_from(n).unwrap() + 10;
        let sub = service
            .submit_solution(bounty.id, solver, &pr_url(pr), None)
            .await
            .unwrap();
        pairs.push((solver, sub.id));
    }

    let barrier = Arc::new(Barrier::new(SOLVERS));
    let handles: Vec<_> = pairs
        .iter()
        .map(|&(_, submission_id)| {
            let service = service.clone();
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                service
                    .approve_submission(bounty.id, submission_id, creator)
                    .await
            })
        })
        .collect();

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|h| h.expect("task panicked"))
        .collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);

    let mut total_paid = 0;
    for (solver, _) in &pairs {
        total_paid += service.get_balance(*solver).await.unwrap() - 100;
    }
    assert_eq!(total_paid, 40);

    let detail = service.get_bounty_detail(bounty.id).await.unwrap();
    let approved = detail
        .submissions
        .iter()
        .filter(|s| s.status == SubmissionStatus::Approved)
        .count();
    assert_eq!(approved, 1);
    assert_eq!(detail.pending_count(), SOLVERS - 1);

    let mut everyone: Vec<_> = pairs.iter().map(|(s, _)| *s).collect();
    everyone.push(creator);
    assert_reconciled(&service, &everyone).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_submissions_conflict() {
    const ATTEMPTS: usize = 6;

    let service = setup_service().await;
    let creator = funded_user(&service).await;
    let solver = funded_user(&service).await;
    let bounty = service.create_bounty(creator, issue(1), 20).await.unwrap();

    let barrier = Arc::new(Barrier::new(ATTEMPTS));
    let handles: Vec<_> = (0..ATTEMPTS)
        .map(|_| {
            let service = service.clone();
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                service
                    .submit_solution(bounty.id, solver, &pr_url(2), None)
                    .await
            })
        })
        .collect();

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|h| h.expect("task panicked"))
        .collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter(|r| r.is_err())
        .all(|r| matches!(r, Err(BountyError::Conflict(_)))));

    let detail = service.get_bounty_detail(bounty.id).await.unwrap();
    assert_eq!(detail.pending_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creations_never_overdraw() {
    const ATTEMPTS: i64 = 10;

    let service = setup_service().await;
    let creator = funded_user(&service).await;

    let barrier = Arc::new(Barrier::new(usize::try_from(ATTEMPTS).unwrap()));
    let handles: Vec<_> = (0..ATTEMPTS)
        .map(|n| {
            let service = service.clone();
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                service.create_bounty(creator, issue(n + 1), 30).await
            })
        })
        .collect();

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|h| h.expect("task panicked"))
        .collect();

    // 100 covers three bounties of 30.
    let created = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(created, 3);
    assert!(results
        .iter()
        .filter(|r| r.is_err())
        .all(|r| matches!(r, Err(BountyError::InsufficientFunds { .. }))));

    assert_eq!(service.get_balance(creator).await.unwrap(), 10);
    assert_eq!(service.list_open_bounties().await.unwrap().len(), 3);
    assert_reconciled(&service, &[creator]).await;
}
