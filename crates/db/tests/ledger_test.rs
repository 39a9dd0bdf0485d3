//! Wallet ledger tests: account opening, postings, history and reconciliation.

mod common;

use sea_orm::TransactionTrait;

use gitmarket_core::ledger::{EntryKind, LedgerError, LedgerPosting};
use gitmarket_db::LedgerRepository;
use gitmarket_shared::types::UserId;

use common::{assert_reconciled, funded_user, rules_with_bonus, setup_db, setup_service, setup_service_with};

#[tokio::test]
async fn test_open_account_credits_signup_bonus_once() {
    let service = setup_service().await;
    let user = UserId::new();

    assert!(service.open_account(user).await.unwrap());
    assert!(!service.open_account(user).await.unwrap());

    assert_eq!(service.get_balance(user).await.unwrap(), 100);
    let history = service.list_transactions(user).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, EntryKind::SignupBonus);
    assert_eq!(history[0].amount, 100);
    assert_reconciled(&service, &[user]).await;
}

#[tokio::test]
async fn test_zero_bonus_writes_no_entry() {
    let service = setup_service_with(rules_with_bonus(0)).await;
    let user = funded_user(&service).await;

    assert_eq!(service.get_balance(user).await.unwrap(), 0);
    assert!(service.list_transactions(user).await.unwrap().is_empty());
    assert_eq!(service.get_account(user).await.unwrap().balance, 0);
}

#[tokio::test]
async fn test_unknown_account_reads_as_empty() {
    let service = setup_service().await;
    let stranger = UserId::new();

    assert_eq!(service.get_balance(stranger).await.unwrap(), 0);
    assert!(service.list_transactions(stranger).await.unwrap().is_empty());
    let err = service.get_account(stranger).await.unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");
}

#[tokio::test]
async fn test_debit_guarded_by_balance() {
    let db = setup_db().await;
    let ledger = LedgerRepository::new(db.clone());
    let user = UserId::new();

    let txn = db.begin().await.unwrap();
    LedgerRepository::open_account(&txn, user, 30).await.unwrap();
    let debit = LedgerPosting::debit(user, 31, EntryKind::BountyPlaced, None, "too much").unwrap();
    let err = LedgerRepository::post(&txn, &debit).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InsufficientFunds {
            balance: 30,
            requested: 31,
            ..
        }
    ));

    let exact = LedgerPosting::debit(user, 30, EntryKind::BountyPlaced, None, "all of it").unwrap();
    let entry = LedgerRepository::post(&txn, &exact).await.unwrap();
    assert_eq!(entry.amount, -30);
    txn.commit().await.unwrap();

    assert_eq!(ledger.balance_of(user).await.unwrap(), 0);
    assert_eq!(ledger.ledger_sum(user).await.unwrap(), 0);
}

#[tokio::test]
async fn test_posting_to_unopened_account() {
    let db = setup_db().await;
    let user = UserId::new();

    let credit = LedgerPosting::credit(user, 10, EntryKind::BountyEarned, None, "").unwrap();
    let err = LedgerRepository::post(&db, &credit).await.unwrap_err();
    assert!(matches!(err, LedgerError::AccountNotFound(id) if id == user));

    let debit = LedgerPosting::debit(user, 10, EntryKind::BountyPlaced, None, "").unwrap();
    let err = LedgerRepository::post(&db, &debit).await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { balance: 0, .. }));
}

#[tokio::test]
async fn test_rolled_back_posting_leaves_no_trace() {
    let db = setup_db().await;
    let ledger = LedgerRepository::new(db.clone());
    let user = UserId::new();

    LedgerRepository::open_account(&db, user, 100).await.unwrap();

    let txn = db.begin().await.unwrap();
    let debit = LedgerPosting::debit(user, 40, EntryKind::BountyPlaced, None, "abandoned").unwrap();
    LedgerRepository::post(&txn, &debit).await.unwrap();
    txn.rollback().await.unwrap();

    assert_eq!(ledger.balance_of(user).await.unwrap(), 100);
    assert_eq!(ledger.entries(user).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_history_is_newest_first() {
    let service = setup_service().await;
    let creator = funded_user(&service).await;

    let bounty = service
        .create_bounty(creator, common::issue(7), 40)
        .await
        .unwrap();
    service.cancel_bounty(bounty.id, creator).await.unwrap();

    let history = service.list_transactions(creator).await.unwrap();
    let kinds: Vec<EntryKind> = history.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EntryKind::BountyRefund,
            EntryKind::BountyPlaced,
            EntryKind::SignupBonus
        ]
    );
    assert!(history.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    assert_eq!(history[0].related_bounty_id, Some(bounty.id));
    assert_eq!(history[1].related_bounty_id, Some(bounty.id));
    assert_eq!(history[2].related_bounty_id, None);

    let sum: i64 = history.iter().map(|e| e.amount).sum();
    assert_eq!(sum, service.get_balance(creator).await.unwrap());
}
