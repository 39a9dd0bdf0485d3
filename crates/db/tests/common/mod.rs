//! Shared setup for database integration tests.
//!
//! Every test gets its own in-memory SQLite database behind a single-connection
//! pool, so concurrent transactions queue on the connection the way they queue
//! on row locks in Postgres.

#![allow(dead_code)]

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use gitmarket_core::bounty::{IssueRef, MarketRules};
use gitmarket_core::events::EventPublisher;
use gitmarket_db::migration::Migrator;
use gitmarket_db::BountyService;
use gitmarket_shared::types::UserId;

/// Opens a fresh, migrated in-memory database.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None).await.expect("Failed to run migrations");
    db
}

/// A service with the default rules (minimum 5, signup bonus 100).
pub async fn setup_service() -> BountyService {
    setup_service_with(MarketRules::default()).await
}

/// A service with custom rules.
pub async fn setup_service_with(rules: MarketRules) -> BountyService {
    BountyService::new(setup_db().await, rules, EventPublisher::new(64))
}

/// Rules with a different signup bonus.
pub fn rules_with_bonus(signup_bonus: i64) -> MarketRules {
    MarketRules {
        signup_bonus,
        ..MarketRules::default()
    }
}

/// An issue on the demo repository.
pub fn issue(number: i64) -> IssueRef {
    IssueRef::new(
        "octo-org/widgets",
        number,
        format!("Widget #{number} renders upside down"),
        format!("https://github.com/octo-org/widgets/issues/{number}"),
    )
}

/// A pull request URL on the demo repository.
pub fn pr_url(number: i64) -> String {
    format!("https://github.com/octo-org/widgets/pull/{number}")
}

/// A fresh user with an opened account.
pub async fn funded_user(service: &BountyService) -> UserId {
    let user = UserId::new();
    service.open_account(user).await.expect("Failed to open account");
    user
}

/// Asserts the materialized balance matches the ledger for every user given.
pub async fn assert_reconciled(service: &BountyService, users: &[UserId]) {
    for user in users {
        let rec = service.reconcile_account(*user).await.unwrap();
        assert!(
            rec.is_consistent(),
            "account {user} drifted: stored {} vs ledger {}",
            rec.stored_balance,
            rec.ledger_sum
        );
    }
}
