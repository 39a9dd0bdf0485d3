//! Demo data seeder for GitMarket development.
//!
//! Opens wallets for three demo users, places bounties on demo issues and
//! files a pending submission on each open bounty. Everything goes through
//! `BountyService`, so escrow and ledger entries are real. Re-running is
//! safe: existing bounties and submissions are skipped.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use sea_orm_migration::MigratorTrait;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use gitmarket_core::bounty::{BountyError, IssueRef};
use gitmarket_db::migration::Migrator;
use gitmarket_db::{BountyService, connect};
use gitmarket_shared::AppConfig;
use gitmarket_shared::types::UserId;

/// Demo users (stable ids so re-runs find the same wallets).
const DEMO_USERS: [(&str, Uuid); 3] = [
    ("alice-dev", Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_a11c)),
    ("bob-codes", Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0b0b)),
    ("carol-hacker", Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_ca01)),
];

/// Repositories the demo bounties are spread across.
const DEMO_REPOS: [&str; 2] = ["gitmarket-demo/web", "gitmarket-demo/api"];

/// (issue number, title, amount)
const DEMO_BOUNTIES: [(i64, &str, i64); 6] = [
    (29001, "Fix memory leak in production builds", 75),
    (29002, "Add dark mode support", 120),
    (29003, "Improve TypeScript type inference", 60),
    (29004, "Fix SSR hydration mismatch warning", 90),
    (29005, "Add WebSocket reconnection logic", 45),
    (29006, "Optimize bundle size for mobile", 100),
];

const DEMO_COMMENT: &str = "Fixed the issue. Tests passing locally.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log.filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    Migrator::up(&db, None).await.context("Failed to run migrations")?;
    info!("Connected to database");

    let service = BountyService::from_config(db, &config.market);
    let users: Vec<UserId> = DEMO_USERS
        .iter()
        .map(|(_, id)| UserId::from_uuid(*id))
        .collect();

    info!("Seeding demo users...");
    seed_users(&service).await?;

    info!("Seeding demo bounties...");
    seed_bounties(&service, &users).await?;

    info!("Seeding demo submissions...");
    seed_submissions(&service, &users).await?;

    for (name, id) in DEMO_USERS {
        let balance = service.get_balance(UserId::from_uuid(id)).await?;
        info!(user = name, balance, "Demo wallet");
    }
    info!("Seeding complete!");
    Ok(())
}

async fn seed_users(service: &BountyService) -> anyhow::Result<()> {
    for (name, id) in DEMO_USERS {
        if service.open_account(UserId::from_uuid(id)).await? {
            info!(user = name, "Opened demo wallet");
        } else {
            info!(user = name, "Demo wallet already exists, skipping");
        }
    }
    Ok(())
}

async fn seed_bounties(service: &BountyService, users: &[UserId]) -> anyhow::Result<()> {
    for (n, (issue_number, title, amount)) in DEMO_BOUNTIES.into_iter().enumerate() {
        let repo = DEMO_REPOS[n % DEMO_REPOS.len()];
        let creator = users[n % users.len()];

        if service
            .find_open_bounty_for_issue(repo, issue_number)
            .await?
            .is_some()
        {
            info!(repo, issue_number, "Bounty already exists, skipping");
            continue;
        }

        let issue = IssueRef::new(
            repo,
            issue_number,
            title,
            format!("https://github.com/{repo}/issues/{issue_number}"),
        );
        match service.create_bounty(creator, issue, amount).await {
            Ok(bounty) => info!(bounty_id = %bounty.id, repo, title, amount, "Created bounty"),
            Err(BountyError::InsufficientFunds { balance, .. }) => {
                warn!(creator = %creator, balance, amount, "Insufficient balance, skipping");
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

async fn seed_submissions(service: &BountyService, users: &[UserId]) -> anyhow::Result<()> {
    let bounties = service.list_open_bounties().await?;
    for (n, bounty) in bounties.iter().enumerate() {
        let mut solver = users[n % users.len()];
        if solver == bounty.creator_id {
            solver = users[(n + 1) % users.len()];
        }

        let pr_url = format!(
            "https://github.com/{}/pull/{}",
            bounty.issue.repo,
            bounty.issue.issue_number + 100
        );
        match service
            .submit_solution(bounty.id, solver, &pr_url, Some(DEMO_COMMENT.to_string()))
            .await
        {
            Ok(submission) => {
                info!(bounty_id = %bounty.id, submission_id = %submission.id, "Created submission");
            }
            Err(BountyError::Conflict(_)) => {
                info!(bounty_id = %bounty.id, "Submission already exists, skipping");
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}
