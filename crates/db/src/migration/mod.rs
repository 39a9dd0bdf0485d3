//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration. They use the schema
//! builder only, so the same set runs on Postgres and SQLite.

pub use sea_orm_migration::prelude::*;

mod m20261014_000001_wallet;
mod m20261014_000002_bounties;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261014_000001_wallet::Migration),
            Box::new(m20261014_000002_bounties::Migration),
        ]
    }
}
