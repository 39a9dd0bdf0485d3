//! Bounties and their submissions.

use sea_orm_migration::prelude::*;

use super::m20261014_000001_wallet::Accounts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bounties::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bounties::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Bounties::Repo).string_len(255).not_null())
                    .col(ColumnDef::new(Bounties::IssueNumber).big_integer().not_null())
                    .col(ColumnDef::new(Bounties::IssueTitle).text().not_null())
                    .col(ColumnDef::new(Bounties::IssueUrl).text().not_null())
                    .col(ColumnDef::new(Bounties::CreatorId).uuid().not_null())
                    .col(
                        ColumnDef::new(Bounties::Amount)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Bounties::Amount).gt(0)),
                    )
                    .col(
                        ColumnDef::new(Bounties::Status)
                            .string_len(16)
                            .not_null()
                            .default("open"),
                    )
                    .col(
                        ColumnDef::new(Bounties::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bounties::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bounties_creator")
                            .from(Bounties::Table, Bounties::CreatorId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bounties_status_created")
                    .table(Bounties::Table)
                    .col(Bounties::Status)
                    .col(Bounties::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bounties_issue")
                    .table(Bounties::Table)
                    .col(Bounties::Repo)
                    .col(Bounties::IssueNumber)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bounties_creator")
                    .table(Bounties::Table)
                    .col(Bounties::CreatorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Submissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Submissions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Submissions::BountyId).uuid().not_null())
                    .col(ColumnDef::new(Submissions::SolverId).uuid().not_null())
                    .col(ColumnDef::new(Submissions::PrUrl).text().not_null())
                    .col(ColumnDef::new(Submissions::Comment).text().null())
                    .col(
                        ColumnDef::new(Submissions::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Submissions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Submissions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_submissions_bounty")
                            .from(Submissions::Table, Submissions::BountyId)
                            .to(Bounties::Table, Bounties::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_submissions_solver")
                            .from(Submissions::Table, Submissions::SolverId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Not unique: the one-pending-per-solver rule is enforced by the service.
        manager
            .create_index(
                Index::create()
                    .name("idx_submissions_bounty_solver")
                    .table(Submissions::Table)
                    .col(Submissions::BountyId)
                    .col(Submissions::SolverId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Submissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bounties::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Bounties {
    Table,
    Id,
    Repo,
    IssueNumber,
    IssueTitle,
    IssueUrl,
    CreatorId,
    Amount,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Submissions {
    Table,
    Id,
    BountyId,
    SolverId,
    PrUrl,
    Comment,
    Status,
    CreatedAt,
    UpdatedAt,
}
