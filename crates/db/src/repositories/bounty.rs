//! Bounty repository for bounties and submissions.
//!
//! Status changes go through `transition_*`, which are compare-and-set
//! updates: they only touch the row while it is still in the expected status
//! and report whether they did.

use chrono::Utc;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use gitmarket_core::bounty::{
    Bounty, BountyDetail, BountyError, BountyStatus, IssueRef, Submission, SubmissionStatus,
};
use gitmarket_shared::types::{BountyId, SubmissionId, UserId};

use crate::entities::{bounties, sea_orm_active_enums, submissions};

/// Fields for a new submission row.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    /// Bounty claimed.
    pub bounty_id: BountyId,
    /// Submitting user.
    pub solver_id: UserId,
    /// Pull request with the fix.
    pub pr_url: String,
    /// Optional note for the reviewer.
    pub comment: Option<String>,
}

/// Bounty repository.
#[derive(Debug, Clone)]
pub struct BountyRepository {
    db: DatabaseConnection,
}

impl BountyRepository {
    /// Creates a new bounty repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ========== Writes (caller's connection) ==========

    /// Inserts an open bounty.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert_bounty<C: ConnectionTrait>(
        conn: &C,
        creator_id: UserId,
        issue: &IssueRef,
        amount: i64,
    ) -> Result<Bounty, BountyError> {
        let now = Utc::now().into();
        let model = bounties::ActiveModel {
            id: Set(BountyId::new().into_inner()),
            repo: Set(issue.repo.clone()),
            issue_number: Set(issue.issue_number),
            issue_title: Set(issue.issue_title.clone()),
            issue_url: Set(issue.issue_url.clone()),
            creator_id: Set(creator_id.into_inner()),
            amount: Set(amount),
            status: Set(sea_orm_active_enums::BountyStatus::Open),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = bounties::Entity::insert(model)
            .exec_with_returning(conn)
            .await
            .map_err(db_err)?;
        Ok(bounty_from_model(model))
    }

    /// Inserts a pending submission.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert_submission<C: ConnectionTrait>(
        conn: &C,
        input: NewSubmission,
    ) -> Result<Submission, BountyError> {
        let now = Utc::now().into();
        let model = submissions::ActiveModel {
            id: Set(SubmissionId::new().into_inner()),
            bounty_id: Set(input.bounty_id.into_inner()),
            solver_id: Set(input.solver_id.into_inner()),
            pr_url: Set(input.pr_url),
            comment: Set(input.comment),
            status: Set(sea_orm_active_enums::SubmissionStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = submissions::Entity::insert(model)
            .exec_with_returning(conn)
            .await
            .map_err(db_err)?;
        Ok(submission_from_model(model))
    }

    /// Moves a bounty from `from` to `to` if it is still in `from`.
    ///
    /// Returns `false` when another transaction got there first.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn transition_bounty<C: ConnectionTrait>(
        conn: &C,
        bounty_id: BountyId,
        from: BountyStatus,
        to: BountyStatus,
    ) -> Result<bool, BountyError> {
        let result = bounties::Entity::update_many()
            .col_expr(bounties::Column::Status, Expr::value(bounty_status_to_db(to)))
            .col_expr(bounties::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(bounties::Column::Id.eq(bounty_id.into_inner()))
            .filter(bounties::Column::Status.eq(bounty_status_to_db(from)))
            .exec(conn)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected == 1)
    }

    /// Takes the row lock on an open bounty without changing it.
    ///
    /// Concurrent writers on the same bounty queue behind this update until
    /// the holder commits. Returns `false` if the bounty is no longer open.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn lock_open_bounty<C: ConnectionTrait>(
        conn: &C,
        bounty_id: BountyId,
    ) -> Result<bool, BountyError> {
        let result = bounties::Entity::update_many()
            .col_expr(
                bounties::Column::Status,
                SimpleExpr::from(Expr::col(bounties::Column::Status)),
            )
            .filter(bounties::Column::Id.eq(bounty_id.into_inner()))
            .filter(bounties::Column::Status.eq(sea_orm_active_enums::BountyStatus::Open))
            .exec(conn)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected == 1)
    }

    /// Moves a submission of `bounty_id` from `from` to `to` if it is still in `from`.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn transition_submission<C: ConnectionTrait>(
        conn: &C,
        bounty_id: BountyId,
        submission_id: SubmissionId,
        from: SubmissionStatus,
        to: SubmissionStatus,
    ) -> Result<bool, BountyError> {
        let result = submissions::Entity::update_many()
            .col_expr(
                submissions::Column::Status,
                Expr::value(submission_status_to_db(to)),
            )
            .col_expr(submissions::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(submissions::Column::Id.eq(submission_id.into_inner()))
            .filter(submissions::Column::BountyId.eq(bounty_id.into_inner()))
            .filter(submissions::Column::Status.eq(submission_status_to_db(from)))
            .exec(conn)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected == 1)
    }

    // ========== Reads on any connection ==========

    /// Fetches a bounty.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_bounty<C: ConnectionTrait>(
        conn: &C,
        bounty_id: BountyId,
    ) -> Result<Option<Bounty>, BountyError> {
        let model = bounties::Entity::find_by_id(bounty_id.into_inner())
            .one(conn)
            .await
            .map_err(db_err)?;
        Ok(model.map(bounty_from_model))
    }

    /// Fetches a submission.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_submission<C: ConnectionTrait>(
        conn: &C,
        submission_id: SubmissionId,
    ) -> Result<Option<Submission>, BountyError> {
        let model = submissions::Entity::find_by_id(submission_id.into_inner())
            .one(conn)
            .await
            .map_err(db_err)?;
        Ok(model.map(submission_from_model))
    }

    /// Returns true if `solver_id` already has a pending submission on the bounty.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn has_pending_submission<C: ConnectionTrait>(
        conn: &C,
        bounty_id: BountyId,
        solver_id: UserId,
    ) -> Result<bool, BountyError> {
        let count = submissions::Entity::find()
            .filter(submissions::Column::BountyId.eq(bounty_id.into_inner()))
            .filter(submissions::Column::SolverId.eq(solver_id.into_inner()))
            .filter(submissions::Column::Status.eq(sea_orm_active_enums::SubmissionStatus::Pending))
            .count(conn)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }

    // ========== Reads on the pool ==========

    /// Fetches a bounty with its submissions, oldest submission first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_detail(&self, bounty_id: BountyId) -> Result<Option<BountyDetail>, BountyError> {
        let Some(bounty) = Self::find_bounty(&self.db, bounty_id).await? else {
            return Ok(None);
        };
        let submissions = submissions::Entity::find()
            .filter(submissions::Column::BountyId.eq(bounty_id.into_inner()))
            .order_by_asc(submissions::Column::CreatedAt)
            .order_by_asc(submissions::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(submission_from_model)
            .collect();
        Ok(Some(BountyDetail {
            bounty,
            submissions,
        }))
    }

    /// Lists open bounties, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_open(&self) -> Result<Vec<Bounty>, BountyError> {
        let models = bounties::Entity::find()
            .filter(bounties::Column::Status.eq(sea_orm_active_enums::BountyStatus::Open))
            .order_by_desc(bounties::Column::CreatedAt)
            .order_by_desc(bounties::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(bounty_from_model).collect())
    }

    /// Lists every bounty a user created, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_by_creator(&self, creator_id: UserId) -> Result<Vec<Bounty>, BountyError> {
        let models = bounties::Entity::find()
            .filter(bounties::Column::CreatorId.eq(creator_id.into_inner()))
            .order_by_desc(bounties::Column::CreatedAt)
            .order_by_desc(bounties::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(bounty_from_model).collect())
    }

    /// Lists every submission a user made, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_submissions_by_solver(
        &self,
        solver_id: UserId,
    ) -> Result<Vec<Submission>, BountyError> {
        let models = submissions::Entity::find()
            .filter(submissions::Column::SolverId.eq(solver_id.into_inner()))
            .order_by_desc(submissions::Column::CreatedAt)
            .order_by_desc(submissions::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(submission_from_model).collect())
    }

    /// Finds the open bounty placed on an issue, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_open_for_issue(
        &self,
        repo: &str,
        issue_number: i64,
    ) -> Result<Option<Bounty>, BountyError> {
        let model = bounties::Entity::find()
            .filter(bounties::Column::Repo.eq(repo))
            .filter(bounties::Column::IssueNumber.eq(issue_number))
            .filter(bounties::Column::Status.eq(sea_orm_active_enums::BountyStatus::Open))
            .order_by_desc(bounties::Column::CreatedAt)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(bounty_from_model))
    }

    /// Lists the open bounties on a repository, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_open_for_repo(&self, repo: &str) -> Result<Vec<Bounty>, BountyError> {
        let models = bounties::Entity::find()
            .filter(bounties::Column::Repo.eq(repo))
            .filter(bounties::Column::Status.eq(sea_orm_active_enums::BountyStatus::Open))
            .order_by_desc(bounties::Column::CreatedAt)
            .order_by_desc(bounties::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(bounty_from_model).collect())
    }
}

#[allow(clippy::needless_pass_by_value)]
fn db_err(e: DbErr) -> BountyError {
    BountyError::Database(e.to_string())
}

/// Converts core BountyStatus to the stored enum.
fn bounty_status_to_db(status: BountyStatus) -> sea_orm_active_enums::BountyStatus {
    match status {
        BountyStatus::Open => sea_orm_active_enums::BountyStatus::Open,
        BountyStatus::Claimed => sea_orm_active_enums::BountyStatus::Claimed,
        BountyStatus::Paid => sea_orm_active_enums::BountyStatus::Paid,
        BountyStatus::Cancelled => sea_orm_active_enums::BountyStatus::Cancelled,
    }
}

/// Converts the stored enum to core BountyStatus.
fn bounty_status_to_core(status: sea_orm_active_enums::BountyStatus) -> BountyStatus {
    match status {
        sea_orm_active_enums::BountyStatus::Open => BountyStatus::Open,
        sea_orm_active_enums::BountyStatus::Claimed => BountyStatus::Claimed,
        sea_orm_active_enums::BountyStatus::Paid => BountyStatus::Paid,
        sea_orm_active_enums::BountyStatus::Cancelled => BountyStatus::Cancelled,
    }
}

fn submission_status_to_db(status: SubmissionStatus) -> sea_orm_active_enums::SubmissionStatus {
    match status {
        SubmissionStatus::Pending => sea_orm_active_enums::SubmissionStatus::Pending,
        SubmissionStatus::Approved => sea_orm_active_enums::SubmissionStatus::Approved,
        SubmissionStatus::Rejected => sea_orm_active_enums::SubmissionStatus::Rejected,
    }
}

fn submission_status_to_core(status: sea_orm_active_enums::SubmissionStatus) -> SubmissionStatus {
    match status {
        sea_orm_active_enums::SubmissionStatus::Pending => SubmissionStatus::Pending,
        sea_orm_active_enums::SubmissionStatus::Approved => SubmissionStatus::Approved,
        sea_orm_active_enums::SubmissionStatus::Rejected => SubmissionStatus::Rejected,
    }
}

fn bounty_from_model(model: bounties::Model) -> Bounty {
    Bounty {
        id: BountyId::from_uuid(model.id),
        issue: IssueRef {
            repo: model.repo,
            issue_number: model.issue_number,
            issue_title: model.issue_title,
            issue_url: model.issue_url,
        },
        creator_id: UserId::from_uuid(model.creator_id),
        amount: model.amount,
        status: bounty_status_to_core(model.status),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn submission_from_model(model: submissions::Model) -> Submission {
    Submission {
        id: SubmissionId::from_uuid(model.id),
        bounty_id: BountyId::from_uuid(model.bounty_id),
        solver_id: UserId::from_uuid(model.solver_id),
        pr_url: model.pr_url,
        comment: model.comment,
        status: submission_status_to_core(model.status),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
