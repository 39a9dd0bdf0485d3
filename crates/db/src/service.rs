//! Bounty service: the only entry point that mutates marketplace state.
//!
//! Every mutating call runs in one database transaction spanning the bounty
//! or submission row and any ledger entries it writes. Domain events are
//! published only after that transaction commits. Nothing here retries a
//! mutation; a lost race surfaces as `InvalidState`.

use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use gitmarket_core::bounty::{
    Bounty, BountyDetail, BountyError, BountyLifecycle, BountyStatus, BountyTransition, IssueRef,
    MarketRules, Submission, SubmissionStatus,
};
use gitmarket_core::events::{DomainEvent, EventPublisher};
use gitmarket_core::ledger::{
    Account, BalanceReconciliation, EntryKind, LedgerEntry, LedgerPosting,
};
use gitmarket_shared::types::{BountyId, SubmissionId, UserId};
use gitmarket_shared::MarketConfig;

use crate::repositories::{BountyRepository, LedgerRepository, NewSubmission};

/// Orchestrates bounties, submissions and the wallet ledger.
#[derive(Debug, Clone)]
pub struct BountyService {
    db: DatabaseConnection,
    rules: MarketRules,
    events: EventPublisher,
    ledger: LedgerRepository,
    bounties: BountyRepository,
}

impl BountyService {
    /// Creates a service with the given rules and event channel.
    #[must_use]
    pub fn new(db: DatabaseConnection, rules: MarketRules, events: EventPublisher) -> Self {
        Self {
            ledger: LedgerRepository::new(db.clone()),
            bounties: BountyRepository::new(db.clone()),
            db,
            rules,
            events,
        }
    }

    /// Creates a service from the `market` configuration section.
    #[must_use]
    pub fn from_config(db: DatabaseConnection, config: &MarketConfig) -> Self {
        Self::new(
            db,
            MarketRules::from(config),
            EventPublisher::new(config.event_capacity),
        )
    }

    /// Rules this service enforces.
    #[must_use]
    pub fn rules(&self) -> &MarketRules {
        &self.rules
    }

    /// Subscribes to domain events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.events.subscribe()
    }

    // ========== Mutations ==========

    /// Opens a wallet for `user_id`, crediting the signup bonus once.
    ///
    /// Returns `true` if the account was created by this call. Opening an
    /// existing account is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the store fails.
    pub async fn open_account(&self, user_id: UserId) -> Result<bool, BountyError> {
        let txn = self.begin().await?;
        let opened = match self.ensure_account(&txn, user_id).await {
            Ok(opened) => opened,
            Err(err) => return Err(Self::abort(txn, "open_account", err).await),
        };
        Self::commit(txn).await?;

        if opened {
            info!(account_id = %user_id, bonus = self.rules.signup_bonus, "Account opened");
            self.publish_account_opened(user_id);
        }
        Ok(opened)
    }

    /// Places a bounty on an issue and escrows `amount` from the creator.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is below the minimum
    /// - `InvalidInput` if the issue reference is malformed
    /// - `InsufficientFunds` if the creator cannot cover `amount`
    pub async fn create_bounty(
        &self,
        creator_id: UserId,
        issue: IssueRef,
        amount: i64,
    ) -> Result<Bounty, BountyError> {
        if let Err(err) = self
            .rules
            .validate_amount(amount)
            .and_then(|()| self.rules.validate_issue(&issue))
        {
            warn!(creator_id = %creator_id, amount, error = %err, "Bounty rejected");
            return Err(err);
        }

        let txn = self.begin().await?;
        let (bounty, opened) = match self.create_in(&txn, creator_id, &issue, amount).await {
            Ok(created) => created,
            Err(err) => return Err(Self::abort(txn, "create_bounty", err).await),
        };
        Self::commit(txn).await?;

        info!(
            bounty_id = %bounty.id,
            creator_id = %creator_id,
            repo = %bounty.issue.repo,
            issue_number = bounty.issue.issue_number,
            amount,
            "Bounty created"
        );
        if opened {
            self.publish_account_opened(creator_id);
        }
        self.events.publish(DomainEvent::BountyCreated {
            bounty_id: bounty.id,
            creator_id,
            amount,
        });
        Ok(bounty)
    }

    /// Cancels an open bounty and refunds its creator.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the bounty does not exist
    /// - `Forbidden` if `actor_id` is not the creator
    /// - `InvalidState` if the bounty is not open
    pub async fn cancel_bounty(
        &self,
        bounty_id: BountyId,
        actor_id: UserId,
    ) -> Result<Bounty, BountyError> {
        let txn = self.begin().await?;
        let bounty = match Self::cancel_in(&txn, bounty_id, actor_id).await {
            Ok(bounty) => bounty,
            Err(err) => return Err(Self::abort(txn, "cancel_bounty", err).await),
        };
        Self::commit(txn).await?;

        info!(bounty_id = %bounty_id, amount = bounty.amount, "Bounty cancelled");
        self.events.publish(DomainEvent::BountyCancelled {
            bounty_id,
            creator_id: bounty.creator_id,
            amount: bounty.amount,
        });
        Ok(bounty)
    }

    /// Records a solver's pull request against an open bounty.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the bounty does not exist
    /// - `InvalidState` if the bounty is not open
    /// - `Forbidden` if the solver created the bounty
    /// - `InvalidInput` if `pr_url` is not a pull request on the code host
    /// - `Conflict` if the solver already has a pending submission on it
    pub async fn submit_solution(
        &self,
        bounty_id: BountyId,
        solver_id: UserId,
        pr_url: &str,
        comment: Option<String>,
    ) -> Result<Submission, BountyError> {
        let txn = self.begin().await?;
        let (submission, opened) =
            match self.submit_in(&txn, bounty_id, solver_id, pr_url, comment).await {
                Ok(submitted) => submitted,
                Err(err) => return Err(Self::abort(txn, "submit_solution", err).await),
            };
        Self::commit(txn).await?;

        info!(
            bounty_id = %bounty_id,
            submission_id = %submission.id,
            solver_id = %solver_id,
            "Solution submitted"
        );
        if opened {
            self.publish_account_opened(solver_id);
        }
        self.events.publish(DomainEvent::SubmissionCreated {
            bounty_id,
            submission_id: submission.id,
            solver_id,
        });
        Ok(submission)
    }

    /// Approves a pending submission, pays its solver and closes the bounty.
    ///
    /// At most one approval per bounty can ever commit: the bounty row is
    /// moved from `open` to `paid` with a compare-and-set, and a caller that
    /// loses that race gets `InvalidState` with nothing written.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the bounty or submission does not exist
    /// - `Forbidden` if `actor_id` is not the creator
    /// - `InvalidState` if the bounty is not open or the submission is not
    ///   pending on this bounty
    pub async fn approve_submission(
        &self,
        bounty_id: BountyId,
        submission_id: SubmissionId,
        actor_id: UserId,
    ) -> Result<(Bounty, Submission), BountyError> {
        let txn = self.begin().await?;
        let (bounty, submission, opened) =
            match self.approve_in(&txn, bounty_id, submission_id, actor_id).await {
                Ok(approved) => approved,
                Err(err) => return Err(Self::abort(txn, "approve_submission", err).await),
            };
        Self::commit(txn).await?;

        info!(
            bounty_id = %bounty_id,
            submission_id = %submission_id,
            solver_id = %submission.solver_id,
            amount = bounty.amount,
            "Submission approved and paid"
        );
        if opened {
            self.publish_account_opened(submission.solver_id);
        }
        self.events.publish(DomainEvent::SubmissionApproved {
            bounty_id,
            submission_id,
            solver_id: submission.solver_id,
            amount: bounty.amount,
        });
        Ok((bounty, submission))
    }

    /// Rejects a pending submission. The bounty and ledger are left untouched.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the bounty or submission does not exist
    /// - `Forbidden` if `actor_id` is not the creator
    /// - `InvalidState` if the submission is not pending on this bounty
    pub async fn reject_submission(
        &self,
        bounty_id: BountyId,
        submission_id: SubmissionId,
        actor_id: UserId,
    ) -> Result<Submission, BountyError> {
        let txn = self.begin().await?;
        let submission = match Self::reject_in(&txn, bounty_id, submission_id, actor_id).await {
            Ok(submission) => submission,
            Err(err) => return Err(Self::abort(txn, "reject_submission", err).await),
        };
        Self::commit(txn).await?;

        info!(bounty_id = %bounty_id, submission_id = %submission_id, "Submission rejected");
        self.events.publish(DomainEvent::SubmissionRejected {
            bounty_id,
            submission_id,
            solver_id: submission.solver_id,
        });
        Ok(submission)
    }

    // ========== Reads ==========

    /// Current balance; 0 for a user who never opened an account.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the store fails.
    pub async fn get_balance(&self, account_id: UserId) -> Result<i64, BountyError> {
        Ok(self.ledger.balance_of(account_id).await?)
    }

    /// Ledger history for an account, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the store fails.
    pub async fn list_transactions(&self, account_id: UserId) -> Result<Vec<LedgerEntry>, BountyError> {
        let entries = self.ledger.entries(account_id).await?;
        debug!(account_id = %account_id, count = entries.len(), "Listed transactions");
        Ok(entries)
    }

    /// Fetches an account.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account was never opened.
    pub async fn get_account(&self, account_id: UserId) -> Result<Account, BountyError> {
        self.ledger
            .find_account(account_id)
            .await?
            .ok_or_else(|| BountyError::not_found("account", account_id))
    }

    /// Fetches a bounty.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the bounty does not exist.
    pub async fn get_bounty(&self, bounty_id: BountyId) -> Result<Bounty, BountyError> {
        BountyRepository::find_bounty(&self.db, bounty_id)
            .await?
            .ok_or_else(|| BountyError::not_found("bounty", bounty_id))
    }

    /// Fetches a bounty with all of its submissions, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the bounty does not exist.
    pub async fn get_bounty_detail(&self, bounty_id: BountyId) -> Result<BountyDetail, BountyError> {
        self.bounties
            .find_detail(bounty_id)
            .await?
            .ok_or_else(|| BountyError::not_found("bounty", bounty_id))
    }

    /// Open bounties, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the store fails.
    pub async fn list_open_bounties(&self) -> Result<Vec<Bounty>, BountyError> {
        self.bounties.list_open().await
    }

    /// Bounties a user created, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the store fails.
    pub async fn list_bounties_by_creator(&self, creator_id: UserId) -> Result<Vec<Bounty>, BountyError> {
        self.bounties.list_by_creator(creator_id).await
    }

    /// Submissions a user made, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the store fails.
    pub async fn list_submissions_by_solver(
        &self,
        solver_id: UserId,
    ) -> Result<Vec<Submission>, BountyError> {
        self.bounties.list_submissions_by_solver(solver_id).await
    }

    /// The open bounty on `repo#issue_number`, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the store fails.
    pub async fn find_open_bounty_for_issue(
        &self,
        repo: &str,
        issue_number: i64,
    ) -> Result<Option<Bounty>, BountyError> {
        self.bounties.find_open_for_issue(repo, issue_number).await
    }

    /// Open bounties on `repo`, newest first. A repository page keys these
    /// by `issue.issue_number`.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the store fails.
    pub async fn list_open_bounties_for_repo(&self, repo: &str) -> Result<Vec<Bounty>, BountyError> {
        self.bounties.list_open_for_repo(repo).await
    }

    /// Compares an account's stored balance with the sum of its ledger.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the store fails.
    pub async fn reconcile_account(
        &self,
        account_id: UserId,
    ) -> Result<BalanceReconciliation, BountyError> {
        Ok(self.ledger.reconcile(account_id).await?)
    }

    // ========== Transaction bodies ==========

    async fn ensure_account(
        &self,
        txn: &DatabaseTransaction,
        user_id: UserId,
    ) -> Result<bool, BountyError> {
        Ok(LedgerRepository::open_account(txn, user_id, self.rules.signup_bonus).await?)
    }

    async fn create_in(
        &self,
        txn: &DatabaseTransaction,
        creator_id: UserId,
        issue: &IssueRef,
        amount: i64,
    ) -> Result<(Bounty, bool), BountyError> {
        let opened = self.ensure_account(txn, creator_id).await?;
        let bounty = BountyRepository::insert_bounty(txn, creator_id, issue, amount).await?;

        let escrow = LedgerPosting::debit(
            creator_id,
            amount,
            EntryKind::BountyPlaced,
            Some(bounty.id),
            format!("Bounty on {}#{}", issue.repo, issue.issue_number),
        )?;
        LedgerRepository::post(txn, &escrow).await?;

        Ok((bounty, opened))
    }

    async fn cancel_in(
        txn: &DatabaseTransaction,
        bounty_id: BountyId,
        actor_id: UserId,
    ) -> Result<Bounty, BountyError> {
        let mut bounty = Self::load_bounty(txn, bounty_id).await?;
        let transition = BountyLifecycle::cancel(&bounty, actor_id)?;
        Self::apply_bounty_transition(txn, &mut bounty, &transition).await?;
        Ok(bounty)
    }

    async fn submit_in(
        &self,
        txn: &DatabaseTransaction,
        bounty_id: BountyId,
        solver_id: UserId,
        pr_url: &str,
        comment: Option<String>,
    ) -> Result<(Submission, bool), BountyError> {
        let bounty = Self::load_bounty(txn, bounty_id).await?;
        self.submit_loaded(txn, &bounty, solver_id, pr_url, comment)
            .await
    }

    /// Submission against an already loaded bounty. The snapshot may be stale;
    /// the row lock decides.
    async fn submit_loaded(
        &self,
        txn: &DatabaseTransaction,
        bounty: &Bounty,
        solver_id: UserId,
        pr_url: &str,
        comment: Option<String>,
    ) -> Result<(Submission, bool), BountyError> {
        let bounty_id = bounty.id;
        BountyLifecycle::submit(bounty, solver_id)?;
        self.rules.validate_pr_url(pr_url)?;

        // Serializes concurrent submitters on this bounty for the duplicate check.
        if !BountyRepository::lock_open_bounty(txn, bounty_id).await? {
            return Err(BountyError::InvalidState(format!(
                "bounty {bounty_id} is no longer open"
            )));
        }
        if BountyRepository::has_pending_submission(txn, bounty_id, solver_id).await? {
            return Err(BountyError::Conflict(format!(
                "solver {solver_id} already has a pending submission on bounty {bounty_id}"
            )));
        }

        let opened = self.ensure_account(txn, solver_id).await?;
        let comment = comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let submission = BountyRepository::insert_submission(
            txn,
            NewSubmission {
                bounty_id,
                solver_id,
                pr_url: pr_url.trim().to_string(),
                comment,
            },
        )
        .await?;

        Ok((submission, opened))
    }

    async fn approve_in(
        &self,
        txn: &DatabaseTransaction,
        bounty_id: BountyId,
        submission_id: SubmissionId,
        actor_id: UserId,
    ) -> Result<(Bounty, Submission, bool), BountyError> {
        let bounty = Self::load_bounty(txn, bounty_id).await?;
        let submission = Self::load_submission(txn, submission_id).await?;
        self.approve_loaded(txn, bounty, submission, actor_id).await
    }

    /// Approval against already loaded rows. The snapshots may be stale;
    /// the compare-and-set updates decide.
    async fn approve_loaded(
        &self,
        txn: &DatabaseTransaction,
        mut bounty: Bounty,
        mut submission: Submission,
        actor_id: UserId,
    ) -> Result<(Bounty, Submission, bool), BountyError> {
        let transition = BountyLifecycle::approve(&bounty, &submission, actor_id)?;

        // The bounty CAS is the double-payout guard and must come first.
        Self::move_bounty(txn, &mut bounty, &transition).await?;
        Self::move_submission(txn, &mut submission, &transition).await?;

        let opened = self.ensure_account(txn, submission.solver_id).await?;
        if let Some(payout) = transition.posting()? {
            LedgerRepository::post(txn, &payout).await?;
        }

        Ok((bounty, submission, opened))
    }

    async fn reject_in(
        txn: &DatabaseTransaction,
        bounty_id: BountyId,
        submission_id: SubmissionId,
        actor_id: UserId,
    ) -> Result<Submission, BountyError> {
        let bounty = Self::load_bounty(txn, bounty_id).await?;
        let mut submission = Self::load_submission(txn, submission_id).await?;
        let transition = BountyLifecycle::reject(&bounty, &submission, actor_id)?;
        Self::move_submission(txn, &mut submission, &transition).await?;
        Ok(submission)
    }

    // ========== Helpers ==========

    async fn load_bounty(
        txn: &DatabaseTransaction,
        bounty_id: BountyId,
    ) -> Result<Bounty, BountyError> {
        BountyRepository::find_bounty(txn, bounty_id)
            .await?
            .ok_or_else(|| BountyError::not_found("bounty", bounty_id))
    }

    async fn load_submission(
        txn: &DatabaseTransaction,
        submission_id: SubmissionId,
    ) -> Result<Submission, BountyError> {
        BountyRepository::find_submission(txn, submission_id)
            .await?
            .ok_or_else(|| BountyError::not_found("submission", submission_id))
    }

    /// Applies the bounty status change and its ledger credit.
    async fn apply_bounty_transition(
        txn: &DatabaseTransaction,
        bounty: &mut Bounty,
        transition: &BountyTransition,
    ) -> Result<(), BountyError> {
        Self::move_bounty(txn, bounty, transition).await?;
        if let Some(posting) = transition.posting()? {
            LedgerRepository::post(txn, &posting).await?;
        }
        Ok(())
    }

    async fn move_bounty(
        txn: &DatabaseTransaction,
        bounty: &mut Bounty,
        transition: &BountyTransition,
    ) -> Result<(), BountyError> {
        let Some(to) = transition.new_bounty_status() else {
            return Ok(());
        };
        if !BountyRepository::transition_bounty(txn, bounty.id, BountyStatus::Open, to).await? {
            return Err(BountyError::InvalidState(format!(
                "bounty {} is no longer open",
                bounty.id
            )));
        }
        bounty.status = to;
        bounty.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn move_submission(
        txn: &DatabaseTransaction,
        submission: &mut Submission,
        transition: &BountyTransition,
    ) -> Result<(), BountyError> {
        let Some(to) = transition.new_submission_status() else {
            return Ok(());
        };
        let moved = BountyRepository::transition_submission(
            txn,
            submission.bounty_id,
            submission.id,
            SubmissionStatus::Pending,
            to,
        )
        .await?;
        if !moved {
            return Err(BountyError::InvalidState(format!(
                "submission {} is no longer pending",
                submission.id
            )));
        }
        submission.status = to;
        submission.updated_at = chrono::Utc::now();
        Ok(())
    }

    fn publish_account_opened(&self, account_id: UserId) {
        self.events.publish(DomainEvent::AccountOpened {
            account_id,
            bonus: self.rules.signup_bonus.max(0),
        });
    }

    async fn begin(&self) -> Result<DatabaseTransaction, BountyError> {
        self.db.begin().await.map_err(db_err)
    }

    async fn commit(txn: DatabaseTransaction) -> Result<(), BountyError> {
        txn.commit().await.map_err(db_err)
    }

    /// Rolls back and logs why. Returns the original error.
    async fn abort(txn: DatabaseTransaction, operation: &'static str, err: BountyError) -> BountyError {
        if let Err(rollback) = txn.rollback().await {
            warn!(operation, error = %rollback, "Rollback failed");
        }
        match &err {
            BountyError::Database(_) => warn!(operation, error = %err, "Operation failed"),
            _ => warn!(operation, code = err.error_code(), error = %err, "Operation rejected"),
        }
        err
    }
}

#[allow(clippy::needless_pass_by_value)]
fn db_err(e: DbErr) -> BountyError {
    BountyError::Database(e.to_string())
}
