//! Ledger repository for wallet accounts and entries.
//!
//! Writes take a connection argument so they run inside the caller's
//! transaction; reads go through the repository's own pool.

use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use gitmarket_core::ledger::{
    Account, AccountBalance, BalanceReconciliation, EntryKind, LedgerEntry, LedgerError,
    LedgerPosting,
};
use gitmarket_shared::types::{LedgerEntryId, UserId};

use crate::entities::{accounts, ledger_entries, sea_orm_active_enums};

/// Ledger repository.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Opens an account if it does not exist yet.
    ///
    /// A newly inserted account is credited `signup_bonus` (when positive) in
    /// the same connection. Returns `true` only when the account was created
    /// by this call.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn open_account<C: ConnectionTrait>(
        conn: &C,
        account_id: UserId,
        signup_bonus: i64,
    ) -> Result<bool, LedgerError> {
        let now = Utc::now().into();
        let account = accounts::ActiveModel {
            id: Set(account_id.into_inner()),
            balance: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = accounts::Entity::insert(account)
            .on_conflict(
                OnConflict::column(accounts::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .map_err(db_err)?;

        if inserted == 0 {
            return Ok(false);
        }

        if signup_bonus > 0 {
            let bonus = LedgerPosting::credit(
                account_id,
                signup_bonus,
                EntryKind::SignupBonus,
                None,
                "Welcome bonus",
            )?;
            Self::post(conn, &bonus).await?;
        }

        Ok(true)
    }

    /// Appends a posting and moves the materialized balance with it.
    ///
    /// The balance update is conditional on the account still holding enough
    /// for a debit, so two debits racing on one account cannot overdraw it.
    ///
    /// # Errors
    ///
    /// - `InsufficientFunds` if a debit exceeds the balance (an absent account
    ///   has balance 0)
    /// - `AccountNotFound` for a credit to an account that was never opened
    /// - `BalanceOverflow` if a credit would overflow
    pub async fn post<C: ConnectionTrait>(
        conn: &C,
        posting: &LedgerPosting,
    ) -> Result<LedgerEntry, LedgerError> {
        let account_id = posting.account_id();

        let current = match Self::stored_balance(conn, account_id).await? {
            Some(balance) => AccountBalance::new(account_id, balance),
            None if posting.is_debit() => {
                return Err(LedgerError::InsufficientFunds {
                    account_id,
                    balance: 0,
                    requested: posting.magnitude(),
                });
            }
            None => return Err(LedgerError::AccountNotFound(account_id)),
        };
        current.apply(posting)?;

        let now = Utc::now();
        let mut update = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).add(posting.amount()),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(account_id.into_inner()));
        if posting.is_debit() {
            update = update.filter(accounts::Column::Balance.gte(posting.magnitude()));
        }

        let result = update.exec(conn).await.map_err(db_err)?;
        if result.rows_affected == 0 {
            // The row moved between the read and the guarded update.
            let balance = Self::stored_balance(conn, account_id).await?.unwrap_or(0);
            return Err(LedgerError::InsufficientFunds {
                account_id,
                balance,
                requested: posting.magnitude(),
            });
        }

        let entry = ledger_entries::ActiveModel {
            id: Set(LedgerEntryId::new().into_inner()),
            account_id: Set(account_id.into_inner()),
            amount: Set(posting.amount()),
            kind: Set(kind_to_db(posting.kind())),
            bounty_id: Set(posting.related_bounty_id().map(Into::into)),
            description: Set(posting.description().to_string()),
            created_at: Set(now.into()),
        };
        let model = ledger_entries::Entity::insert(entry)
            .exec_with_returning(conn)
            .await
            .map_err(db_err)?;

        tracing::debug!(
            account_id = %account_id,
            amount = posting.amount(),
            kind = %posting.kind(),
            "Ledger entry appended"
        );

        Ok(entry_from_model(model))
    }

    /// Current materialized balance; 0 for an account that was never opened.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn balance_of(&self, account_id: UserId) -> Result<i64, LedgerError> {
        Ok(Self::stored_balance(&self.db, account_id)
            .await?
            .unwrap_or(0))
    }

    /// Fetches an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_account(&self, account_id: UserId) -> Result<Option<Account>, LedgerError> {
        let model = accounts::Entity::find_by_id(account_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(|m| Account {
            id: UserId::from_uuid(m.id),
            balance: m.balance,
            created_at: m.created_at.with_timezone(&Utc),
        }))
    }

    /// All entries for an account, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn entries(&self, account_id: UserId) -> Result<Vec<LedgerEntry>, LedgerError> {
        let models = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::AccountId.eq(account_id.into_inner()))
            .order_by_desc(ledger_entries::Column::CreatedAt)
            .order_by_desc(ledger_entries::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(entry_from_model).collect())
    }

    /// Sum of every entry written for an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the sum overflows.
    pub async fn ledger_sum(&self, account_id: UserId) -> Result<i64, LedgerError> {
        let amounts: Vec<i64> = ledger_entries::Entity::find()
            .select_only()
            .column(ledger_entries::Column::Amount)
            .filter(ledger_entries::Column::AccountId.eq(account_id.into_inner()))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;

        amounts
            .into_iter()
            .try_fold(0i64, i64::checked_add)
            .ok_or(LedgerError::BalanceOverflow(account_id))
    }

    /// Compares the materialized balance with the ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn reconcile(&self, account_id: UserId) -> Result<BalanceReconciliation, LedgerError> {
        let stored_balance = self.balance_of(account_id).await?;
        let ledger_sum = self.ledger_sum(account_id).await?;
        let reconciliation = BalanceReconciliation {
            account_id,
            stored_balance,
            ledger_sum,
        };
        if !reconciliation.is_consistent() {
            tracing::error!(
                account_id = %account_id,
                stored_balance,
                ledger_sum,
                "Balance drifted from ledger"
            );
        }
        Ok(reconciliation)
    }

    async fn stored_balance<C: ConnectionTrait>(
        conn: &C,
        account_id: UserId,
    ) -> Result<Option<i64>, LedgerError> {
        let model = accounts::Entity::find_by_id(account_id.into_inner())
            .one(conn)
            .await
            .map_err(db_err)?;
        Ok(model.map(|m| m.balance))
    }
}

#[allow(clippy::needless_pass_by_value)]
fn db_err(e: DbErr) -> LedgerError {
    LedgerError::Database(e.to_string())
}

/// Converts core EntryKind to the stored enum.
fn kind_to_db(kind: EntryKind) -> sea_orm_active_enums::EntryKind {
    match kind {
        EntryKind::SignupBonus => sea_orm_active_enums::EntryKind::SignupBonus,
        EntryKind::BountyPlaced => sea_orm_active_enums::EntryKind::BountyPlaced,
        EntryKind::BountyEarned => sea_orm_active_enums::EntryKind::BountyEarned,
        EntryKind::BountyCancelled => sea_orm_active_enums::EntryKind::BountyCancelled,
        EntryKind::BountyRefund => sea_orm_active_enums::EntryKind::BountyRefund,
    }
}

/// Converts the stored enum to core EntryKind.
fn kind_to_core(kind: sea_orm_active_enums::EntryKind) -> EntryKind {
    match kind {
        sea_orm_active_enums::EntryKind::SignupBonus => EntryKind::SignupBonus,
        sea_orm_active_enums::EntryKind::BountyPlaced => EntryKind::BountyPlaced,
        sea_orm_active_enums::EntryKind::BountyEarned => EntryKind::BountyEarned,
        sea_orm_active_enums::EntryKind::BountyCancelled => EntryKind::BountyCancelled,
        sea_orm_active_enums::EntryKind::BountyRefund => EntryKind::BountyRefund,
    }
}

fn entry_from_model(model: ledger_entries::Model) -> LedgerEntry {
    LedgerEntry {
        id: LedgerEntryId::from_uuid(model.id),
        account_id: UserId::from_uuid(model.account_id),
        amount: model.amount,
        kind: kind_to_core(model.kind),
        related_bounty_id: model.bounty_id.map(Into::into),
        description: model.description,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
