//! Bounty error types.
//!
//! One taxonomy covers every failure a caller of the marketplace can see.
//! Ledger failures are folded in through `From<LedgerError>`.

use thiserror::Error;
use uuid::Uuid;

use gitmarket_shared::types::UserId;

use crate::ledger::LedgerError;

/// Errors that can occur during bounty and submission operations.
#[derive(Debug, Error)]
pub enum BountyError {
    /// Amount below the marketplace minimum, or not positive.
    #[error("Invalid amount {amount}: bounties must be at least {minimum}")]
    InvalidAmount {
        /// The rejected amount.
        amount: i64,
        /// Smallest accepted amount.
        minimum: i64,
    },

    /// The account cannot cover the debit.
    #[error("Insufficient balance: account {account_id} has {balance}, needs {requested}")]
    InsufficientFunds {
        /// The account being debited.
        account_id: UserId,
        /// Balance at the time of the attempt.
        balance: i64,
        /// Amount requested.
        requested: i64,
    },

    /// The actor has no authority over the entity.
    #[error("User {actor_id} is not allowed to {action}")]
    Forbidden {
        /// The user who attempted the action.
        actor_id: UserId,
        /// What they tried to do.
        action: &'static str,
    },

    /// The operation is illegal for the entity's current status.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Malformed caller input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Duplicate active submission.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of entity ("bounty", "submission", "account").
        entity: &'static str,
        /// Identifier looked up.
        id: Uuid,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl BountyError {
    /// Shorthand for a missing entity.
    pub fn not_found(entity: &'static str, id: impl Into<Uuid>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount { .. } | Self::InsufficientFunds { .. } | Self::InvalidInput(_) => {
                400
            }
            Self::Forbidden { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::InvalidState(_) | Self::Conflict(_) => 409,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Conflict(_) => "CONFLICT",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns true if a read that failed this way may be re-issued.
    ///
    /// Mutations are never retried regardless of this value.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

impl From<LedgerError> for BountyError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NonPositiveAmount(amount) => Self::InvalidAmount { amount, minimum: 1 },
            LedgerError::InsufficientFunds {
                account_id,
                balance,
                requested,
            } => Self::InsufficientFunds {
                account_id,
                balance,
                requested,
            },
            LedgerError::AccountNotFound(id) => Self::not_found("account", id),
            LedgerError::BalanceOverflow(id) => {
                Self::InvalidState(format!("account {id} cannot hold a larger balance"))
            }
            LedgerError::Database(msg) => Self::Database(msg),
        }
    }
}
