//! Ledger error types.
//!
//! Errors raised while validating or applying wallet postings.

use thiserror::Error;

use gitmarket_shared::types::UserId;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Posting amounts must be strictly positive before signing.
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(i64),

    /// A debit would take the balance below zero.
    #[error("Insufficient funds in account {account_id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// The account being debited.
        account_id: UserId,
        /// Balance at the time of the attempt.
        balance: i64,
        /// Magnitude of the attempted debit.
        requested: i64,
    },

    /// The account has never been opened.
    #[error("Account not found: {0}")]
    AccountNotFound(UserId),

    /// A credit would overflow the balance.
    #[error("Balance overflow in account {0}")]
    BalanceOverflow(UserId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NonPositiveAmount(_) | Self::InsufficientFunds { .. } => 400,
            Self::AccountNotFound(_) => 404,
            Self::BalanceOverflow(_) | Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::BalanceOverflow(_) => "BALANCE_OVERFLOW",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_error() {
        let err = LedgerError::InsufficientFunds {
            account_id: UserId::new(),
            balance: 10,
            requested: 50,
        };
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "INSUFFICIENT_FUNDS");
        assert!(err.to_string().contains("balance 10"));
        assert!(err.to_string().contains("requested 50"));
    }

    #[test]
    fn test_account_not_found_error() {
        let err = LedgerError::AccountNotFound(UserId::new());
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "ACCOUNT_NOT_FOUND");
    }

    #[test]
    fn test_database_error() {
        let err = LedgerError::Database("connection reset".to_string());
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("connection reset"));
    }
}
