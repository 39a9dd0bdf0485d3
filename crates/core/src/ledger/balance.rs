//! Wallet balances.
//!
//! The stored balance is a cache of the ledger: it must always equal the sum
//! of the account's entries and must never go negative.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gitmarket_shared::types::UserId;

use crate::ledger::entry::LedgerPosting;
use crate::ledger::error::LedgerError;

/// A user's wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Owner of the wallet; also the account id.
    pub id: UserId,
    /// Current balance in minor units.
    pub balance: i64,
    /// When the account was opened.
    pub created_at: DateTime<Utc>,
}

/// Balance of a single account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account ID.
    pub account_id: UserId,
    /// Current balance.
    pub balance: i64,
}

impl AccountBalance {
    /// Creates a balance snapshot.
    #[must_use]
    pub const fn new(account_id: UserId, balance: i64) -> Self {
        Self {
            account_id,
            balance,
        }
    }

    /// Starting balance of a freshly opened account.
    #[must_use]
    pub const fn zero(account_id: UserId) -> Self {
        Self::new(account_id, 0)
    }

    /// Applies a posting and returns the resulting balance.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientFunds` if a debit would go below zero and
    /// `BalanceOverflow` if a credit would overflow.
    pub fn apply(&self, posting: &LedgerPosting) -> Result<Self, LedgerError> {
        if posting.is_debit() && self.balance < posting.magnitude() {
            return Err(LedgerError::InsufficientFunds {
                account_id: self.account_id,
                balance: self.balance,
                requested: posting.magnitude(),
            });
        }
        let balance = self
            .balance
            .checked_add(posting.amount())
            .ok_or(LedgerError::BalanceOverflow(self.account_id))?;
        Ok(Self::new(self.account_id, balance))
    }
}

/// Stored balance compared against the ledger sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceReconciliation {
    /// The account checked.
    pub account_id: UserId,
    /// Balance column value.
    pub stored_balance: i64,
    /// Sum of all ledger entries for the account.
    pub ledger_sum: i64,
}

impl BalanceReconciliation {
    /// Returns true when the stored balance matches the ledger.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.stored_balance == self.ledger_sum && self.stored_balance >= 0
    }

    /// Stored balance minus ledger sum, saturating at the `i64` bounds.
    #[must_use]
    pub fn drift(&self) -> i64 {
        self.stored_balance.saturating_sub(self.ledger_sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::entry::EntryKind;

    fn posting_credit(account: UserId, amount: i64) -> LedgerPosting {
        LedgerPosting::credit(account, amount, EntryKind::SignupBonus, None, "").unwrap()
    }

    fn posting_debit(account: UserId, amount: i64) -> LedgerPosting {
        LedgerPosting::debit(account, amount, EntryKind::BountyPlaced, None, "").unwrap()
    }

    #[test]
    fn test_credit_then_debit() {
        let account = UserId::new();
        let balance = AccountBalance::zero(account)
            .apply(&posting_credit(account, 100))
            .unwrap()
            .apply(&posting_debit(account, 60))
            .unwrap();
        assert_eq!(balance.balance, 40);
    }

    #[test]
    fn test_debit_to_exactly_zero_allowed() {
        let account = UserId::new();
        let balance = AccountBalance::new(account, 50)
            .apply(&posting_debit(account, 50))
            .unwrap();
        assert_eq!(balance.balance, 0);
    }

    #[test]
    fn test_overdraft_rejected() {
        let account = UserId::new();
        let err = AccountBalance::new(account, 10)
            .apply(&posting_debit(account, 11))
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientFunds {
                balance: 10,
                requested: 11,
                ..
            }
        ));
    }

    #[test]
    fn test_credit_overflow_rejected() {
        let account = UserId::new();
        let err = AccountBalance::new(account, i64::MAX)
            .apply(&posting_credit(account, 1))
            .unwrap_err();
        assert!(matches!(err, LedgerError::BalanceOverflow(_)));
    }

    #[test]
    fn test_reconciliation_drift() {
        let rec = BalanceReconciliation {
            account_id: UserId::new(),
            stored_balance: 120,
            ledger_sum: 100,
        };
        assert!(!rec.is_consistent());
        assert_eq!(rec.drift(), 20);
    }

    #[test]
    fn test_reconciliation_drift_saturates() {
        let rec = BalanceReconciliation {
            account_id: UserId::new(),
            stored_balance: i64::MAX,
            ledger_sum: -5,
        };
        assert_eq!(rec.drift(), i64::MAX);

        let rec = BalanceReconciliation {
            account_id: UserId::new(),
            stored_balance: -5,
            ledger_sum: i64::MAX,
        };
        assert_eq!(rec.drift(), i64::MIN);
    }
}
