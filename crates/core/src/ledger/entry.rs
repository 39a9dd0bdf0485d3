//! Ledger entry domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use gitmarket_shared::types::{BountyId, LedgerEntryId, UserId};

use crate::ledger::error::LedgerError;

/// Reason code attached to every ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Welcome credit written when an account is opened.
    SignupBonus,
    /// Escrow debit taken from the creator when a bounty is placed.
    BountyPlaced,
    /// Payout credited to the solver of an approved submission.
    BountyEarned,
    /// Legacy refund reason. Readable, never written.
    BountyCancelled,
    /// Escrow returned to the creator when a bounty is cancelled.
    BountyRefund,
}

impl EntryKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SignupBonus => "signup_bonus",
            Self::BountyPlaced => "bounty_placed",
            Self::BountyEarned => "bounty_earned",
            Self::BountyCancelled => "bounty_cancelled",
            Self::BountyRefund => "bounty_refund",
        }
    }

    /// Parses a kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "signup_bonus" => Some(Self::SignupBonus),
            "bounty_placed" => Some(Self::BountyPlaced),
            "bounty_earned" => Some(Self::BountyEarned),
            "bounty_cancelled" => Some(Self::BountyCancelled),
            "bounty_refund" => Some(Self::BountyRefund),
            _ => None,
        }
    }

    /// Returns true if entries of this kind add to the balance.
    #[must_use]
    pub fn is_credit(&self) -> bool {
        !matches!(self, Self::BountyPlaced)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable, signed record of one balance change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier for this entry.
    pub id: LedgerEntryId,
    /// The account affected by this entry.
    pub account_id: UserId,
    /// Signed amount: positive credits, negative debits.
    pub amount: i64,
    /// Reason code.
    pub kind: EntryKind,
    /// Bounty this entry belongs to, if any.
    pub related_bounty_id: Option<BountyId>,
    /// Human readable description.
    pub description: String,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

/// Validated input for a single ledger append.
///
/// Constructed only through [`LedgerPosting::credit`] or
/// [`LedgerPosting::debit`], so `amount` is never zero and its sign always
/// matches the direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerPosting {
    account_id: UserId,
    amount: i64,
    kind: EntryKind,
    related_bounty_id: Option<BountyId>,
    description: String,
}

impl LedgerPosting {
    /// Builds a credit of `amount` (must be positive).
    pub fn credit(
        account_id: UserId,
        amount: i64,
        kind: EntryKind,
        related_bounty_id: Option<BountyId>,
        description: impl Into<String>,
    ) -> Result<Self, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::NonPositiveAmount(amount));
        }
        Ok(Self {
            account_id,
            amount,
            kind,
            related_bounty_id,
            description: description.into(),
        })
    }

    /// Builds a debit of `amount` (must be positive; stored negated).
    pub fn debit(
        account_id: UserId,
        amount: i64,
        kind: EntryKind,
        related_bounty_id: Option<BountyId>,
        description: impl Into<String>,
    ) -> Result<Self, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::NonPositiveAmount(amount));
        }
        Ok(Self {
            account_id,
            amount: -amount,
            kind,
            related_bounty_id,
            description: description.into(),
        })
    }

    /// The account this posting affects.
    #[must_use]
    pub fn account_id(&self) -> UserId {
        self.account_id
    }

    /// Signed amount as it will be stored.
    #[must_use]
    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// Magnitude of the posting.
    #[must_use]
    pub fn magnitude(&self) -> i64 {
        self.amount.abs()
    }

    /// Returns true for debits.
    #[must_use]
    pub fn is_debit(&self) -> bool {
        self.amount < 0
    }

    /// Reason code.
    #[must_use]
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Related bounty, if any.
    #[must_use]
    pub fn related_bounty_id(&self) -> Option<BountyId> {
        self.related_bounty_id
    }

    /// Description written with the entry.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in [
            EntryKind::SignupBonus,
            EntryKind::BountyPlaced,
            EntryKind::BountyEarned,
            EntryKind::BountyCancelled,
            EntryKind::BountyRefund,
        ] {
            assert_eq!(EntryKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EntryKind::parse("deposit"), None);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&EntryKind::BountyRefund).unwrap();
        assert_eq!(json, "\"bounty_refund\"");
    }

    #[test]
    fn test_debit_is_stored_negative() {
        let posting =
            LedgerPosting::debit(UserId::new(), 50, EntryKind::BountyPlaced, None, "escrow").unwrap();
        assert_eq!(posting.amount(), -50);
        assert_eq!(posting.magnitude(), 50);
        assert!(posting.is_debit());
    }

    #[test]
    fn test_credit_is_stored_positive() {
        let bounty = BountyId::new();
        let posting =
            LedgerPosting::credit(UserId::new(), 50, EntryKind::BountyEarned, Some(bounty), "payout")
                .unwrap();
        assert_eq!(posting.amount(), 50);
        assert!(!posting.is_debit());
        assert_eq!(posting.related_bounty_id(), Some(bounty));
        assert_eq!(posting.description(), "payout");
    }

    #[test]
    fn test_zero_and_negative_amounts_rejected() {
        let user = UserId::new();
        assert!(matches!(
            LedgerPosting::credit(user, 0, EntryKind::SignupBonus, None, ""),
            Err(LedgerError::NonPositiveAmount(0))
        ));
        assert!(matches!(
            LedgerPosting::debit(user, -5, EntryKind::BountyPlaced, None, ""),
            Err(LedgerError::NonPositiveAmount(-5))
        ));
    }
}
