//! Property-based tests for balance arithmetic.

use proptest::prelude::*;

use gitmarket_shared::types::UserId;

use crate::ledger::balance::AccountBalance;
use crate::ledger::entry::{EntryKind, LedgerPosting};
use crate::ledger::error::LedgerError;

/// A posting request: (is_debit, magnitude).
fn arb_request() -> impl Strategy<Value = (bool, i64)> {
    (any::<bool>(), 1i64..=10_000)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Applying any sequence of postings keeps the balance non-negative and
    /// equal to the sum of the postings that were accepted.
    #[test]
    fn prop_balance_equals_sum_of_accepted(requests in prop::collection::vec(arb_request(), 0..64)) {
        let account = UserId::new();
        let mut balance = AccountBalance::zero(account);
        let mut accepted_sum = 0i64;

        for (is_debit, magnitude) in requests {
            let posting = if is_debit {
                LedgerPosting::debit(account, magnitude, EntryKind::BountyPlaced, None, "")
            } else {
                LedgerPosting::credit(account, magnitude, EntryKind::BountyEarned, None, "")
            }
            .unwrap();

            match balance.apply(&posting) {
                Ok(next) => {
                    accepted_sum += posting.amount();
                    balance = next;
                }
                Err(LedgerError::InsufficientFunds { balance: seen, requested, .. }) => {
                    prop_assert!(is_debit);
                    prop_assert_eq!(seen, balance.balance);
                    prop_assert!(requested > seen);
                }
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }

            prop_assert!(balance.balance >= 0);
            prop_assert_eq!(balance.balance, accepted_sum);
        }
    }

    /// Non-positive amounts never produce a posting.
    #[test]
    fn prop_non_positive_amount_rejected(amount in i64::MIN..=0) {
        let account = UserId::new();
        prop_assert!(LedgerPosting::credit(account, amount, EntryKind::SignupBonus, None, "").is_err());
        prop_assert!(LedgerPosting::debit(account, amount, EntryKind::BountyPlaced, None, "").is_err());
    }
}
