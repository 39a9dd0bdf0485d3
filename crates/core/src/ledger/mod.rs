//! Wallet ledger logic.
//!
//! Every balance change is an immutable, signed [`LedgerEntry`]. This module
//! holds the pure rules: building validated postings and applying them to a
//! balance without ever going negative. Persistence lives in `gitmarket-db`.

pub mod balance;
pub mod entry;
pub mod error;

#[cfg(test)]
mod balance_props;

pub use balance::{Account, AccountBalance, BalanceReconciliation};
pub use entry::{EntryKind, LedgerEntry, LedgerPosting};
pub use error::LedgerError;
