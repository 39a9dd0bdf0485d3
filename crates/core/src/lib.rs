//! Core business logic for GitMarket.
//!
//! This crate contains pure marketplace rules with ZERO web or database
//! dependencies.
//!
//! # Modules
//!
//! - `ledger` - Signed wallet postings and balance arithmetic
//! - `bounty` - Bounty and submission state machines, market rules, errors
//! - `events` - Domain events published after each committed mutation

pub mod bounty;
pub mod events;
pub mod ledger;

pub use bounty::{
    Bounty, BountyDetail, BountyError, BountyLifecycle, BountyStatus, BountyTransition, IssueRef,
    MarketRules, Submission, SubmissionStatus,
};
pub use events::{DomainEvent, EventPublisher};
pub use ledger::{
    Account, AccountBalance, BalanceReconciliation, EntryKind, LedgerEntry, LedgerError,
    LedgerPosting,
};
