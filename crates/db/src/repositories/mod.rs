//! Repository abstractions for data access.

pub mod bounty;
pub mod ledger;

pub use bounty::{BountyRepository, NewSubmission};
pub use ledger::LedgerRepository;
