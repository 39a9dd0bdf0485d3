//! Entity re-exports.

pub use super::accounts::Entity as Accounts;
pub use super::bounties::Entity as Bounties;
pub use super::ledger_entries::Entity as LedgerEntries;
pub use super::submissions::Entity as Submissions;
