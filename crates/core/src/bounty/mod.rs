//! Bounty and submission lifecycle.
//!
//! - `types` - Status enums and the bounty/submission records
//! - `lifecycle` - Stateless transition checks
//! - `rules` - Amount, issue and pull request validation
//! - `error` - The error taxonomy shared by every marketplace operation

pub mod error;
pub mod lifecycle;
pub mod rules;
pub mod types;

#[cfg(test)]
mod lifecycle_props;

pub use error::BountyError;
pub use lifecycle::{BountyLifecycle, BountyTransition};
pub use rules::MarketRules;
pub use types::{Bounty, BountyDetail, BountyStatus, IssueRef, Submission, SubmissionStatus};
