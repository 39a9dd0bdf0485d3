//! Bounty and submission domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use gitmarket_shared::types::{BountyId, SubmissionId, UserId};

/// Bounty status.
///
/// Valid transitions:
/// - Open → Paid (approve a submission)
/// - Open → Cancelled (creator cancels)
///
/// `Claimed` can be stored and read back, but nothing moves a bounty into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BountyStatus {
    /// Accepting submissions; funds are in escrow.
    Open,
    /// Reserved for a reviewed claim. Never produced.
    Claimed,
    /// Paid out to a solver (terminal).
    Paid,
    /// Refunded to the creator (terminal).
    Cancelled,
}

impl BountyStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Claimed => "claimed",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "open" => Some(Self::Open),
            "claimed" => Some(Self::Claimed),
            "paid" => Some(Self::Paid),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if no transition may leave this status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Cancelled)
    }

    /// Returns true while the bounty amount is held out of the creator's balance.
    #[must_use]
    pub fn holds_escrow(&self) -> bool {
        matches!(self, Self::Open | Self::Claimed)
    }
}

impl fmt::Display for BountyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Submission status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Awaiting review by the bounty creator.
    Pending,
    /// Accepted and paid (terminal).
    Approved,
    /// Declined by the creator (terminal).
    Rejected,
}

impl SubmissionStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reference to the external issue a bounty is placed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    /// Repository full name, `owner/name`.
    pub repo: String,
    /// Issue number within the repository.
    pub issue_number: i64,
    /// Issue title at the time the bounty was placed.
    pub issue_title: String,
    /// Link to the issue.
    pub issue_url: String,
}

impl IssueRef {
    /// Creates an issue reference.
    pub fn new(
        repo: impl Into<String>,
        issue_number: i64,
        issue_title: impl Into<String>,
        issue_url: impl Into<String>,
    ) -> Self {
        Self {
            repo: repo.into(),
            issue_number,
            issue_title: issue_title.into(),
            issue_url: issue_url.into(),
        }
    }
}

/// An escrowed commitment of funds against one issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounty {
    /// Unique identifier.
    pub id: BountyId,
    /// The issue being funded.
    pub issue: IssueRef,
    /// The user whose funds are in escrow.
    pub creator_id: UserId,
    /// Escrowed amount in minor units.
    pub amount: i64,
    /// Current status.
    pub status: BountyStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

/// A solver's claim against a bounty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Unique identifier.
    pub id: SubmissionId,
    /// The bounty claimed.
    pub bounty_id: BountyId,
    /// The user claiming the bounty.
    pub solver_id: UserId,
    /// Pull request with the fix.
    pub pr_url: String,
    /// Optional note for the reviewer.
    pub comment: Option<String>,
    /// Current status.
    pub status: SubmissionStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

/// A bounty with all of its submissions, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BountyDetail {
    /// The bounty.
    pub bounty: Bounty,
    /// Submissions against it.
    pub submissions: Vec<Submission>,
}

impl BountyDetail {
    /// Returns the approved submission, if the bounty has been paid.
    #[must_use]
    pub fn winner(&self) -> Option<&Submission> {
        self.submissions
            .iter()
            .find(|s| s.status == SubmissionStatus::Approved)
    }

    /// Number of submissions still awaiting review.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.submissions
            .iter()
            .filter(|s| s.status == SubmissionStatus::Pending)
            .count()
    }
}
