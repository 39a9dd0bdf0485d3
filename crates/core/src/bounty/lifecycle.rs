//! Bounty and submission state machine.
//!
//! Pure checks against a snapshot of the rows involved. The persistence
//! layer still has to apply each transition with a status-guarded update,
//! because the snapshot may be stale by the time it commits.

use gitmarket_shared::types::{BountyId, SubmissionId, UserId};

use crate::bounty::error::BountyError;
use crate::bounty::types::{Bounty, BountyStatus, Submission, SubmissionStatus};
use crate::ledger::{EntryKind, LedgerError, LedgerPosting};

/// A validated transition with everything needed to persist it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BountyTransition {
    /// Close the bounty and return the escrow to its creator.
    Cancel {
        /// Bounty being cancelled.
        bounty_id: BountyId,
        /// Status the bounty moves to.
        new_status: BountyStatus,
        /// Creator receiving the refund.
        refund_to: UserId,
        /// Amount refunded.
        amount: i64,
    },
    /// Record a new pending submission.
    Submit {
        /// Bounty being claimed.
        bounty_id: BountyId,
        /// Solver making the claim.
        solver_id: UserId,
        /// Status the new submission starts in.
        new_status: SubmissionStatus,
    },
    /// Accept a submission, close the bounty and pay the solver.
    Approve {
        /// Bounty being paid.
        bounty_id: BountyId,
        /// Winning submission.
        submission_id: SubmissionId,
        /// Status the bounty moves to.
        new_status: BountyStatus,
        /// Status the submission moves to.
        submission_status: SubmissionStatus,
        /// Solver receiving the payout.
        pay_to: UserId,
        /// Amount paid.
        amount: i64,
    },
    /// Decline a submission. Bounty and ledger are untouched.
    Reject {
        /// Bounty the submission belongs to.
        bounty_id: BountyId,
        /// Declined submission.
        submission_id: SubmissionId,
        /// Status the submission moves to.
        submission_status: SubmissionStatus,
    },
}

impl BountyTransition {
    /// Target bounty status, if the transition changes it.
    #[must_use]
    pub fn new_bounty_status(&self) -> Option<BountyStatus> {
        match self {
            Self::Cancel { new_status, .. } | Self::Approve { new_status, .. } => Some(*new_status),
            Self::Submit { .. } | Self::Reject { .. } => None,
        }
    }

    /// Target submission status, if the transition changes one.
    #[must_use]
    pub fn new_submission_status(&self) -> Option<SubmissionStatus> {
        match self {
            Self::Submit { new_status, .. } => Some(*new_status),
            Self::Approve {
                submission_status, ..
            }
            | Self::Reject {
                submission_status, ..
            } => Some(*submission_status),
            Self::Cancel { .. } => None,
        }
    }

    /// The ledger credit this transition writes, if any.
    pub fn posting(&self) -> Result<Option<LedgerPosting>, LedgerError> {
        match self {
            Self::Cancel {
                bounty_id,
                refund_to,
                amount,
                ..
            } => LedgerPosting::credit(
                *refund_to,
                *amount,
                EntryKind::BountyRefund,
                Some(*bounty_id),
                format!("Refund for cancelled bounty {bounty_id}"),
            )
            .map(Some),
            Self::Approve {
                bounty_id,
                pay_to,
                amount,
                ..
            } => LedgerPosting::credit(
                *pay_to,
                *amount,
                EntryKind::BountyEarned,
                Some(*bounty_id),
                format!("Payout for bounty {bounty_id}"),
            )
            .map(Some),
            Self::Submit { .. } | Self::Reject { .. } => Ok(None),
        }
    }
}

/// Stateless validator for bounty and submission transitions.
pub struct BountyLifecycle;

impl BountyLifecycle {
    /// Cancel an open bounty.
    ///
    /// # Arguments
    /// * `bounty` - Current bounty snapshot
    /// * `actor_id` - The user requesting cancellation
    ///
    /// # Returns
    /// * `Ok(BountyTransition::Cancel)` refunding the full amount
    /// * `Err(BountyError::Forbidden)` if the actor is not the creator
    /// * `Err(BountyError::InvalidState)` if the bounty is not open
    pub fn cancel(bounty: &Bounty, actor_id: UserId) -> Result<BountyTransition, BountyError> {
        Self::require_creator(bounty, actor_id, "cancel this bounty")?;
        Self::require_open(bounty)?;
        Ok(BountyTransition::Cancel {
            bounty_id: bounty.id,
            new_status: BountyStatus::Cancelled,
            refund_to: bounty.creator_id,
            amount: bounty.amount,
        })
    }

    /// Submit a solution to an open bounty.
    ///
    /// # Arguments
    /// * `bounty` - Current bounty snapshot
    /// * `solver_id` - The user submitting
    ///
    /// # Returns
    /// * `Ok(BountyTransition::Submit)` for a new pending submission
    /// * `Err(BountyError::InvalidState)` if the bounty is not open
    /// * `Err(BountyError::Forbidden)` if the solver created the bounty
    pub fn submit(bounty: &Bounty, solver_id: UserId) -> Result<BountyTransition, BountyError> {
        Self::require_open(bounty)?;
        if solver_id == bounty.creator_id {
            return Err(BountyError::Forbidden {
                actor_id: solver_id,
                action: "submit a solution to their own bounty",
            });
        }
        Ok(BountyTransition::Submit {
            bounty_id: bounty.id,
            solver_id,
            new_status: SubmissionStatus::Pending,
        })
    }

    /// Approve a pending submission and pay its solver.
    ///
    /// # Arguments
    /// * `bounty` - Current bounty snapshot
    /// * `submission` - The submission being approved
    /// * `actor_id` - The user approving
    ///
    /// # Returns
    /// * `Ok(BountyTransition::Approve)` paying the bounty amount to the solver
    /// * `Err(BountyError::Forbidden)` if the actor is not the creator
    /// * `Err(BountyError::InvalidState)` if the bounty is not open, or the
    ///   submission is not pending on this bounty
    pub fn approve(
        bounty: &Bounty,
        submission: &Submission,
        actor_id: UserId,
    ) -> Result<BountyTransition, BountyError> {
        Self::require_creator(bounty, actor_id, "approve submissions on this bounty")?;
        Self::require_open(bounty)?;
        Self::require_pending(bounty, submission)?;
        Ok(BountyTransition::Approve {
            bounty_id: bounty.id,
            submission_id: submission.id,
            new_status: BountyStatus::Paid,
            submission_status: SubmissionStatus::Approved,
            pay_to: submission.solver_id,
            amount: bounty.amount,
        })
    }

    /// Reject a pending submission.
    ///
    /// The bounty does not need to be open: a leftover pending submission on a
    /// closed bounty can still be declined.
    ///
    /// # Returns
    /// * `Ok(BountyTransition::Reject)`
    /// * `Err(BountyError::Forbidden)` if the actor is not the creator
    /// * `Err(BountyError::InvalidState)` if the submission is not pending on this bounty
    pub fn reject(
        bounty: &Bounty,
        submission: &Submission,
        actor_id: UserId,
    ) -> Result<BountyTransition, BountyError> {
        Self::require_creator(bounty, actor_id, "reject submissions on this bounty")?;
        Self::require_pending(bounty, submission)?;
        Ok(BountyTransition::Reject {
            bounty_id: bounty.id,
            submission_id: submission.id,
            submission_status: SubmissionStatus::Rejected,
        })
    }

    /// Check if a bounty status transition is valid.
    ///
    /// Valid transitions:
    /// - Open → Paid (approve)
    /// - Open → Cancelled (cancel)
    #[must_use]
    pub fn is_valid_transition(from: BountyStatus, to: BountyStatus) -> bool {
        matches!(
            (from, to),
            (BountyStatus::Open, BountyStatus::Paid | BountyStatus::Cancelled)
        )
    }

    /// Check if a submission status transition is valid.
    #[must_use]
    pub fn is_valid_submission_transition(from: SubmissionStatus, to: SubmissionStatus) -> bool {
        matches!(
            (from, to),
            (
                SubmissionStatus::Pending,
                SubmissionStatus::Approved | SubmissionStatus::Rejected
            )
        )
    }

    fn require_creator(
        bounty: &Bounty,
        actor_id: UserId,
        action: &'static str,
    ) -> Result<(), BountyError> {
        if actor_id != bounty.creator_id {
            return Err(BountyError::Forbidden { actor_id, action });
        }
        Ok(())
    }

    fn require_open(bounty: &Bounty) -> Result<(), BountyError> {
        if bounty.status != BountyStatus::Open {
            return Err(BountyError::InvalidState(format!(
                "bounty {} is {}, not open",
                bounty.id, bounty.status
            )));
        }
        Ok(())
    }

    fn require_pending(bounty: &Bounty, submission: &Submission) -> Result<(), BountyError> {
        if submission.bounty_id != bounty.id {
            return Err(BountyError::InvalidState(format!(
                "submission {} does not belong to bounty {}",
                submission.id, bounty.id
            )));
        }
        if submission.status != SubmissionStatus::Pending {
            return Err(BountyError::InvalidState(format!(
                "submission {} is {}, not pending",
                submission.id, submission.status
            )));
        }
        Ok(())
    }
}
