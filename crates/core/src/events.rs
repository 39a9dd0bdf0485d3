//! Domain events.
//!
//! Emitted after a mutation commits so observers (notification push, audit
//! feeds) can follow the marketplace. Delivery is best effort: a missing or
//! lagging subscriber never affects the operation that produced the event.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use gitmarket_shared::types::{BountyId, SubmissionId, UserId};

/// Something that happened to marketplace state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A wallet was opened.
    AccountOpened {
        /// Owner of the new account.
        account_id: UserId,
        /// Signup bonus credited.
        bonus: i64,
    },
    /// A bounty was placed and its amount escrowed.
    BountyCreated {
        /// The new bounty.
        bounty_id: BountyId,
        /// Creator whose balance was debited.
        creator_id: UserId,
        /// Escrowed amount.
        amount: i64,
    },
    /// A bounty was cancelled and refunded.
    BountyCancelled {
        /// The cancelled bounty.
        bounty_id: BountyId,
        /// Creator who received the refund.
        creator_id: UserId,
        /// Refunded amount.
        amount: i64,
    },
    /// A solver submitted a pull request.
    SubmissionCreated {
        /// Bounty claimed.
        bounty_id: BountyId,
        /// The new submission.
        submission_id: SubmissionId,
        /// Submitting user.
        solver_id: UserId,
    },
    /// A submission was approved and paid.
    SubmissionApproved {
        /// Bounty paid out.
        bounty_id: BountyId,
        /// Winning submission.
        submission_id: SubmissionId,
        /// Solver credited.
        solver_id: UserId,
        /// Payout amount.
        amount: i64,
    },
    /// A submission was declined.
    SubmissionRejected {
        /// Bounty the submission belongs to.
        bounty_id: BountyId,
        /// Declined submission.
        submission_id: SubmissionId,
        /// Solver whose submission was declined.
        solver_id: UserId,
    },
}

impl DomainEvent {
    /// Short name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AccountOpened { .. } => "account_opened",
            Self::BountyCreated { .. } => "bounty_created",
            Self::BountyCancelled { .. } => "bounty_cancelled",
            Self::SubmissionCreated { .. } => "submission_created",
            Self::SubmissionApproved { .. } => "submission_approved",
            Self::SubmissionRejected { .. } => "submission_rejected",
        }
    }

    /// The bounty this event concerns, if any.
    #[must_use]
    pub fn bounty_id(&self) -> Option<BountyId> {
        match self {
            Self::AccountOpened { .. } => None,
            Self::BountyCreated { bounty_id, .. }
            | Self::BountyCancelled { bounty_id, .. }
            | Self::SubmissionCreated { bounty_id, .. }
            | Self::SubmissionApproved { bounty_id, .. }
            | Self::SubmissionRejected { bounty_id, .. } => Some(*bounty_id),
        }
    }
}

/// Fan-out channel for [`DomainEvent`]s.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventPublisher {
    /// Creates a publisher buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event. Never fails.
    pub fn publish(&self, event: DomainEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => tracing::debug!(event = name, receivers, "Published domain event"),
            Err(_) => tracing::debug!(event = name, "No subscribers for domain event"),
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(256)
    }
}
