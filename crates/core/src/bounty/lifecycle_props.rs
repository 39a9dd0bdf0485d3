//! Property-based tests for BountyLifecycle.

use chrono::Utc;
use proptest::prelude::*;
use uuid::Uuid;

use gitmarket_shared::types::{BountyId, SubmissionId, UserId};

use crate::bounty::error::BountyError;
use crate::bounty::lifecycle::BountyLifecycle;
use crate::bounty::types::{Bounty, BountyStatus, IssueRef, Submission, SubmissionStatus};

fn arb_bounty_status() -> impl Strategy<Value = BountyStatus> {
    prop_oneof![
        Just(BountyStatus::Open),
        Just(BountyStatus::Claimed),
        Just(BountyStatus::Paid),
        Just(BountyStatus::Cancelled),
    ]
}

fn arb_submission_status() -> impl Strategy<Value = SubmissionStatus> {
    prop_oneof![
        Just(SubmissionStatus::Pending),
        Just(SubmissionStatus::Approved),
        Just(SubmissionStatus::Rejected),
    ]
}

fn arb_user() -> impl Strategy<Value = UserId> {
    any::<u128>().prop_map(|n| UserId::from_uuid(Uuid::from_u128(n)))
}

fn make_bounty(creator_id: UserId, amount: i64, status: BountyStatus) -> Bounty {
    let now = Utc::now();
    Bounty {
        id: BountyId::new(),
        issue: IssueRef::new("octo/repo", 1, "Issue", "https://github.com/octo/repo/issues/1"),
        creator_id,
        amount,
        status,
        created_at: now,
        updated_at: now,
    }
}

fn make_submission(bounty: &Bounty, solver_id: UserId, status: SubmissionStatus) -> Submission {
    let now = Utc::now();
    Submission {
        id: SubmissionId::new(),
        bounty_id: bounty.id,
        solver_id,
        pr_url: "https://github.com/octo/repo/pull/2".to_string(),
        comment: None,
        status,
        created_at: now,
        updated_at: now,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// No operation leaves a terminal bounty status.
    #[test]
    fn prop_terminal_states_are_final(
        status in arb_bounty_status(),
        target in arb_bounty_status(),
    ) {
        if status.is_terminal() {
            prop_assert!(!BountyLifecycle::is_valid_transition(status, target));
        }
    }

    /// A successful cancel or approve always produces a transition the
    /// transition table allows.
    #[test]
    fn prop_produced_transitions_are_valid(
        creator in arb_user(),
        solver in arb_user(),
        amount in 5i64..1_000_000,
        status in arb_bounty_status(),
        sub_status in arb_submission_status(),
    ) {
        let bounty = make_bounty(creator, amount, status);
        let submission = make_submission(&bounty, solver, sub_status);

        if let Ok(t) = BountyLifecycle::cancel(&bounty, creator) {
            let to = t.new_bounty_status().unwrap();
            prop_assert!(BountyLifecycle::is_valid_transition(status, to));
        }
        if let Ok(t) = BountyLifecycle::approve(&bounty, &submission, creator) {
            let to = t.new_bounty_status().unwrap();
            prop_assert!(BountyLifecycle::is_valid_transition(status, to));
            prop_assert!(BountyLifecycle::is_valid_submission_transition(
                sub_status,
                t.new_submission_status().unwrap()
            ));
            let posting = t.posting().unwrap().unwrap();
            prop_assert_eq!(posting.amount(), amount);
            prop_assert_eq!(posting.account_id(), solver);
        }
    }

    /// Only the creator can cancel, approve or reject.
    #[test]
    fn prop_non_creator_always_forbidden(
        creator in arb_user(),
        actor in arb_user(),
        status in arb_bounty_status(),
        sub_status in arb_submission_status(),
    ) {
        prop_assume!(creator != actor);
        let bounty = make_bounty(creator, 50, status);
        let submission = make_submission(&bounty, actor, sub_status);

        let is_forbidden = |r: Result<_, BountyError>| matches!(r, Err(BountyError::Forbidden { .. }));
        prop_assert!(is_forbidden(BountyLifecycle::cancel(&bounty, actor)));
        prop_assert!(is_forbidden(BountyLifecycle::approve(&bounty, &submission, actor)));
        prop_assert!(is_forbidden(BountyLifecycle::reject(&bounty, &submission, actor)));
    }

    /// Approval succeeds exactly when the bounty is open and the submission pending.
    #[test]
    fn prop_approve_requires_open_and_pending(
        creator in arb_user(),
        solver in arb_user(),
        status in arb_bounty_status(),
        sub_status in arb_submission_status(),
    ) {
        let bounty = make_bounty(creator, 50, status);
        let submission = make_submission(&bounty, solver, sub_status);
        let result = BountyLifecycle::approve(&bounty, &submission, creator);
        let expected = status == BountyStatus::Open && sub_status == SubmissionStatus::Pending;
        prop_assert_eq!(result.is_ok(), expected);
        if !expected {
            prop_assert!(matches!(result, Err(BountyError::InvalidState(_))));
        }
    }

    /// Submissions only ever start pending and never come from the creator.
    #[test]
    fn prop_submit_outcomes(
        creator in arb_user(),
        solver in arb_user(),
        status in arb_bounty_status(),
    ) {
        let bounty = make_bounty(creator, 50, status);
        match BountyLifecycle::submit(&bounty, solver) {
            Ok(t) => {
                prop_assert_eq!(status, BountyStatus::Open);
                prop_assert_ne!(solver, creator);
                prop_assert_eq!(t.new_submission_status(), Some(SubmissionStatus::Pending));
            }
            Err(BountyError::InvalidState(_)) => prop_assert_ne!(status, BountyStatus::Open),
            Err(BountyError::Forbidden { .. }) => prop_assert_eq!(solver, creator),
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }
}
