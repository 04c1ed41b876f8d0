//! Property-based tests for the goal transition rules.
//!
//! These tests verify that the bonus law and the ordering of the transition
//! rules hold across all valid goal snapshots.

use bookshelf_core::goals::{
    apply_recomputed_progress, bonus_for, decide_reversal, decide_transition, Goal, GoalStatus,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

// =============================================================================
// Generators
// =============================================================================

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

fn arb_status() -> impl Strategy<Value = GoalStatus> {
    prop_oneof![
        Just(GoalStatus::Active),
        Just(GoalStatus::Completed),
        Just(GoalStatus::Expired),
    ]
}

/// Generates a goal snapshot with counters consistent with its progress.
fn arb_goal() -> impl Strategy<Value = Goal> {
    (
        arb_status(),
        1i64..50,           // target
        0i64..80,           // progress
        -1000i64..1000,     // deadline offset, hours from base
    )
        .prop_map(|(status, target, progress, deadline_hours)| Goal {
            id: "goal".to_string(),
            user_id: "reader".to_string(),
            name: "Prop goal".to_string(),
            target_count: target,
            progress_count: progress,
            bonus_count: bonus_for(progress, target),
            status,
            deadline_at_utc: base() + Duration::hours(deadline_hours),
            timezone: None,
            completed_at: (status == GoalStatus::Completed).then(|| base() - Duration::days(1)),
            created_at: base() - Duration::days(100),
            updated_at: base() - Duration::days(100),
        })
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Recomputed counters always satisfy bonus = max(0, progress - target).
    #[test]
    fn prop_bonus_law(goal in arb_goal(), count in 0i64..200) {
        let goal = apply_recomputed_progress(goal, count, base());
        prop_assert_eq!(goal.progress_count, count);
        prop_assert_eq!(goal.bonus_count, (count - goal.target_count).max(0));
        prop_assert!(goal.bonus_count >= 0);
    }

    /// Terminal statuses never change status or completion time.
    #[test]
    fn prop_terminal_goals_are_frozen(goal in arb_goal(), now_offset in -2000i64..2000) {
        prop_assume!(goal.status != GoalStatus::Active);
        let decision = decide_transition(&goal, base() + Duration::hours(now_offset));
        prop_assert!(!decision.should_update);
        prop_assert_eq!(decision.new_status, goal.status);
        prop_assert_eq!(decision.new_completed_at, goal.completed_at);
    }

    /// Reaching the target wins over the deadline; only short goals can expire.
    #[test]
    fn prop_target_checked_before_deadline(goal in arb_goal(), now_offset in -2000i64..2000) {
        prop_assume!(goal.status == GoalStatus::Active);
        let now = base() + Duration::hours(now_offset);
        let decision = decide_transition(&goal, now);

        if goal.progress_count >= goal.target_count {
            prop_assert_eq!(decision.new_status, GoalStatus::Completed);
            prop_assert_eq!(decision.new_completed_at, Some(now));
        } else if now > goal.deadline_at_utc {
            prop_assert_eq!(decision.new_status, GoalStatus::Expired);
            prop_assert_eq!(decision.new_completed_at, None);
        } else {
            prop_assert!(!decision.should_update);
        }
    }

    /// Reversal only ever reactivates a completed goal that is below target.
    #[test]
    fn prop_reversal_is_asymmetric(goal in arb_goal()) {
        match decide_reversal(&goal) {
            Some(status) => {
                prop_assert_eq!(status, GoalStatus::Active);
                prop_assert_eq!(goal.status, GoalStatus::Completed);
                prop_assert!(goal.progress_count < goal.target_count);
            }
            None => {
                prop_assert!(
                    goal.status != GoalStatus::Completed
                        || goal.progress_count >= goal.target_count
                );
            }
        }
    }
}
