//! Goal status transition rules.
//!
//! Everything here is a pure function of a goal snapshot and an instant, so the
//! ordering-sensitive rules can be exercised without a store.

use chrono::{DateTime, Utc};

use super::goals_model::{Goal, GoalStatus, TransitionDecision};

/// Books completed beyond the target.
pub fn bonus_for(progress_count: i64, target_count: i64) -> i64 {
    (progress_count - target_count).max(0)
}

/// Returns the goal with counters replaced by values derived from `ledger_count`.
pub fn apply_recomputed_progress(mut goal: Goal, ledger_count: i64, now: DateTime<Utc>) -> Goal {
    goal.progress_count = ledger_count;
    goal.bonus_count = bonus_for(ledger_count, goal.target_count);
    goal.updated_at = now;
    goal
}

/// Decides whether a goal changes status.
///
/// Rules are checked in order and the first match wins:
/// 1. `Completed` and `Expired` never change here.
/// 2. Reaching the target completes the goal, even past the deadline.
/// 3. Being past the deadline expires the goal.
/// 4. Otherwise nothing changes.
pub fn decide_transition(goal: &Goal, now: DateTime<Utc>) -> TransitionDecision {
    if goal.status.is_terminal() {
        return TransitionDecision::unchanged(goal);
    }

    if goal.progress_count >= goal.target_count {
        return TransitionDecision {
            should_update: true,
            new_status: GoalStatus::Completed,
            new_completed_at: Some(now),
        };
    }

    if now > goal.deadline_at_utc {
        return TransitionDecision {
            should_update: true,
            new_status: GoalStatus::Expired,
            new_completed_at: None,
        };
    }

    TransitionDecision::unchanged(goal)
}

/// Reversal applied after a counted book is uncompleted.
///
/// Only a `Completed` goal that has dropped below its target goes back to
/// `Active`. Bonus padding keeps a goal completed; `Expired` never reverts.
pub fn decide_reversal(goal: &Goal) -> Option<GoalStatus> {
    if goal.status == GoalStatus::Completed && goal.progress_count < goal.target_count {
        Some(GoalStatus::Active)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 9, 30, 0).unwrap()
    }

    fn goal(status: GoalStatus, target: i64, progress: i64, deadline: DateTime<Utc>) -> Goal {
        Goal {
            id: "goal-1".to_string(),
            user_id: "user-1".to_string(),
            name: "Summer reading".to_string(),
            target_count: target,
            progress_count: progress,
            bonus_count: bonus_for(progress, target),
            status,
            deadline_at_utc: deadline,
            timezone: Some("Europe/Lisbon".to_string()),
            completed_at: None,
            created_at: now() - Duration::days(30),
            updated_at: now() - Duration::days(30),
        }
    }

    #[test]
    fn test_bonus_for_never_negative() {
        assert_eq!(bonus_for(0, 3), 0);
        assert_eq!(bonus_for(3, 3), 0);
        assert_eq!(bonus_for(5, 3), 2);
    }

    #[test]
    fn test_active_goal_reaching_target_completes() {
        let g = goal(GoalStatus::Active, 3, 3, now() + Duration::days(10));
        let decision = decide_transition(&g, now());
        assert!(decision.should_update);
        assert_eq!(decision.new_status, GoalStatus::Completed);
        assert_eq!(decision.new_completed_at, Some(now()));
    }

    #[test]
    fn test_target_wins_over_deadline_in_same_pass() {
        let g = goal(GoalStatus::Active, 3, 4, now() - Duration::days(1));
        let decision = decide_transition(&g, now());
        assert_eq!(decision.new_status, GoalStatus::Completed);
    }

    #[test]
    fn test_one_short_past_deadline_expires() {
        let g = goal(GoalStatus::Active, 10, 9, now() - Duration::seconds(1));
        let decision = decide_transition(&g, now());
        assert!(decision.should_update);
        assert_eq!(decision.new_status, GoalStatus::Expired);
        assert_eq!(decision.new_completed_at, None);
    }

    #[test]
    fn test_deadline_is_exclusive() {
        let g = goal(GoalStatus::Active, 10, 2, now());
        assert!(!decide_transition(&g, now()).should_update);
    }

    #[test]
    fn test_in_progress_goal_is_unchanged() {
        let g = goal(GoalStatus::Active, 10, 2, now() + Duration::days(3));
        let decision = decide_transition(&g, now());
        assert_eq!(decision, TransitionDecision::unchanged(&g));
    }

    #[test]
    fn test_terminal_statuses_short_circuit() {
        let mut completed = goal(GoalStatus::Completed, 3, 1, now() - Duration::days(5));
        completed.completed_at = Some(now() - Duration::days(6));
        let decision = decide_transition(&completed, now());
        assert!(!decision.should_update);
        assert_eq!(decision.new_completed_at, completed.completed_at);

        let expired = goal(GoalStatus::Expired, 3, 7, now() + Duration::days(5));
        assert!(!decide_transition(&expired, now()).should_update);
    }

    #[test]
    fn test_apply_to_ignores_non_updating_decision() {
        let mut g = goal(GoalStatus::Active, 3, 1, now() + Duration::days(1));
        TransitionDecision {
            should_update: false,
            new_status: GoalStatus::Expired,
            new_completed_at: None,
        }
        .apply_to(&mut g);
        assert_eq!(g.status, GoalStatus::Active);
    }

    #[test]
    fn test_reversal_only_below_target() {
        let at_target = goal(GoalStatus::Completed, 3, 3, now());
        assert_eq!(decide_reversal(&at_target), None);

        let below = goal(GoalStatus::Completed, 3, 2, now());
        assert_eq!(decide_reversal(&below), Some(GoalStatus::Active));

        let expired = goal(GoalStatus::Expired, 3, 0, now());
        assert_eq!(decide_reversal(&expired), None);

        let active = goal(GoalStatus::Active, 3, 0, now());
        assert_eq!(decide_reversal(&active), None);
    }

    #[test]
    fn test_apply_recomputed_progress_sets_derived_fields() {
        let g = goal(GoalStatus::Active, 3, 0, now());
        let g = apply_recomputed_progress(g, 5, now());
        assert_eq!(g.progress_count, 5);
        assert_eq!(g.bonus_count, 2);
        assert_eq!(g.updated_at, now());
    }
}
