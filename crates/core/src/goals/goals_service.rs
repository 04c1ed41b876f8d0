use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};

use super::goals_model::{Goal, GoalStatus, SweepReport};
use super::goals_state_machine::{apply_recomputed_progress, decide_reversal, decide_transition};
use super::goals_traits::{
    GoalProgressServiceTrait, GoalRepositoryTrait, GoalUnitOfWork, GoalWork,
};
use crate::errors::Result;
use crate::ledger::{NewProgressLedgerEntry, ProgressLedgerEntry, ReadingEntryStatus};
use crate::utils::Clock;

/// How completion events treat goals that are already `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletedGoalPolicy {
    /// Completed goals keep counting books as bonus; their status stays frozen.
    #[default]
    Accrue,
    /// Only `Active` goals are touched by completion events.
    Skip,
}

impl CompletedGoalPolicy {
    /// Statuses whose goals receive ledger entries on a completion event.
    /// `Expired` goals never do.
    pub fn counted_statuses(&self) -> &'static [GoalStatus] {
        match self {
            CompletedGoalPolicy::Accrue => &[GoalStatus::Active, GoalStatus::Completed],
            CompletedGoalPolicy::Skip => &[GoalStatus::Active],
        }
    }
}

/// Tuning knobs for the goal progress service.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoalProgressConfig {
    /// Upper bound on one unit of work, measured from submission to commit.
    pub unit_of_work_timeout: Option<Duration>,
    pub completed_goal_policy: CompletedGoalPolicy,
}

/// Keeps reading goals consistent with reading-entry completion events.
pub struct GoalProgressService {
    repository: Arc<dyn GoalRepositoryTrait>,
    clock: Arc<dyn Clock>,
    config: GoalProgressConfig,
}

impl GoalProgressService {
    pub fn new(
        repository: Arc<dyn GoalRepositoryTrait>,
        clock: Arc<dyn Clock>,
        config: GoalProgressConfig,
    ) -> Self {
        GoalProgressService {
            repository,
            clock,
            config,
        }
    }

    async fn run(&self, work: GoalWork) -> Result<Vec<Goal>> {
        self.repository
            .run_unit_of_work(work, self.config.unit_of_work_timeout)
            .await
    }
}

#[async_trait]
impl GoalProgressServiceTrait for GoalProgressService {
    async fn on_book_completed(
        &self,
        user_id: &str,
        reading_entry_id: &str,
        book_id: &str,
        from_state: Option<ReadingEntryStatus>,
    ) -> Result<Vec<Goal>> {
        let now = self.clock.now();
        let user_id = user_id.to_string();
        let reading_entry_id = reading_entry_id.to_string();
        let book_id = book_id.to_string();
        let statuses = self.config.completed_goal_policy.counted_statuses();

        let updated = self
            .run(Box::new(move |uow: &mut dyn GoalUnitOfWork| {
                let goals = uow.load_goals_for_user(&user_id, statuses)?;
                let mut updated = Vec::with_capacity(goals.len());

                for goal in goals {
                    let inserted = uow.record_if_absent(NewProgressLedgerEntry {
                        goal_id: goal.id.clone(),
                        reading_entry_id: reading_entry_id.clone(),
                        book_id: book_id.clone(),
                        applied_at: now,
                        applied_from_state: from_state,
                    })?;
                    if !inserted {
                        debug!(
                            "Reading entry {} already counted toward goal {}",
                            reading_entry_id, goal.id
                        );
                    }

                    let count = uow.count_for(&goal.id)?;
                    let mut goal = apply_recomputed_progress(goal, count, now);
                    decide_transition(&goal, now).apply_to(&mut goal);
                    uow.save_goal(&goal)?;

                    debug!(
                        "Goal {} now {}/{} (bonus {}), status {}",
                        goal.id,
                        goal.progress_count,
                        goal.target_count,
                        goal.bonus_count,
                        goal.status
                    );
                    updated.push(goal);
                }

                Ok(updated)
            }))
            .await?;

        for goal in updated
            .iter()
            .filter(|g| g.status == GoalStatus::Completed && g.completed_at == Some(now))
        {
            info!("Goal {} completed for user {}", goal.id, goal.user_id);
        }
        Ok(updated)
    }

    async fn on_book_uncompleted(
        &self,
        user_id: &str,
        reading_entry_id: &str,
    ) -> Result<Vec<Goal>> {
        let now = self.clock.now();
        let user_id = user_id.to_string();
        let reading_entry_id = reading_entry_id.to_string();

        self.run(Box::new(move |uow: &mut dyn GoalUnitOfWork| {
            let goals = uow.load_goals_for_reading_entry(&user_id, &reading_entry_id)?;
            let removed_from = uow.remove_by_reading_entry(&reading_entry_id)?;

            let foreign: Vec<&String> = removed_from
                .iter()
                .filter(|goal_id| !goals.iter().any(|g| &g.id == *goal_id))
                .collect();
            if !foreign.is_empty() {
                warn!(
                    "Reading entry {} was also counted toward goals not owned by user {}: {:?}",
                    reading_entry_id, user_id, foreign
                );
            }

            let mut updated = Vec::with_capacity(goals.len());
            for goal in goals {
                let count = uow.count_for(&goal.id)?;
                let mut goal = apply_recomputed_progress(goal, count, now);
                if let Some(status) = decide_reversal(&goal) {
                    debug!("Goal {} dropped below target, reactivating", goal.id);
                    goal.status = status;
                    goal.completed_at = None;
                }
                uow.save_goal(&goal)?;
                updated.push(goal);
            }

            Ok(updated)
        }))
        .await
    }

    async fn expire_overdue_goals(&self) -> Result<Vec<String>> {
        Ok(self.sweep_overdue_goals().await?.expired_goal_ids)
    }

    async fn sweep_overdue_goals(&self) -> Result<SweepReport> {
        let now = self.clock.now();

        let transitioned = self
            .run(Box::new(move |uow: &mut dyn GoalUnitOfWork| {
                let candidates = uow.load_overdue_active_goals(now)?;
                let mut transitioned = Vec::new();

                for goal in candidates {
                    let count = uow.count_for(&goal.id)?;
                    let mut goal = apply_recomputed_progress(goal, count, now);
                    let decision = decide_transition(&goal, now);
                    decision.apply_to(&mut goal);
                    uow.save_goal(&goal)?;
                    if decision.should_update {
                        transitioned.push(goal);
                    }
                }

                Ok(transitioned)
            }))
            .await?;

        let mut report = SweepReport::default();
        for goal in transitioned {
            match goal.status {
                GoalStatus::Expired => report.expired_goal_ids.push(goal.id),
                GoalStatus::Completed => report.completed_goal_ids.push(goal.id),
                GoalStatus::Active => {}
            }
        }

        if !report.is_empty() {
            info!(
                "Overdue goal sweep: {} expired, {} completed",
                report.expired_goal_ids.len(),
                report.completed_goal_ids.len()
            );
        }
        Ok(report)
    }

    fn get_goal(&self, goal_id: &str) -> Result<Goal> {
        self.repository.get_goal(goal_id)
    }

    fn list_goals_for_user(&self, user_id: &str) -> Result<Vec<Goal>> {
        self.repository.list_goals_for_user(user_id)
    }

    fn list_progress_entries(&self, goal_id: &str) -> Result<Vec<ProgressLedgerEntry>> {
        self.repository.list_progress_entries(goal_id)
    }
}
