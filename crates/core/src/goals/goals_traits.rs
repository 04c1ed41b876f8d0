use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::goals::goals_model::{Goal, GoalStatus, NewReadingGoal, SweepReport};
use crate::ledger::{ProgressLedger, ProgressLedgerEntry, ReadingEntryStatus};

/// Goal reads and writes available inside one atomic unit of work.
///
/// Implementations hold the goal rows they load locked against other units of
/// work until the unit commits or rolls back.
pub trait GoalUnitOfWork: ProgressLedger {
    /// Goals owned by the user in any of `statuses`, oldest `created_at` first
    /// (ties by id).
    fn load_goals_for_user(&mut self, user_id: &str, statuses: &[GoalStatus])
        -> Result<Vec<Goal>>;

    /// The user's goals that currently have a ledger entry for the reading
    /// entry, oldest `created_at` first.
    fn load_goals_for_reading_entry(
        &mut self,
        user_id: &str,
        reading_entry_id: &str,
    ) -> Result<Vec<Goal>>;

    /// Active goals of every user whose deadline is strictly before `now`.
    fn load_overdue_active_goals(&mut self, now: DateTime<Utc>) -> Result<Vec<Goal>>;

    /// Persists counters, status, `completed_at` and `updated_at` of an existing goal.
    fn save_goal(&mut self, goal: &Goal) -> Result<()>;
}

/// A job executed atomically against the goal store.
pub type GoalWork = Box<dyn FnOnce(&mut dyn GoalUnitOfWork) -> Result<Vec<Goal>> + Send + 'static>;

/// Trait for goal repository operations
#[async_trait]
pub trait GoalRepositoryTrait: Send + Sync {
    /// Runs `work` in one transaction. Any error rolls back every write it made.
    ///
    /// When `timeout` is set and elapses before commit, the transaction is rolled
    /// back and `DatabaseError::Timeout` is returned.
    async fn run_unit_of_work(&self, work: GoalWork, timeout: Option<Duration>)
        -> Result<Vec<Goal>>;

    async fn insert_goal(&self, new_goal: NewReadingGoal) -> Result<Goal>;

    fn get_goal(&self, goal_id: &str) -> Result<Goal>;

    fn list_goals_for_user(&self, user_id: &str) -> Result<Vec<Goal>>;

    fn list_progress_entries(&self, goal_id: &str) -> Result<Vec<ProgressLedgerEntry>>;
}

/// Trait for goal progress operations driven by reading-entry events.
#[async_trait]
pub trait GoalProgressServiceTrait: Send + Sync {
    async fn on_book_completed(
        &self,
        user_id: &str,
        reading_entry_id: &str,
        book_id: &str,
        from_state: Option<ReadingEntryStatus>,
    ) -> Result<Vec<Goal>>;

    async fn on_book_uncompleted(&self, user_id: &str, reading_entry_id: &str)
        -> Result<Vec<Goal>>;

    async fn expire_overdue_goals(&self) -> Result<Vec<String>>;

    async fn sweep_overdue_goals(&self) -> Result<SweepReport>;

    fn get_goal(&self, goal_id: &str) -> Result<Goal>;

    fn list_goals_for_user(&self, user_id: &str) -> Result<Vec<Goal>>;

    fn list_progress_entries(&self, goal_id: &str) -> Result<Vec<ProgressLedgerEntry>>;
}
