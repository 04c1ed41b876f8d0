//! Background scheduler for the overdue goal sweep.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::main_lib::AppState;

/// Starts the periodic sweep. The first run happens after `initial_delay`,
/// then every `every` after that.
pub fn start_goal_sweep_scheduler(
    state: Arc<AppState>,
    initial_delay: Duration,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Goal sweep scheduler started ({}s interval, first run in {}s)",
            every.as_secs(),
            initial_delay.as_secs()
        );

        tokio::time::sleep(initial_delay).await;

        // First tick is immediate; a slow sweep delays the next one instead of bunching up.
        let mut sweep_interval = interval(every);
        sweep_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            sweep_interval.tick().await;
            run_scheduled_sweep(&state).await;
        }
    })
}

/// Runs a single sweep and logs the outcome. Failures are left for the next tick.
async fn run_scheduled_sweep(state: &AppState) {
    debug!("Running scheduled goal sweep...");

    match state.goal_progress_service.sweep_overdue_goals().await {
        Ok(report) if report.is_empty() => {
            debug!("Scheduled goal sweep found no overdue goals");
        }
        Ok(report) => {
            info!(
                "Scheduled goal sweep completed: {} expired {:?}, {} completed {:?}",
                report.expired_goal_ids.len(),
                report.expired_goal_ids,
                report.completed_goal_ids.len(),
                report.completed_goal_ids
            );
        }
        Err(e) if e.is_transient() => {
            warn!("Scheduled goal sweep failed, will retry next tick: {}", e);
        }
        Err(e) => {
            error!("Scheduled goal sweep failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bookshelf_core::errors::{DatabaseError, Error, Result};
    use bookshelf_core::goals::{Goal, GoalProgressServiceTrait, SweepReport};
    use bookshelf_core::ledger::{ProgressLedgerEntry, ReadingEntryStatus};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingService {
        sweeps: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl GoalProgressServiceTrait for CountingService {
        async fn on_book_completed(
            &self,
            _user_id: &str,
            _reading_entry_id: &str,
            _book_id: &str,
            _from_state: Option<ReadingEntryStatus>,
        ) -> Result<Vec<Goal>> {
            unimplemented!()
        }

        async fn on_book_uncompleted(
            &self,
            _user_id: &str,
            _reading_entry_id: &str,
        ) -> Result<Vec<Goal>> {
            unimplemented!()
        }

        async fn expire_overdue_goals(&self) -> Result<Vec<String>> {
            unimplemented!()
        }

        async fn sweep_overdue_goals(&self) -> Result<SweepReport> {
            self.sweeps.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Database(DatabaseError::Timeout(
                    "writer busy".to_string(),
                )));
            }
            Ok(SweepReport {
                expired_goal_ids: vec!["g1".to_string()],
                completed_goal_ids: vec![],
            })
        }

        fn get_goal(&self, _goal_id: &str) -> Result<Goal> {
            unimplemented!()
        }

        fn list_goals_for_user(&self, _user_id: &str) -> Result<Vec<Goal>> {
            unimplemented!()
        }

        fn list_progress_entries(&self, _goal_id: &str) -> Result<Vec<ProgressLedgerEntry>> {
            unimplemented!()
        }
    }

    fn state_with(fail: bool) -> (Arc<AppState>, Arc<CountingService>) {
        let service = Arc::new(CountingService {
            sweeps: AtomicUsize::new(0),
            fail,
        });
        let state = Arc::new(AppState {
            goal_progress_service: service.clone(),
            db_path: "unused.db".to_string(),
        });
        (state, service)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_initial_delay_then_sweeps_on_interval() {
        let (state, service) = state_with(false);
        let handle =
            start_goal_sweep_scheduler(state, Duration::from_secs(30), Duration::from_secs(60));
        settle().await;

        tokio::time::advance(Duration::from_secs(29)).await;
        settle().await;
        assert_eq!(service.sweeps.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(service.sweeps.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(service.sweeps.load(Ordering::SeqCst), 2);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_sweep_does_not_stop_the_scheduler() {
        let (state, service) = state_with(true);
        let handle = start_goal_sweep_scheduler(state, Duration::ZERO, Duration::from_secs(10));

        settle().await;
        assert_eq!(service.sweeps.load(Ordering::SeqCst), 1);

        for _ in 0..2 {
            tokio::time::advance(Duration::from_secs(10)).await;
            settle().await;
        }

        assert_eq!(service.sweeps.load(Ordering::SeqCst), 3);
        handle.abort();
    }
}
