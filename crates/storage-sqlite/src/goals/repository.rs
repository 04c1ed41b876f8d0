use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use uuid::Uuid;

use bookshelf_core::errors::{DatabaseError, Error};
use bookshelf_core::goals::{
    Goal, GoalRepositoryTrait, GoalStatus, GoalUnitOfWork, GoalWork, NewReadingGoal,
};
use bookshelf_core::ledger::{NewProgressLedgerEntry, ProgressLedger, ProgressLedgerEntry};
use bookshelf_core::Result;

use super::model::{goals_from_db, GoalProgressChangeset, ProgressLedgerEntryDB, ReadingGoalDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::{goal_progress_ledger, reading_goals};
use crate::utils::format_timestamp;

fn status_texts(statuses: &[GoalStatus]) -> Vec<&'static str> {
    statuses.iter().map(GoalStatus::as_str).collect()
}

/// Goal and ledger operations bound to the connection of one open transaction.
pub struct SqliteGoalUnitOfWork<'a> {
    conn: &'a mut SqliteConnection,
}

impl<'a> SqliteGoalUnitOfWork<'a> {
    pub fn new(conn: &'a mut SqliteConnection) -> Self {
        Self { conn }
    }
}

impl ProgressLedger for SqliteGoalUnitOfWork<'_> {
    fn record_if_absent(&mut self, entry: NewProgressLedgerEntry) -> Result<bool> {
        let row = ProgressLedgerEntryDB::from_new(Uuid::now_v7().to_string(), entry);

        let inserted = diesel::insert_into(goal_progress_ledger::table)
            .values(&row)
            .on_conflict((
                goal_progress_ledger::goal_id,
                goal_progress_ledger::reading_entry_id,
            ))
            .do_nothing()
            .execute(&mut *self.conn)
            .into_core()?;

        Ok(inserted > 0)
    }

    fn count_for(&mut self, goal_id: &str) -> Result<i64> {
        goal_progress_ledger::table
            .filter(goal_progress_ledger::goal_id.eq(goal_id))
            .count()
            .get_result::<i64>(&mut *self.conn)
            .into_core()
    }

    fn remove_by_reading_entry(&mut self, reading_entry_id: &str) -> Result<BTreeSet<String>> {
        let affected = diesel::delete(
            goal_progress_ledger::table
                .filter(goal_progress_ledger::reading_entry_id.eq(reading_entry_id)),
        )
        .returning(goal_progress_ledger::goal_id)
        .get_results::<String>(&mut *self.conn)
        .into_core()?;

        Ok(affected.into_iter().collect())
    }
}

impl GoalUnitOfWork for SqliteGoalUnitOfWork<'_> {
    fn load_goals_for_user(
        &mut self,
        user_id: &str,
        statuses: &[GoalStatus],
    ) -> Result<Vec<Goal>> {
        let rows = reading_goals::table
            .filter(reading_goals::user_id.eq(user_id))
            .filter(reading_goals::status.eq_any(status_texts(statuses)))
            .order((reading_goals::created_at.asc(), reading_goals::id.asc()))
            .select(ReadingGoalDB::as_select())
            .load::<ReadingGoalDB>(&mut *self.conn)
            .into_core()?;
        goals_from_db(rows).into_core()
    }

    fn load_goals_for_reading_entry(
        &mut self,
        user_id: &str,
        reading_entry_id: &str,
    ) -> Result<Vec<Goal>> {
        let counted_goal_ids = goal_progress_ledger::table
            .filter(goal_progress_ledger::reading_entry_id.eq(reading_entry_id))
            .select(goal_progress_ledger::goal_id);

        let rows = reading_goals::table
            .filter(reading_goals::user_id.eq(user_id))
            .filter(reading_goals::id.eq_any(counted_goal_ids))
            .order((reading_goals::created_at.asc(), reading_goals::id.asc()))
            .select(ReadingGoalDB::as_select())
            .load::<ReadingGoalDB>(&mut *self.conn)
            .into_core()?;
        goals_from_db(rows).into_core()
    }

    fn load_overdue_active_goals(&mut self, now: DateTime<Utc>) -> Result<Vec<Goal>> {
        let rows = reading_goals::table
            .filter(reading_goals::status.eq(GoalStatus::Active.as_str()))
            .filter(reading_goals::deadline_at_utc.lt(format_timestamp(now)))
            .order((reading_goals::created_at.asc(), reading_goals::id.asc()))
            .select(ReadingGoalDB::as_select())
            .load::<ReadingGoalDB>(&mut *self.conn)
            .into_core()?;
        goals_from_db(rows).into_core()
    }

    fn save_goal(&mut self, goal: &Goal) -> Result<()> {
        let changes = GoalProgressChangeset::from(goal);
        let updated = diesel::update(reading_goals::table.find(&goal.id))
            .set(&changes)
            .execute(&mut *self.conn)
            .into_core()?;

        if updated == 0 {
            return Err(Error::Database(DatabaseError::NotFound(format!(
                "Goal {} not found",
                goal.id
            ))));
        }
        Ok(())
    }
}

pub struct GoalRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl GoalRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        GoalRepository { pool, writer }
    }
}

#[async_trait]
impl GoalRepositoryTrait for GoalRepository {
    async fn run_unit_of_work(
        &self,
        work: GoalWork,
        timeout: Option<Duration>,
    ) -> Result<Vec<Goal>> {
        self.writer
            .exec_with_timeout(
                move |conn: &mut SqliteConnection| -> Result<Vec<Goal>> {
                    let mut uow = SqliteGoalUnitOfWork::new(conn);
                    work(&mut uow)
                },
                timeout,
            )
            .await
    }

    async fn insert_goal(&self, new_goal: NewReadingGoal) -> Result<Goal> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Goal> {
                let created_at = format_timestamp(new_goal.created_at.unwrap_or_else(Utc::now));
                let row = ReadingGoalDB {
                    id: new_goal
                        .id
                        .unwrap_or_else(|| Uuid::now_v7().to_string()),
                    user_id: new_goal.user_id,
                    name: new_goal.name,
                    target_count: new_goal.target_count,
                    progress_count: 0,
                    bonus_count: 0,
                    status: GoalStatus::Active.as_str().to_string(),
                    deadline_at_utc: format_timestamp(new_goal.deadline_at_utc),
                    timezone: new_goal.timezone,
                    completed_at: None,
                    created_at: created_at.clone(),
                    updated_at: created_at,
                };

                let result_db = diesel::insert_into(reading_goals::table)
                    .values(&row)
                    .returning(ReadingGoalDB::as_returning())
                    .get_result(conn)
                    .into_core()?;
                Goal::try_from(result_db).into_core()
            })
            .await
    }

    fn get_goal(&self, goal_id: &str) -> Result<Goal> {
        let mut conn = get_connection(&self.pool)?;
        let row = reading_goals::table
            .find(goal_id)
            .select(ReadingGoalDB::as_select())
            .first::<ReadingGoalDB>(&mut conn)
            .optional()
            .into_core()?
            .ok_or_else(|| {
                Error::Database(DatabaseError::NotFound(format!("Goal {} not found", goal_id)))
            })?;
        Goal::try_from(row).into_core()
    }

    fn list_goals_for_user(&self, user_id: &str) -> Result<Vec<Goal>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = reading_goals::table
            .filter(reading_goals::user_id.eq(user_id))
            .order((reading_goals::created_at.asc(), reading_goals::id.asc()))
            .select(ReadingGoalDB::as_select())
            .load::<ReadingGoalDB>(&mut conn)
            .into_core()?;
        goals_from_db(rows).into_core()
    }

    fn list_progress_entries(&self, goal_id: &str) -> Result<Vec<ProgressLedgerEntry>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = goal_progress_ledger::table
            .filter(goal_progress_ledger::goal_id.eq(goal_id))
            .order((
                goal_progress_ledger::applied_at.asc(),
                goal_progress_ledger::id.asc(),
            ))
            .select(ProgressLedgerEntryDB::as_select())
            .load::<ProgressLedgerEntryDB>(&mut conn)
            .into_core()?;
        rows.into_iter()
            .map(ProgressLedgerEntry::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()
            .into_core()
    }
}
