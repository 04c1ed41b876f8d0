//! Database models for reading goals and the progress ledger.

use diesel::prelude::*;
use log::warn;

use bookshelf_core::goals::{Goal, GoalStatus};
use bookshelf_core::ledger::{NewProgressLedgerEntry, ProgressLedgerEntry, ReadingEntryStatus};

use crate::errors::StorageError;
use crate::utils::{format_timestamp, parse_timestamp};

/// Database model for reading goals
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::reading_goals)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReadingGoalDB {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub target_count: i64,
    pub progress_count: i64,
    pub bonus_count: i64,
    pub status: String,
    pub deadline_at_utc: String,
    pub timezone: Option<String>,
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// The fields the engine rewrites on every mutation.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::reading_goals)]
#[diesel(treat_none_as_null = true)]
pub struct GoalProgressChangeset {
    pub progress_count: i64,
    pub bonus_count: i64,
    pub status: String,
    pub completed_at: Option<String>,
    pub updated_at: String,
}

/// Database model for progress ledger entries
#[derive(
    Queryable, Identifiable, Insertable, Selectable, Associations, PartialEq, Debug, Clone,
)]
#[diesel(belongs_to(ReadingGoalDB, foreign_key = goal_id))]
#[diesel(table_name = crate::schema::goal_progress_ledger)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProgressLedgerEntryDB {
    pub id: String,
    pub goal_id: String,
    pub reading_entry_id: String,
    pub book_id: String,
    pub applied_at: String,
    pub applied_from_state: Option<String>,
}

// Conversion to domain models
impl TryFrom<ReadingGoalDB> for Goal {
    type Error = StorageError;

    fn try_from(db: ReadingGoalDB) -> Result<Self, Self::Error> {
        let status = db
            .status
            .parse::<GoalStatus>()
            .map_err(|e| StorageError::Decode(format!("goal {}: {}", db.id, e)))?;
        Ok(Self {
            status,
            deadline_at_utc: parse_timestamp(&db.deadline_at_utc)?,
            completed_at: db.completed_at.as_deref().map(parse_timestamp).transpose()?,
            created_at: parse_timestamp(&db.created_at)?,
            updated_at: parse_timestamp(&db.updated_at)?,
            id: db.id,
            user_id: db.user_id,
            name: db.name,
            target_count: db.target_count,
            progress_count: db.progress_count,
            bonus_count: db.bonus_count,
            timezone: db.timezone,
        })
    }
}

impl From<&Goal> for GoalProgressChangeset {
    fn from(goal: &Goal) -> Self {
        Self {
            progress_count: goal.progress_count,
            bonus_count: goal.bonus_count,
            status: goal.status.as_str().to_string(),
            completed_at: goal.completed_at.map(format_timestamp),
            updated_at: format_timestamp(goal.updated_at),
        }
    }
}

impl TryFrom<ProgressLedgerEntryDB> for ProgressLedgerEntry {
    type Error = StorageError;

    fn try_from(db: ProgressLedgerEntryDB) -> Result<Self, Self::Error> {
        // Informational only: an unrecognised value is dropped, not fatal.
        let applied_from_state = db.applied_from_state.as_deref().and_then(|s| {
            s.parse::<ReadingEntryStatus>()
                .map_err(|e| warn!("Ledger entry {}: {}", db.id, e))
                .ok()
        });
        Ok(Self {
            applied_at: parse_timestamp(&db.applied_at)?,
            applied_from_state,
            id: db.id,
            goal_id: db.goal_id,
            reading_entry_id: db.reading_entry_id,
            book_id: db.book_id,
        })
    }
}

impl ProgressLedgerEntryDB {
    pub fn from_new(id: String, entry: NewProgressLedgerEntry) -> Self {
        Self {
            id,
            goal_id: entry.goal_id,
            reading_entry_id: entry.reading_entry_id,
            book_id: entry.book_id,
            applied_at: format_timestamp(entry.applied_at),
            applied_from_state: entry.applied_from_state.map(|s| s.as_str().to_string()),
        }
    }
}

pub fn goals_from_db(rows: Vec<ReadingGoalDB>) -> Result<Vec<Goal>, StorageError> {
    rows.into_iter().map(Goal::try_from).collect()
}
