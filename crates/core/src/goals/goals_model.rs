//! Reading goal domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, ValidationError};

/// Lifecycle status of a reading goal.
///
/// `Completed` is soft-terminal (it can revert to `Active` when a counted book
/// is uncompleted). `Expired` is hard-terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    Active,
    Completed,
    Expired,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "ACTIVE",
            GoalStatus::Completed => "COMPLETED",
            GoalStatus::Expired => "EXPIRED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GoalStatus::Completed | GoalStatus::Expired)
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(GoalStatus::Active),
            "COMPLETED" => Ok(GoalStatus::Completed),
            "EXPIRED" => Ok(GoalStatus::Expired),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown goal status: {}",
                other
            )))),
        }
    }
}

/// Domain model representing a reader's goal of finishing N books by a deadline.
///
/// `progress_count` and `bonus_count` are derived from the progress ledger and
/// are only ever written with freshly recomputed values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub target_count: i64,
    pub progress_count: i64,
    pub bonus_count: i64,
    pub status: GoalStatus,
    pub deadline_at_utc: DateTime<Utc>,
    /// Display timezone label. Never used for comparisons.
    pub timezone: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    /// Books still needed to reach the target.
    pub fn remaining(&self) -> i64 {
        (self.target_count - self.progress_count).max(0)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Input model for creating a goal.
///
/// Creation rules live with goal management; the store accepts this as-is and
/// starts the goal `Active` with zero progress.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewReadingGoal {
    pub id: Option<String>,
    pub user_id: String,
    pub name: String,
    pub target_count: i64,
    pub deadline_at_utc: DateTime<Utc>,
    pub timezone: Option<String>,
    /// Defaults to the insertion time when absent.
    pub created_at: Option<DateTime<Utc>>,
}

/// Outcome of the transition rule for one goal snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionDecision {
    pub should_update: bool,
    pub new_status: GoalStatus,
    pub new_completed_at: Option<DateTime<Utc>>,
}

impl TransitionDecision {
    /// A decision that leaves `status`/`completed_at` as they are.
    pub fn unchanged(goal: &Goal) -> Self {
        Self {
            should_update: false,
            new_status: goal.status,
            new_completed_at: goal.completed_at,
        }
    }

    /// Writes the decided status onto the goal when the decision asks for it.
    pub fn apply_to(&self, goal: &mut Goal) {
        if self.should_update {
            goal.status = self.new_status;
            goal.completed_at = self.new_completed_at;
        }
    }
}

/// Result of one overdue-goal sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub expired_goal_ids: Vec<String>,
    /// Overdue goals that already met their target and were completed instead.
    pub completed_goal_ids: Vec<String>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.expired_goal_ids.is_empty() && self.completed_goal_ids.is_empty()
    }
}
