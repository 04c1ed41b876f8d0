//! Progress ledger domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, ValidationError};

/// Status of a reading entry at the moment it was counted toward a goal.
///
/// Informational only; the engine never branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadingEntryStatus {
    ToRead,
    Reading,
    Finished,
}

impl ReadingEntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingEntryStatus::ToRead => "TO_READ",
            ReadingEntryStatus::Reading => "READING",
            ReadingEntryStatus::Finished => "FINISHED",
        }
    }
}

impl fmt::Display for ReadingEntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadingEntryStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TO_READ" => Ok(ReadingEntryStatus::ToRead),
            "READING" => Ok(ReadingEntryStatus::Reading),
            "FINISHED" => Ok(ReadingEntryStatus::Finished),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown reading entry status: {}",
                other
            )))),
        }
    }
}

/// A fact recording that one reading entry has been counted toward one goal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressLedgerEntry {
    pub id: String,
    pub goal_id: String,
    pub reading_entry_id: String,
    pub book_id: String,
    pub applied_at: DateTime<Utc>,
    pub applied_from_state: Option<ReadingEntryStatus>,
}

/// Input model for recording a ledger entry. The store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewProgressLedgerEntry {
    pub goal_id: String,
    pub reading_entry_id: String,
    pub book_id: String,
    pub applied_at: DateTime<Utc>,
    pub applied_from_state: Option<ReadingEntryStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_entry_status_round_trips_through_text() {
        for status in [
            ReadingEntryStatus::ToRead,
            ReadingEntryStatus::Reading,
            ReadingEntryStatus::Finished,
        ] {
            assert_eq!(status.as_str().parse::<ReadingEntryStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_reading_entry_status_rejects_unknown() {
        assert!("DNF".parse::<ReadingEntryStatus>().is_err());
    }

    #[test]
    fn test_reading_entry_status_serde_matches_storage_text() {
        assert_eq!(
            serde_json::to_string(&ReadingEntryStatus::ToRead).unwrap(),
            "\"TO_READ\""
        );
    }
}
