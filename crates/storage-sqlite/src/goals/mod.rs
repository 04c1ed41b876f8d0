//! SQLite storage implementation for reading goals and their progress ledger.

mod model;
mod repository;

pub use model::{GoalProgressChangeset, ProgressLedgerEntryDB, ReadingGoalDB};
pub use repository::{GoalRepository, SqliteGoalUnitOfWork};
