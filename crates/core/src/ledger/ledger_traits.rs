use std::collections::BTreeSet;

use crate::errors::Result;
use crate::ledger::ledger_model::NewProgressLedgerEntry;

/// Ledger operations available inside one unit of work.
///
/// Every read observes the writes made earlier in the same unit of work.
pub trait ProgressLedger {
    /// Inserts an entry keyed on `(goal_id, reading_entry_id)`.
    ///
    /// Returns `false` when the key already exists. A duplicate is never an error.
    fn record_if_absent(&mut self, entry: NewProgressLedgerEntry) -> Result<bool>;

    /// Number of ledger entries currently recorded for the goal.
    fn count_for(&mut self, goal_id: &str) -> Result<i64>;

    /// Deletes every entry referencing the reading entry, across all goals and
    /// all users, and returns the ids of the goals that lost an entry.
    ///
    /// Callers must check ownership of the returned goals themselves.
    fn remove_by_reading_entry(&mut self, reading_entry_id: &str) -> Result<BTreeSet<String>>;
}
