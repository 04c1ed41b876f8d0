//! Progress ledger - "reading entry counted toward goal" facts.

mod ledger_model;
mod ledger_traits;

pub use ledger_model::{NewProgressLedgerEntry, ProgressLedgerEntry, ReadingEntryStatus};
pub use ledger_traits::ProgressLedger;
