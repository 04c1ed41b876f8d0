//! Bookshelf Core - reading goal domain entities, services, and traits.
//!
//! This crate contains the goal progress engine: the progress ledger model,
//! the goal status state machine, and the service that applies reading-entry
//! events. It is database-agnostic and defines traits that are implemented
//! by the `storage-sqlite` crate.

pub mod errors;
pub mod goals;
pub mod ledger;
pub mod utils;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
