//! Undo Module
//!
//! Records produced by mutating commands, the ledger that stacks them per
//! command, and the executor that plays them back.

pub mod executor;
pub mod ledger;
pub mod record;

pub use executor::UndoExecutor;
pub use ledger::{InMemoryLedger, JsonFileLedger, LedgerError, UndoLedger};
pub use record::{Journal, UndoAction, UndoBatch, UndoRecord};
