//! In-memory adapters, used when nothing has to survive a restart.

pub mod defect_ledger;

pub use defect_ledger::InMemoryDefectLedger;
