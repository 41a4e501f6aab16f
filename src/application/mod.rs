//! Application layer: the polling daemon and its wiring.

pub mod bootstrap;
pub mod sweep_daemon;

pub use bootstrap::{build_sweep_daemon, exemption_provider, open_defect_ledger};
pub use sweep_daemon::{CycleReport, DaemonHandle, EvaluationSummary, SweepDaemon, SweepDaemonConfig};
