//! Adapters for external systems.

pub mod arr;
pub mod memory;
pub mod qbittorrent;
pub mod retry;
pub mod sqlite;

pub use arr::ArrClient;
pub use memory::InMemoryDefectLedger;
pub use qbittorrent::QbitClient;
pub use retry::RetryPolicy;
pub use sqlite::SqliteDefectLedger;
