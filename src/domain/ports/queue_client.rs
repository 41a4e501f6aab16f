use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{QueueItem, SourceInstance};

/// Port for the management applications' queue APIs
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Refresh and fetch the full download queue.
    ///
    /// `Ok(None)` means the application returned no data this cycle. The
    /// result is not normalized; delayed and ignored-client rows may be present.
    async fn fetch_queue(&self, source: &SourceInstance) -> DomainResult<Option<Vec<QueueItem>>>;

    /// Remove one queue row
    async fn remove_queue_item(
        &self,
        source: &SourceInstance,
        queue_id: i64,
        remove_from_client: bool,
        add_to_blocklist: bool,
    ) -> DomainResult<()>;
}
