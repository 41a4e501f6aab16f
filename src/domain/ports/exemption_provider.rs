//! Exemption sets sourced from the torrent client.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::domain::errors::DomainResult;
use crate::domain::models::SourceInstance;

/// Port for the torrent client's view of downloads
#[async_trait]
pub trait ExemptionProvider: Send + Sync {
    /// Download ids of torrents from private trackers
    async fn private_tracker_download_ids(&self, source: &SourceInstance) -> DomainResult<HashSet<String>>;

    /// Download ids of torrents carrying the do-not-remove tag
    async fn protected_download_ids(&self, source: &SourceInstance) -> DomainResult<HashSet<String>>;

    /// Whether the torrent client has lost its connection; cycles are skipped while offline
    async fn is_offline(&self) -> DomainResult<bool>;
}

/// Provider used when no torrent client is configured: nothing is exempt
/// and the client is never offline.
#[derive(Debug, Clone, Default)]
pub struct NullExemptionProvider;

impl NullExemptionProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExemptionProvider for NullExemptionProvider {
    async fn private_tracker_download_ids(&self, _source: &SourceInstance) -> DomainResult<HashSet<String>> {
        Ok(HashSet::new())
    }

    async fn protected_download_ids(&self, _source: &SourceInstance) -> DomainResult<HashSet<String>> {
        Ok(HashSet::new())
    }

    async fn is_offline(&self) -> DomainResult<bool> {
        Ok(false)
    }
}
