//! Common test utilities for integration tests
//!
//! Provides shared fixtures, fake collaborators and helpers used across
//! multiple integration test files.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

use queue_sweeper::domain::errors::{DomainError, DomainResult};
use queue_sweeper::domain::models::{QueueItem, SourceInstance, SourceKind};
use queue_sweeper::domain::ports::{ExemptionProvider, QueueClient};

/// A Radarr instance at a fixed local address
pub fn radarr() -> SourceInstance {
    SourceInstance::new(SourceKind::Radarr, "http://radarr:7878", "radarr-key")
}

/// A Sonarr instance at a fixed local address
pub fn sonarr() -> SourceInstance {
    SourceInstance::new(SourceKind::Sonarr, "http://sonarr:8989", "sonarr-key")
}

/// A queue row reported as stalled by qBittorrent
pub fn stalled(id: i64, download_id: &str) -> QueueItem {
    QueueItem::new(id, download_id, format!("Release {download_id}"), "warning")
        .with_error_message("The download is stalled with no connections")
        .with_download_client("qBittorrent")
        .with_protocol("torrent")
}

/// A queue row the source marked as failed
pub fn failed(id: i64, download_id: &str) -> QueueItem {
    QueueItem::new(id, download_id, format!("Release {download_id}"), "failed")
        .with_download_client("qBittorrent")
}

/// One recorded `remove_queue_item` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalCall {
    pub source: String,
    pub queue_id: i64,
    pub remove_from_client: bool,
    pub add_to_blocklist: bool,
}

/// Queue client with scripted queues that records every removal
#[derive(Default)]
pub struct RecordingQueueClient {
    queues: Mutex<HashMap<String, Option<Vec<QueueItem>>>>,
    fail_fetch: Mutex<HashSet<String>>,
    fail_removal_ids: Mutex<HashSet<i64>>,
    removals: Mutex<Vec<RemovalCall>>,
}

impl RecordingQueueClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue returned for `source` until replaced
    pub fn set_queue(&self, source: &SourceInstance, queue: Vec<QueueItem>) {
        self.queues
            .lock()
            .unwrap()
            .insert(source.base_url.clone(), Some(queue));
    }

    /// Make fetches for `source` fail with a transport error
    pub fn fail_fetch(&self, source: &SourceInstance) {
        self.fail_fetch.lock().unwrap().insert(source.base_url.clone());
    }

    /// Make removal of `queue_id` fail with an API error
    pub fn fail_removal(&self, queue_id: i64) {
        self.fail_removal_ids.lock().unwrap().insert(queue_id);
    }

    pub fn removals(&self) -> Vec<RemovalCall> {
        self.removals.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueueClient for RecordingQueueClient {
    async fn fetch_queue(&self, source: &SourceInstance) -> DomainResult<Option<Vec<QueueItem>>> {
        if self.fail_fetch.lock().unwrap().contains(&source.base_url) {
            return Err(DomainError::Http {
                url: format!("{}/queue", source.base_url),
                message: "connection refused".to_string(),
            });
        }
        Ok(self
            .queues
            .lock()
            .unwrap()
            .get(&source.base_url)
            .cloned()
            .unwrap_or(Some(Vec::new())))
    }

    async fn remove_queue_item(
        &self,
        source: &SourceInstance,
        queue_id: i64,
        remove_from_client: bool,
        add_to_blocklist: bool,
    ) -> DomainResult<()> {
        self.removals.lock().unwrap().push(RemovalCall {
            source: source.name().to_string(),
            queue_id,
            remove_from_client,
            add_to_blocklist,
        });
        if self.fail_removal_ids.lock().unwrap().contains(&queue_id) {
            return Err(DomainError::Api {
                url: format!("{}/queue/{queue_id}", source.base_url),
                status: 500,
                body: "Internal Server Error".to_string(),
            });
        }
        Ok(())
    }
}

/// Exemption provider with fixed sets
#[derive(Default)]
pub struct StaticExemptions {
    pub private: HashSet<String>,
    pub protected: HashSet<String>,
    pub offline: bool,
}

impl StaticExemptions {
    pub fn new(private: &[&str], protected: &[&str]) -> Self {
        Self {
            private: private.iter().map(|s| (*s).to_string()).collect(),
            protected: protected.iter().map(|s| (*s).to_string()).collect(),
            offline: false,
        }
    }
}

#[async_trait]
impl ExemptionProvider for StaticExemptions {
    async fn private_tracker_download_ids(&self, _source: &SourceInstance) -> DomainResult<HashSet<String>> {
        Ok(self.private.clone())
    }

    async fn protected_download_ids(&self, _source: &SourceInstance) -> DomainResult<HashSet<String>> {
        Ok(self.protected.clone())
    }

    async fn is_offline(&self) -> DomainResult<bool> {
        Ok(self.offline)
    }
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Log output collected by [`capture_logs`]
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Route INFO and above on the current thread into a buffer until the guard drops
pub fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .finish();
    (logs, tracing::subscriber::set_default(subscriber))
}
