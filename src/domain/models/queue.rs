use serde::{Deserialize, Serialize};

/// Queue status reported by the *arr apps for items held back by a delay profile.
pub const DELAYED_STATUS: &str = "delay";

/// A status message group attached to a queue row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMessage {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub messages: Vec<String>,
}

/// One row of a management application's download queue.
///
/// `id` identifies the queue row and changes across refreshes. `download_id`
/// identifies the torrent or release and is shared by every row that
/// belongs to it (multi-episode or multi-file releases produce several rows).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub id: i64,
    #[serde(default)]
    pub download_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_client: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracked_download_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracked_download_state: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status_messages: Vec<StatusMessage>,

    /// Human-readable explanations attached by a classifier, logged right
    /// before the item is removed.
    #[serde(skip)]
    pub removal_messages: Vec<String>,
}

impl QueueItem {
    /// Create a queue item with the identifying fields set and everything else empty.
    pub fn new(
        id: i64,
        download_id: impl Into<String>,
        title: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            id,
            download_id: download_id.into(),
            title: title.into(),
            status: status.into(),
            indexer: None,
            protocol: None,
            download_client: None,
            error_message: None,
            tracked_download_status: None,
            tracked_download_state: None,
            status_messages: Vec::new(),
            removal_messages: Vec::new(),
        }
    }

    pub fn with_download_client(mut self, client: impl Into<String>) -> Self {
        self.download_client = Some(client.into());
        self
    }

    pub fn with_indexer(mut self, indexer: impl Into<String>) -> Self {
        self.indexer = Some(indexer.into());
        self
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_tracked_download(
        mut self,
        status: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        self.tracked_download_status = Some(status.into());
        self.tracked_download_state = Some(state.into());
        self
    }

    pub fn with_status_message(
        mut self,
        title: impl Into<String>,
        messages: Vec<String>,
    ) -> Self {
        self.status_messages.push(StatusMessage {
            title: title.into(),
            messages,
        });
        self
    }

    pub fn is_delayed(&self) -> bool {
        self.status == DELAYED_STATUS
    }

    pub fn indexer_or_default(&self) -> &str {
        self.indexer.as_deref().unwrap_or("No indexer")
    }

    pub fn protocol_or_default(&self) -> &str {
        self.protocol.as_deref().unwrap_or("No protocol")
    }

    pub fn download_client_or_default(&self) -> &str {
        self.download_client.as_deref().unwrap_or("Unknown client")
    }
}

/// Page of queue records as returned by the *arr `queue` endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuePage {
    #[serde(default)]
    pub total_records: u64,
    #[serde(default)]
    pub records: Vec<QueueItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_arr_queue_record() {
        let json = r#"{
            "id": 1422,
            "downloadId": "A1B2C3",
            "title": "Some.Movie.2019.1080p",
            "status": "warning",
            "indexer": "Tracker (Prowlarr)",
            "protocol": "torrent",
            "downloadClient": "qBittorrent",
            "errorMessage": "The download is stalled with no connections",
            "trackedDownloadStatus": "warning",
            "trackedDownloadState": "downloading",
            "statusMessages": [{"title": "Some.Movie", "messages": ["stalled"]}],
            "sizeleft": 0
        }"#;

        let item: QueueItem = serde_json::from_str(json).expect("record should parse");
        assert_eq!(item.id, 1422);
        assert_eq!(item.download_id, "A1B2C3");
        assert_eq!(item.download_client.as_deref(), Some("qBittorrent"));
        assert_eq!(item.status_messages.len(), 1);
        assert!(item.removal_messages.is_empty());
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let item: QueueItem =
            serde_json::from_str(r#"{"id": 3, "downloadId": "X", "title": "T", "status": "delay"}"#)
                .expect("minimal record should parse");
        assert!(item.is_delayed());
        assert_eq!(item.indexer_or_default(), "No indexer");
        assert_eq!(item.protocol_or_default(), "No protocol");
        assert_eq!(item.download_client_or_default(), "Unknown client");
    }

    #[test]
    fn test_queue_page_defaults() {
        let page: QueuePage = serde_json::from_str(r#"{"totalRecords": 0}"#).expect("page");
        assert_eq!(page.total_records, 0);
        assert!(page.records.is_empty());
    }
}
