//! HTTP client for the *arr queue API.
//!
//! All five supported applications share the same queue endpoints; only the
//! API version in the base URL differs, and that is resolved by
//! [`SourceInstance`]. HTTP and network errors map to
//! [`DomainError::Http`] / [`DomainError::Api`].

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use std::time::Duration;

use crate::adapters::retry::RetryPolicy;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{QueueItem, QueuePage, SourceInstance};
use crate::domain::ports::QueueClient;

/// Command that makes an *arr app re-read its download clients before the
/// queue is fetched.
const REFRESH_COMMAND: &str = "RefreshMonitoredDownloads";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Queue client shared by every configured source.
#[derive(Debug, Clone)]
pub struct ArrClient {
    http: Client,
    retry: RetryPolicy,
}

impl ArrClient {
    /// Create a client; `verify_tls = false` accepts self-signed certificates.
    pub fn new(verify_tls: bool, retry: RetryPolicy) -> DomainResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .map_err(|e| DomainError::Http {
                url: String::new(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { http, retry })
    }

    fn request(&self, method: Method, source: &SourceInstance, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", source.base_url, path))
            .header("X-Api-Key", &source.api_key)
    }

    async fn send(url: String, request: RequestBuilder) -> DomainResult<Response> {
        let resp = request.send().await.map_err(|e| DomainError::Http {
            url: url.clone(),
            message: e.to_string(),
        })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(DomainError::Api { url, status, body });
        }
        Ok(resp)
    }

    async fn get_page(
        &self,
        source: &SourceInstance,
        query: &[(&str, String)],
    ) -> DomainResult<QueuePage> {
        let url = &format!("{}/queue", source.base_url);
        self.retry
            .execute(move || async move {
                let request = self.request(Method::GET, source, "/queue").query(query);
                let resp = Self::send(url.clone(), request).await?;
                resp.json::<QueuePage>().await.map_err(|e| {
                    DomainError::SerializationError(format!("{url} returned an unreadable queue: {e}"))
                })
            })
            .await
    }

    async fn refresh_monitored_downloads(&self, source: &SourceInstance) -> DomainResult<()> {
        let request = self
            .request(Method::POST, source, "/command")
            .json(&serde_json::json!({ "name": REFRESH_COMMAND }));
        Self::send(format!("{}/command", source.base_url), request).await?;
        Ok(())
    }
}

#[async_trait]
impl QueueClient for ArrClient {
    async fn fetch_queue(&self, source: &SourceInstance) -> DomainResult<Option<Vec<QueueItem>>> {
        self.refresh_monitored_downloads(source).await?;

        let total = self.get_page(source, &[]).await?.total_records;
        if total == 0 {
            return Ok(Some(Vec::new()));
        }

        let page = self
            .get_page(
                source,
                &[("page", "1".to_string()), ("pageSize", total.to_string())],
            )
            .await?;
        tracing::debug!(
            source = source.name(),
            total_records = total,
            fetched = page.records.len(),
            "fetched queue"
        );
        Ok(Some(page.records))
    }

    async fn remove_queue_item(
        &self,
        source: &SourceInstance,
        queue_id: i64,
        remove_from_client: bool,
        add_to_blocklist: bool,
    ) -> DomainResult<()> {
        let path = format!("/queue/{queue_id}");
        let request = self.request(Method::DELETE, source, &path).query(&[
            ("removeFromClient", remove_from_client.to_string()),
            ("blocklist", add_to_blocklist.to_string()),
        ]);
        Self::send(format!("{}{}", source.base_url, path), request).await?;
        Ok(())
    }
}
