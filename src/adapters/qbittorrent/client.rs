//! HTTP client for the qBittorrent Web API v2.
//!
//! Authenticates with a session cookie (`SID`) obtained from `/auth/login`
//! and refreshes it once when a request is rejected with 403.

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::Mutex;

use super::models::{MainData, TorrentInfo, TorrentProperties};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::SourceInstance;
use crate::domain::ports::ExemptionProvider;

/// Body qBittorrent answers a rejected login with.
const LOGIN_FAILED_BODY: &str = "Fails.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// qBittorrent client providing exemption sets and connection status.
#[derive(Debug)]
pub struct QbitClient {
    http: Client,
    /// API base, e.g. `http://qbit:8080/api/v2`.
    base_url: String,
    username: String,
    password: String,
    protection_tag: String,
    detect_private: bool,
    session: Mutex<Option<Session>>,
}

impl QbitClient {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        protection_tag: impl Into<String>,
        detect_private: bool,
        verify_tls: bool,
    ) -> DomainResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .map_err(|e| DomainError::Http {
                url: String::new(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            protection_tag: protection_tag.into(),
            detect_private,
            session: Mutex::new(None),
        })
    }

    /// Log in and store the session cookie.
    pub async fn login(&self) -> DomainResult<()> {
        let url = format!("{}/auth/login", self.base_url);
        let resp = self
            .http
            .post(&url)
            .form(&[("username", &self.username), ("password", &self.password)])
            .send()
            .await
            .map_err(|e| DomainError::Http {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        let sid = resp
            .headers()
            .get_all(reqwest::header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(session_id);
        let body = resp.text().await.unwrap_or_default();

        if body.trim() == LOGIN_FAILED_BODY {
            return Err(DomainError::Authentication("invalid username or password".to_string()));
        }
        if !status.is_success() {
            return Err(DomainError::Api {
                url,
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(has_cookie = sid.is_some(), "qBittorrent session refreshed");
        *self.session.lock().await = Some(Session { sid });
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> DomainResult<T> {
        let url = format!("{}{}", self.base_url, path);

        if self.session.lock().await.is_none() {
            self.login().await?;
        }

        let mut refreshed = false;
        loop {
            let sid = self.session.lock().await.as_ref().and_then(|s| s.sid.clone());
            let mut request = self.http.request(Method::GET, &url).query(query);
            if let Some(sid) = sid {
                request = request.header(reqwest::header::COOKIE, format!("SID={sid}"));
            }

            let resp = request.send().await.map_err(|e| DomainError::Http {
                url: url.clone(),
                message: e.to_string(),
            })?;

            if resp.status() == StatusCode::FORBIDDEN && !refreshed {
                refreshed = true;
                self.login().await?;
                continue;
            }
            if !resp.status().is_success() {
                let status = resp.status().as_u16();
                let body = resp.text().await.unwrap_or_default();
                return Err(DomainError::Api { url, status, body });
            }

            return resp.json::<T>().await.map_err(|e| {
                DomainError::SerializationError(format!("{url} returned an unreadable body: {e}"))
            });
        }
    }

    async fn torrents(&self) -> DomainResult<Vec<TorrentInfo>> {
        self.get_json("/torrents/info", &[]).await
    }
}

/// A successful login. Localhost auth bypass logs in without handing out a cookie.
#[derive(Debug, Clone)]
struct Session {
    sid: Option<String>,
}

/// Extract the `SID` value from a `Set-Cookie` header.
fn session_id(set_cookie: &str) -> Option<String> {
    let pair = set_cookie.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    (name == "SID").then(|| value.to_string())
}

#[async_trait]
impl ExemptionProvider for QbitClient {
    async fn private_tracker_download_ids(&self, _source: &SourceInstance) -> DomainResult<HashSet<String>> {
        if !self.detect_private {
            return Ok(HashSet::new());
        }

        let mut private = HashSet::new();
        for torrent in self.torrents().await? {
            let props: TorrentProperties = self
                .get_json("/torrents/properties", &[("hash", torrent.hash.as_str())])
                .await?;
            if props.is_private.unwrap_or(false) {
                private.insert(torrent.download_id());
            }
        }
        Ok(private)
    }

    async fn protected_download_ids(&self, _source: &SourceInstance) -> DomainResult<HashSet<String>> {
        Ok(self
            .torrents()
            .await?
            .into_iter()
            .filter(|t| t.has_tag(&self.protection_tag))
            .map(|t| t.download_id())
            .collect())
    }

    async fn is_offline(&self) -> DomainResult<bool> {
        let main: MainData = self.get_json("/sync/maindata", &[]).await?;
        Ok(main.server_state.connection_status == "disconnected")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_from_set_cookie() {
        assert_eq!(
            session_id("SID=abc123; HttpOnly; SameSite=Strict; path=/").as_deref(),
            Some("abc123")
        );
        assert_eq!(session_id("QBT_OTHER=1; path=/"), None);
        assert_eq!(session_id("garbage"), None);
    }
}
