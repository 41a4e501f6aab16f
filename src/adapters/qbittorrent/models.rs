//! qBittorrent Web API response bodies (only the fields used).

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct TorrentInfo {
    pub hash: String,
    #[serde(default)]
    pub name: String,
    /// Comma-separated tags, e.g. `"Don't Kill, seeding"`.
    #[serde(default)]
    pub tags: String,
}

impl TorrentInfo {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.split(',').map(str::trim).any(|t| t == tag)
    }

    /// Hash in the upper-case form the *arr apps use as download id.
    pub fn download_id(&self) -> String {
        self.hash.to_uppercase()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TorrentProperties {
    #[serde(default)]
    pub is_private: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerState {
    #[serde(default)]
    pub connection_status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MainData {
    pub server_state: ServerState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_matching_is_exact_per_tag() {
        let torrent = TorrentInfo {
            hash: "abcdef".to_string(),
            name: "x".to_string(),
            tags: "Don't Kill, seeding".to_string(),
        };
        assert!(torrent.has_tag("Don't Kill"));
        assert!(torrent.has_tag("seeding"));
        assert!(!torrent.has_tag("Don't"));
        assert_eq!(torrent.download_id(), "ABCDEF");
    }

    #[test]
    fn test_properties_without_private_flag() {
        let props: TorrentProperties = serde_json::from_str(r#"{"save_path": "/dl"}"#).unwrap();
        assert_eq!(props.is_private, None);
    }
}
