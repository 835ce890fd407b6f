//! YouTube Data API catalog.
//!
//! Lists a channel's uploads playlist (`playlistItems.list`, 1 quota unit per
//! page) instead of `search.list` (100 units).

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::VideoCatalog;
use crate::domain::{SourceChannel, VideoRef};
use crate::errors::AppError;

const PLAYLIST_ITEMS_URL: &str = "https://www.googleapis.com/youtube/v3/playlistItems";
const PAGE_SIZE: &str = "50";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsResponse {
    next_page_token: Option<String>,
    #[serde(default)]
    items: Vec<PlaylistItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    snippet: Option<PlaylistItemSnippet>,
    content_details: PlaylistItemContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemSnippet {
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemContentDetails {
    video_id: String,
}

impl From<PlaylistItem> for VideoRef {
    fn from(item: PlaylistItem) -> Self {
        VideoRef::youtube(item.content_details.video_id, item.snippet.map(|s| s.title))
    }
}

pub struct YoutubeCatalog {
    http_client: Client,
    api_key: Option<Secret<String>>,
    max_pages: usize,
}

impl YoutubeCatalog {
    pub fn new(api_key: Option<Secret<String>>, max_pages: usize) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Unexpected(anyhow::Error::new(e).context("Failed to build HTTP client")))?;
        Ok(Self {
            http_client,
            api_key,
            max_pages: max_pages.max(1),
        })
    }

    async fn fetch_page(
        &self,
        api_key: &str,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<PlaylistItemsResponse, AppError> {
        let mut params = vec![
            ("part", "snippet,contentDetails"),
            ("playlistId", playlist_id),
            ("maxResults", PAGE_SIZE),
            ("key", api_key),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }
        let url = Url::parse_with_params(PLAYLIST_ITEMS_URL, &params).map_err(|e| {
            AppError::Unexpected(anyhow::Error::new(e).context("Invalid playlist URL"))
        })?;

        let response = self.http_client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(%status, playlist_id, "YouTube API error: {}", error_text);
            return Err(AppError::CatalogUnavailable(anyhow::anyhow!(
                "YouTube API returned {} for playlist {}",
                status,
                playlist_id
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl VideoCatalog for YoutubeCatalog {
    #[tracing::instrument(name = "List YouTube uploads", skip(self, source), fields(channel_id = %source.channel_id))]
    async fn list_candidate_videos(&self, source: &SourceChannel) -> Result<Vec<VideoRef>, AppError> {
        let Some(api_key) = self.api_key.as_ref() else {
            return Err(AppError::CatalogUnavailable(anyhow::anyhow!(
                "YOUTUBE_API_KEY is not configured"
            )));
        };
        let playlist_id = uploads_playlist_id(&source.channel_id);

        let mut videos = Vec::new();
        let mut page_token: Option<String> = None;
        for _ in 0..self.max_pages {
            let page = self
                .fetch_page(api_key.expose_secret(), &playlist_id, page_token.as_deref())
                .await?;
            videos.extend(page.items.into_iter().map(VideoRef::from));
            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        tracing::info!("Fetched {} candidate videos", videos.len());
        Ok(videos)
    }
}

/// Uploads playlist id of a channel: "UU" followed by the id without "UC".
pub fn uploads_playlist_id(channel_id: &str) -> String {
    match channel_id.strip_prefix("UC") {
        Some(rest) => format!("UU{}", rest),
        None => format!("UU{}", channel_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::source_channel;
    use crate::domain::ContentType;

    #[test]
    fn uploads_playlist_swaps_the_prefix() {
        assert_eq!(uploads_playlist_id("UCabc123"), "UUabc123");
        assert_eq!(uploads_playlist_id("abc123"), "UUabc123");
    }

    #[test]
    fn playlist_page_maps_to_short_urls() {
        let page: PlaylistItemsResponse = serde_json::from_str(
            r#"{
                "kind": "youtube#playlistItemListResponse",
                "nextPageToken": "CAUQAA",
                "items": [
                    {"snippet": {"title": "First"}, "contentDetails": {"videoId": "aaa"}},
                    {"contentDetails": {"videoId": "bbb"}}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(page.next_page_token.as_deref(), Some("CAUQAA"));
        let videos: Vec<VideoRef> = page.items.into_iter().map(VideoRef::from).collect();
        assert_eq!(videos[0].url, "https://www.youtube.com/shorts/aaa");
        assert_eq!(videos[0].title.as_deref(), Some("First"));
        assert_eq!(videos[1].video_id, "bbb");
        assert!(videos[1].title.is_none());
    }

    #[tokio::test]
    async fn missing_api_key_is_a_catalog_failure() {
        let catalog = YoutubeCatalog::new(None, 1).unwrap();
        let err = catalog
            .list_candidate_videos(&source_channel(ContentType::VaSansEdit))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "CatalogUnavailable");
    }
}
