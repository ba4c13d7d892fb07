/// YouTube Data API v3 endpoints used by the crawler
use tracing::debug;

use super::models::{RawVideoItem, SearchPage, VideoListResponse};
use crate::config::CrawlerConfig;
use crate::http::FetchClient;
use crate::{PipelineError, Result};

#[derive(Clone)]
pub struct YouTubeClient {
    fetch: FetchClient,
    config: CrawlerConfig,
}

impl YouTubeClient {
    pub fn new(fetch: FetchClient, config: CrawlerConfig) -> Self {
        Self { fetch, config }
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    pub fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| PipelineError::MissingPrecondition("API key is not specified".to_string()))
    }

    /// Fetch one page of the channel's videos, newest first
    pub async fn search_page(&self, channel_id: &str, page_token: Option<&str>) -> Result<SearchPage> {
        let mut params = vec![
            ("part", "snippet,id".to_string()),
            ("channelId", channel_id.to_string()),
            ("order", "date".to_string()),
            ("key", self.api_key()?.to_string()),
            ("maxResults", self.config.page_size.to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        let body = self.fetch.fetch(&self.config.search_url, &params).await?;
        let page: SearchPage = serde_json::from_slice(&body)?;
        debug!(
            "Search page returned {} items (next page: {})",
            page.items.len(),
            page.next_page_token.is_some()
        );
        Ok(page)
    }

    /// Fetch snippet and statistics for a single batch of ids
    pub async fn video_details(&self, ids: &[String]) -> Result<Vec<RawVideoItem>> {
        let params = [
            ("part", "snippet,statistics".to_string()),
            ("id", ids.join(",")),
            ("key", self.api_key()?.to_string()),
        ];

        let body = self.fetch.fetch(&self.config.videos_url, &params).await?;
        let response: VideoListResponse = serde_json::from_slice(&body)?;
        debug!("Detail batch of {} ids returned {} items", ids.len(), response.items.len());
        Ok(response.items)
    }
}
