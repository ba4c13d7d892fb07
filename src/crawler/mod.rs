/// Channel crawler
///
/// Pages through the channel's video list once and incrementally fetches
/// details for videos that are not cached yet.

pub mod cache;
pub mod client;
pub mod models;

// Re-export main types
pub use cache::DetailCache;
pub use client::YouTubeClient;
pub use models::{ListItem, RawVideoItem, SearchPage, Snippet, Statistics};

use tracing::info;

use crate::artifacts::ArtifactStore;
use crate::config::MAX_DETAIL_BATCH;
use crate::Result;

pub struct Crawler {
    client: YouTubeClient,
    store: ArtifactStore,
    batch_size: usize,
}

impl Crawler {
    pub fn new(client: YouTubeClient, store: ArtifactStore) -> Self {
        let batch_size = client.config().detail_batch_size.clamp(1, MAX_DETAIL_BATCH);
        Self {
            client,
            store,
            batch_size,
        }
    }

    /// List the channel's videos then fetch any missing details
    pub async fn run(&self, channel_id: &str) -> Result<Vec<RawVideoItem>> {
        self.client.api_key()?;
        info!("🔍 Crawling channel {}", channel_id);

        let video_list = self.list_videos(channel_id).await?;
        let ids: Vec<String> = video_list
            .iter()
            .filter_map(ListItem::video_id)
            .map(str::to_string)
            .collect();
        self.fetch_details(&ids).await
    }

    /// Return the cached video list, or page through the search endpoint
    /// and cache the result.
    ///
    /// The cached list is a one-time snapshot: videos published after it was
    /// written are not picked up until the artifact is deleted.
    pub async fn list_videos(&self, channel_id: &str) -> Result<Vec<ListItem>> {
        let path = self.store.video_list_path();
        if let Some(video_list) = self.store.load_json::<Vec<ListItem>>(&path)? {
            info!("📚 Loaded {} videos from cached list (not refreshed)", video_list.len());
            return Ok(video_list);
        }

        let mut video_list = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.client.search_page(channel_id, page_token.as_deref()).await?;
            pages += 1;

            if page.items.is_empty() {
                break;
            }
            video_list.extend(page.items);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        self.store.save_json(&path, &video_list)?;
        info!("💾 Listed {} videos over {} pages", video_list.len(), pages);
        Ok(video_list)
    }

    /// Fetch details for ids absent from the detail cache, in batches.
    ///
    /// The merged cache is persisted after every successful batch, so a
    /// failure keeps the batches that completed before it.
    pub async fn fetch_details(&self, ids: &[String]) -> Result<Vec<RawVideoItem>> {
        let path = self.store.video_detail_list_path();
        let cached: Vec<RawVideoItem> = self.store.load_json(&path)?.unwrap_or_default();
        let mut cache = DetailCache::from_items(cached);

        let queue = cache.missing(ids.iter().map(String::as_str));
        if queue.is_empty() {
            info!("⏭️ Skip fetching video details: all {} cached", cache.len());
            return Ok(cache.into_items());
        }

        info!(
            "🌐 Fetching details for {} videos in batches of {}",
            queue.len(),
            self.batch_size
        );

        for batch in queue.chunks(self.batch_size) {
            let items = self.client.video_details(batch).await?;
            let added = cache.extend(items);
            self.store.save_json(&path, cache.items())?;
            info!("💾 Cached {} new video details ({} total)", added, cache.len());
        }

        Ok(cache.into_items())
    }
}
