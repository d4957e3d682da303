//! Xiaoyuzhou podcast source implementation.
//!
//! Listing goes through the downloader first and falls back to reading the
//! show's RSS feed directly when that yields nothing.

use super::{fetch_media, first_capture, parse_feed, FeedClient, MediaItem, MediaResult, MediaSource, SourceType};
use crate::downloader::{self, Downloader};
use crate::error::{Result, SummaristError};
use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Xiaoyuzhou podcast source.
pub struct XiaoyuzhouSource {
    downloader: Arc<dyn Downloader>,
    languages: Vec<String>,
    feeds: Arc<dyn FeedClient>,
    id_patterns: Vec<Regex>,
    episode_pattern: Regex,
}

impl XiaoyuzhouSource {
    pub fn new(
        downloader: Arc<dyn Downloader>,
        languages: Vec<String>,
        feeds: Arc<dyn FeedClient>,
    ) -> Self {
        // Episode IDs take precedence over show IDs.
        let id_patterns = vec![
            Regex::new(r"xiaoyuzhoufm\.com/episode/([a-zA-Z0-9]+)").expect("Invalid regex"),
            Regex::new(r"xiaoyuzhoufm\.com/podcast/([a-zA-Z0-9]+)").expect("Invalid regex"),
        ];

        let episode_pattern = Regex::new(r"episode/([a-zA-Z0-9]+)").expect("Invalid regex");

        Self {
            downloader,
            languages,
            feeds,
            id_patterns,
            episode_pattern,
        }
    }

    async fn list_with_downloader(&self, source_url: &str) -> Result<Vec<MediaItem>> {
        let listing = downloader::list_entries(self.downloader.as_ref(), source_url).await?;

        let items = listing
            .entries
            .iter()
            .filter_map(|entry| {
                let url = entry["url"]
                    .as_str()
                    .or_else(|| entry["webpage_url"].as_str())?;
                let id = self.episode_pattern.captures(url)?.get(1)?.as_str().to_string();
                Some(MediaItem::from_info(id, url.to_string(), entry))
            })
            .collect();

        Ok(items)
    }

    async fn list_from_feed(&self, feed_url: &str) -> Result<Vec<MediaItem>> {
        let xml = self.feeds.fetch(feed_url).await?;
        parse_feed(&xml)
    }
}

#[async_trait]
impl MediaSource for XiaoyuzhouSource {
    fn source_type(&self) -> SourceType {
        SourceType::Xiaoyuzhou
    }

    fn extract_id(&self, url: &str) -> Result<String> {
        first_capture(&self.id_patterns, url.trim()).ok_or_else(|| {
            SummaristError::InvalidUrl(format!("cannot extract a Xiaoyuzhou ID from {}", url))
        })
    }

    /// Lists episodes of a show. Never fails: both listing paths failing yields no items.
    #[instrument(skip(self))]
    async fn list_items(&self, source_url: &str) -> Result<Vec<MediaItem>> {
        match self.list_with_downloader(source_url).await {
            Ok(items) if !items.is_empty() => {
                info!("Listed {} episodes via downloader", items.len());
                return Ok(items);
            }
            Ok(_) => info!("Downloader listed no episodes, reading feed instead"),
            Err(e) => warn!("Downloader listing failed, reading feed instead: {}", e),
        }

        match self.list_from_feed(source_url).await {
            Ok(items) => {
                info!("Listed {} episodes from feed", items.len());
                Ok(items)
            }
            Err(e) => {
                warn!("Feed listing failed: {}", e);
                Ok(Vec::new())
            }
        }
    }

    async fn fetch_one(&self, url: &str) -> Result<MediaResult> {
        let id = self.extract_id(url)?;
        fetch_media(self.downloader.as_ref(), id, url, &self.languages).await
    }
}
