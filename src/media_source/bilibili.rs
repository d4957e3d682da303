//! Bilibili source implementation.

use super::{fetch_media, first_capture, MediaItem, MediaResult, MediaSource, SourceType};
use crate::downloader::{self, Downloader};
use crate::error::{Result, SummaristError};
use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;
use tracing::{info, instrument};

/// Bilibili video source.
pub struct BilibiliSource {
    downloader: Arc<dyn Downloader>,
    languages: Vec<String>,
    id_patterns: Vec<Regex>,
    uid_pattern: Regex,
}

impl BilibiliSource {
    pub fn new(downloader: Arc<dyn Downloader>, languages: Vec<String>) -> Self {
        let id_patterns = vec![
            Regex::new(r"bilibili\.com/video/([Bb][Vv][a-zA-Z0-9]+)").expect("Invalid regex"),
            // Short links
            Regex::new(r"b23\.tv/([a-zA-Z0-9]+)").expect("Invalid regex"),
        ];
        let uid_pattern = Regex::new(r"space\.bilibili\.com/(\d+)").expect("Invalid regex");

        Self {
            downloader,
            languages,
            id_patterns,
            uid_pattern,
        }
    }
}

#[async_trait]
impl MediaSource for BilibiliSource {
    fn source_type(&self) -> SourceType {
        SourceType::Bilibili
    }

    fn extract_id(&self, url: &str) -> Result<String> {
        first_capture(&self.id_patterns, url.trim()).ok_or_else(|| {
            SummaristError::InvalidUrl(format!("cannot extract a Bilibili video ID from {}", url))
        })
    }

    /// Lists an uploader's videos; `source_url` must be a `space.bilibili.com/<uid>` page.
    #[instrument(skip(self))]
    async fn list_items(&self, source_url: &str) -> Result<Vec<MediaItem>> {
        let uid = self
            .uid_pattern
            .captures(source_url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                SummaristError::InvalidUrl(format!("cannot extract a Bilibili UID from {}", source_url))
            })?;

        let space_url = format!("https://space.bilibili.com/{}", uid);
        let listing = downloader::list_entries(self.downloader.as_ref(), &space_url).await?;

        let items: Vec<MediaItem> = listing
            .entries
            .iter()
            .filter_map(|entry| {
                let bvid = entry["id"].as_str().filter(|id| !id.is_empty())?;
                Some(MediaItem::from_info(
                    bvid.to_string(),
                    format!("https://www.bilibili.com/video/{}", bvid),
                    entry,
                ))
            })
            .collect();

        info!("Listed {} videos for uploader {}", items.len(), uid);
        Ok(items)
    }

    async fn fetch_one(&self, url: &str) -> Result<MediaResult> {
        let id = self.extract_id(url)?;
        fetch_media(self.downloader.as_ref(), id, url, &self.languages).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::testing::FakeDownloader;

    fn source_with(downloader: FakeDownloader) -> BilibiliSource {
        BilibiliSource::new(Arc::new(downloader), vec!["zh-CN".to_string()])
    }

    #[test]
    fn test_extract_bvid() {
        let source = source_with(FakeDownloader::default());

        assert_eq!(
            source.extract_id("https://www.bilibili.com/video/BV1xx411c7mD").unwrap(),
            "BV1xx411c7mD"
        );
        assert_eq!(
            source.extract_id("https://www.bilibili.com/video/bv1xx411c7mD?p=2").unwrap(),
            "bv1xx411c7mD"
        );
        assert_eq!(source.extract_id("https://b23.tv/AbC123").unwrap(), "AbC123");
        assert!(matches!(
            source.extract_id("https://www.bilibili.com/anime"),
            Err(SummaristError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_list_requires_space_url() {
        let source = source_with(FakeDownloader::default());
        let err = source
            .list_items("https://www.bilibili.com/video/BV1xx411c7mD")
            .await
            .unwrap_err();
        assert!(matches!(err, SummaristError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_list_items_uses_canonical_space_url() {
        let downloader = Arc::new(FakeDownloader {
            listing: Some(r#"{"id": "BV1ab411c7mD", "title": "Clip", "channel": "UP"}"#.to_string()),
            ..FakeDownloader::default()
        });
        let source = BilibiliSource::new(downloader.clone(), vec![]);

        let items = source
            .list_items("https://space.bilibili.com/123456/video?tid=0")
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://www.bilibili.com/video/BV1ab411c7mD");

        let calls = downloader.calls.lock().unwrap();
        assert_eq!(calls[0].last().unwrap(), "https://space.bilibili.com/123456");
    }
}
