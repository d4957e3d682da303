//! YouTube source implementation.

use super::{fetch_media, first_capture, MediaItem, MediaResult, MediaSource, SourceType};
use crate::downloader::{self, Downloader};
use crate::error::{Result, SummaristError};
use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;
use tracing::{info, instrument};

/// YouTube video source.
pub struct YoutubeSource {
    downloader: Arc<dyn Downloader>,
    languages: Vec<String>,
    id_patterns: Vec<Regex>,
}

impl YoutubeSource {
    pub fn new(downloader: Arc<dyn Downloader>, languages: Vec<String>) -> Self {
        let id_patterns = vec![
            Regex::new(
                r"(?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/)([a-zA-Z0-9_-]{11})",
            )
            .expect("Invalid regex"),
            Regex::new(r"youtube\.com/shorts/([a-zA-Z0-9_-]{11})").expect("Invalid regex"),
        ];

        Self {
            downloader,
            languages,
            id_patterns,
        }
    }

    fn watch_url(video_id: &str) -> String {
        format!("https://www.youtube.com/watch?v={}", video_id)
    }
}

#[async_trait]
impl MediaSource for YoutubeSource {
    fn source_type(&self) -> SourceType {
        SourceType::YouTube
    }

    fn extract_id(&self, url: &str) -> Result<String> {
        first_capture(&self.id_patterns, url.trim()).ok_or_else(|| {
            SummaristError::InvalidUrl(format!("cannot extract a YouTube video ID from {}", url))
        })
    }

    #[instrument(skip(self))]
    async fn list_items(&self, source_url: &str) -> Result<Vec<MediaItem>> {
        let listing = downloader::list_entries(self.downloader.as_ref(), source_url).await?;

        let items: Vec<MediaItem> = listing
            .entries
            .iter()
            .filter_map(|entry| {
                let id = entry["id"].as_str().filter(|id| !id.is_empty())?;
                Some(MediaItem::from_info(id.to_string(), Self::watch_url(id), entry))
            })
            .collect();

        info!("Listed {} videos from {}", items.len(), source_url);
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

    fn source_with(downloader: FakeDownloader) -> YoutubeSource {
        YoutubeSource::new(Arc::new(downloader), vec!["en".to_string()])
    }

    #[test]
    fn test_extract_video_id() {
        let source = source_with(FakeDownloader::default());

        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?list=PL1&v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
        ] {
            assert_eq!(source.extract_id(url).unwrap(), "dQw4w9WgXcQ", "{url}");
        }

        assert!(matches!(
            source.extract_id("https://www.youtube.com/@somechannel"),
            Err(SummaristError::InvalidUrl(_))
        ));
        assert!(source.extract_id("").is_err());
    }

    #[test]
    fn test_extract_id_is_deterministic() {
        let source = source_with(FakeDownloader::default());
        let url = "https://youtu.be/abcDEF12345?t=30";
        assert_eq!(source.extract_id(url).unwrap(), source.extract_id(url).unwrap());
    }

    #[tokio::test]
    async fn test_list_items_skips_malformed_lines() {
        let listing = [
            r#"{"id": "aaaaaaaaaaa", "title": "First", "channel": "Chan", "duration": 120}"#,
            "garbage line",
            r#"{"id": "", "title": "No id"}"#,
            r#"{"id": "bbbbbbbbbbb", "title": "Second"}"#,
        ]
        .join("\n");
        let source = source_with(FakeDownloader {
            listing: Some(listing),
            ..FakeDownloader::default()
        });

        let items = source.list_items("https://www.youtube.com/@chan").await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "aaaaaaaaaaa");
        assert_eq!(items[0].url, "https://www.youtube.com/watch?v=aaaaaaaaaaa");
        assert_eq!(items[0].author, "Chan");
        assert_eq!(items[0].duration_seconds, Some(120));
        assert_eq!(items[1].title, "Second");
    }
}
