//! Media source abstraction for Summarist.
//!
//! Provides a trait-based interface over the supported platforms (YouTube,
//! Bilibili, Xiaoyuzhou) that normalizes them into one media model.

mod bilibili;
mod feed;
mod xiaoyuzhou;
mod youtube;

pub use bilibili::BilibiliSource;
pub use feed::{parse_feed, FeedClient, HttpFeedClient};
pub use xiaoyuzhou::XiaoyuzhouSource;
pub use youtube::YoutubeSource;

use crate::downloader::{self, Downloader};
use crate::error::{Result, SummaristError};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{info, instrument, warn};

/// Supported platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    YouTube,
    Xiaoyuzhou,
    Bilibili,
}

impl SourceType {
    pub const ALL: [SourceType; 3] = [SourceType::YouTube, SourceType::Xiaoyuzhou, SourceType::Bilibili];

    /// Stable identifier used in config files and the processed set.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::YouTube => "youtube",
            SourceType::Xiaoyuzhou => "xiaoyuzhou",
            SourceType::Bilibili => "bilibili",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceType {
    type Err = SummaristError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        SourceType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SummaristError::UnsupportedSource(s.to_string()))
    }
}

/// Determine the platform of a URL from its text alone.
///
/// Checked in priority order: YouTube, Xiaoyuzhou, Bilibili.
pub fn classify_source(url: &str) -> Result<SourceType> {
    let lower = url.to_lowercase();
    if lower.contains("youtube.com") || lower.contains("youtu.be") {
        Ok(SourceType::YouTube)
    } else if lower.contains("xiaoyuzhou") {
        Ok(SourceType::Xiaoyuzhou)
    } else if lower.contains("bilibili.com") || lower.contains("b23.tv") {
        Ok(SourceType::Bilibili)
    } else {
        Err(SummaristError::UnsupportedSource(url.to_string()))
    }
}

/// One fetched video or episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Platform-scoped identifier, derived from the URL.
    pub id: String,
    /// Original title.
    pub title: String,
    /// Canonical playable link.
    pub url: String,
    /// Publication date as reported by the platform (not guaranteed parseable).
    pub published_at: String,
    /// Channel, uploader or show name.
    pub author: String,
    /// Duration in seconds (if known).
    pub duration_seconds: Option<u32>,
    /// Thumbnail URL (if available).
    pub thumbnail_url: Option<String>,
}

impl MediaItem {
    /// Build an item from a yt-dlp JSON document.
    pub(crate) fn from_info(id: String, url: String, info: &serde_json::Value) -> Self {
        Self {
            id,
            url,
            title: json_str(info, "title").unwrap_or_default(),
            published_at: json_str(info, "upload_date").unwrap_or_default(),
            author: json_str(info, "channel")
                .or_else(|| json_str(info, "uploader"))
                .unwrap_or_default(),
            duration_seconds: info["duration"].as_f64().map(|d| d as u32),
            thumbnail_url: json_str(info, "thumbnail"),
        }
    }
}

fn json_str(info: &serde_json::Value, key: &str) -> Option<String> {
    info[key]
        .as_str()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// A downloaded cover image.
///
/// The image lives in a private temporary directory that is removed when
/// this value is dropped.
#[derive(Debug)]
pub struct CoverImage {
    path: PathBuf,
    _dir: TempDir,
}

impl CoverImage {
    pub fn new(path: PathBuf, dir: TempDir) -> Self {
        Self { path, _dir: dir }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The outcome of fetching one item.
#[derive(Debug)]
pub struct MediaResult {
    pub media: MediaItem,
    /// Plain-text transcript, empty when no subtitles were available.
    pub transcript: String,
    pub cover: Option<CoverImage>,
}

impl MediaResult {
    pub fn cover_path(&self) -> Option<&Path> {
        self.cover.as_ref().map(CoverImage::path)
    }
}

/// Trait for platform fetchers.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Get the source type.
    fn source_type(&self) -> SourceType;

    /// Constant identifier for this source.
    fn source_name(&self) -> &'static str {
        self.source_type().as_str()
    }

    /// Extract the item ID from a URL.
    fn extract_id(&self, url: &str) -> Result<String>;

    /// List items from a channel, uploader or show.
    async fn list_items(&self, source_url: &str) -> Result<Vec<MediaItem>>;

    /// Fetch one item's metadata, cover and transcript.
    async fn fetch_one(&self, url: &str) -> Result<MediaResult>;
}

/// Return the first capture group of the first matching pattern.
pub(crate) fn first_capture(patterns: &[Regex], input: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(input))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Shared fetch sequence: metadata, then cover, then transcript.
///
/// Only the metadata lookup can fail the fetch.
#[instrument(skip(downloader, languages))]
pub(crate) async fn fetch_media(
    downloader: &dyn Downloader,
    id: String,
    url: &str,
    languages: &[String],
) -> Result<MediaResult> {
    let info = downloader::fetch_info(downloader, url).await?;
    let media = MediaItem::from_info(id, url.to_string(), &info);
    info!("Fetched metadata for '{}'", media.title);

    let cover = match media.thumbnail_url {
        Some(_) => fetch_cover(downloader, url).await,
        None => None,
    };

    let transcript = downloader::download_transcript(downloader, url, languages).await;

    Ok(MediaResult {
        media,
        transcript,
        cover,
    })
}

async fn fetch_cover(downloader: &dyn Downloader, url: &str) -> Option<CoverImage> {
    let dir = match tempfile::Builder::new().prefix("summarist-cover-").tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            warn!("Failed to create cover directory: {}", e);
            return None;
        }
    };

    downloader::download_cover(downloader, url, dir.path())
        .await
        .map(|path| CoverImage::new(path, dir))
}

/// The set of fetchers, one per platform.
#[derive(Clone)]
pub struct SourceRegistry {
    sources: HashMap<SourceType, Arc<dyn MediaSource>>,
}

impl SourceRegistry {
    /// Build the standard fetchers around one downloader.
    pub fn new(downloader: Arc<dyn Downloader>, languages: Vec<String>) -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(YoutubeSource::new(downloader.clone(), languages.clone())));
        registry.register(Arc::new(BilibiliSource::new(downloader.clone(), languages.clone())));
        registry.register(Arc::new(XiaoyuzhouSource::new(
            downloader,
            languages,
            Arc::new(HttpFeedClient::new()),
        )));
        registry
    }

    pub fn empty() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    /// Add or replace the fetcher for its source type.
    pub fn register(&mut self, source: Arc<dyn MediaSource>) {
        self.sources.insert(source.source_type(), source);
    }

    pub fn get(&self, source_type: SourceType) -> Result<Arc<dyn MediaSource>> {
        self.sources
            .get(&source_type)
            .cloned()
            .ok_or_else(|| SummaristError::UnsupportedSource(source_type.to_string()))
    }
}
