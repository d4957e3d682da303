//! RSS feed loading and parsing for podcast shows.

use super::MediaItem;
use crate::error::{Result, SummaristError};
use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::instrument;

static EPISODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"episode/([a-zA-Z0-9]+)").expect("valid regex"));

/// Fetches a feed document.
#[async_trait]
pub trait FeedClient: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Feed client over HTTP.
pub struct HttpFeedClient {
    client: reqwest::Client,
}

impl HttpFeedClient {
    const TIMEOUT_SECS: u64 = 30;

    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(Self::TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpFeedClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedClient for HttpFeedClient {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[derive(Debug, Default)]
struct FeedEntry {
    title: String,
    link: String,
    pub_date: String,
    duration: String,
    image: Option<String>,
}

fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn href(e: &BytesStart) -> Option<String> {
    e.try_get_attribute("href")
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

/// Route element text to the show title or the current episode.
fn assign_text(path: &[String], text: &str, show_title: &mut String, entry: Option<&mut FeedEntry>) {
    let [.., parent, name] = path else {
        return;
    };

    match (parent.as_str(), entry) {
        ("item", Some(entry)) => match name.as_str() {
            "title" => entry.title.push_str(text),
            "link" => entry.link.push_str(text),
            "pubDate" => entry.pub_date.push_str(text),
            "itunes:duration" => entry.duration.push_str(text),
            _ => {}
        },
        ("channel", _) if name == "title" => show_title.push_str(text),
        _ => {}
    }
}

/// Parse an RSS document into episodes.
///
/// Items whose link carries no `episode/<id>` segment are skipped.
pub fn parse_feed(xml: &str) -> Result<Vec<MediaItem>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut show_title = String::new();
    let mut current: Option<FeedEntry> = None;
    let mut entries: Vec<FeedEntry> = Vec::new();
    let mut saw_channel = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| SummaristError::Feed(e.to_string()))?;

        match event {
            Event::Start(e) => {
                let name = element_name(&e);
                match name.as_str() {
                    "channel" => saw_channel = true,
                    "item" => current = Some(FeedEntry::default()),
                    "itunes:image" => {
                        if let Some(entry) = current.as_mut() {
                            entry.image = href(&e);
                        }
                    }
                    _ => {}
                }
                path.push(name);
            }
            Event::Empty(e) => {
                if e.name().as_ref() == b"itunes:image" {
                    if let Some(entry) = current.as_mut() {
                        entry.image = href(&e);
                    }
                }
            }
            Event::End(e) => {
                if e.name().as_ref() == b"item" {
                    entries.extend(current.take());
                }
                path.pop();
            }
            Event::Text(t) => {
                let text = t
                    .unescape()
                    .map_err(|e| SummaristError::Feed(e.to_string()))?;
                assign_text(&path, &text, &mut show_title, current.as_mut());
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                assign_text(&path, &text, &mut show_title, current.as_mut());
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_channel {
        return Err(SummaristError::Feed("document has no RSS channel".to_string()));
    }

    let items = entries
        .into_iter()
        .filter_map(|entry| {
            let id = EPISODE_RE.captures(&entry.link)?.get(1)?.as_str().to_string();
            Some(MediaItem {
                id,
                title: entry.title.trim().to_string(),
                url: entry.link.trim().to_string(),
                published_at: entry.pub_date.trim().to_string(),
                author: show_title.trim().to_string(),
                duration_seconds: parse_duration(&entry.duration),
                thumbnail_url: entry.image,
            })
        })
        .collect();

    Ok(items)
}

/// Parse `SS`, `MM:SS` or `HH:MM:SS`.
fn parse_duration(value: &str) -> Option<u32> {
    let parts: Vec<u32> = value
        .trim()
        .split(':')
        .map(|p| p.trim().parse::<u32>())
        .collect::<std::result::Result<_, _>>()
        .ok()?;

    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    Some(parts.iter().fold(0, |acc, p| acc * 60 + p))
}
