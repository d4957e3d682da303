//! Archive folders for summarized items.
//!
//! Each item gets `<title>_<id>/` under the output root, holding
//! `metadata.json`, `transcript.md`, `summary.md` and, when a cover was
//! downloaded, `cover.jpg`.

use crate::error::{Result, SummaristError};
use crate::media_source::{MediaItem, SourceType};
use crate::summarizer::{Guest, SummaryResult};
use chrono::{Local, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

const MAX_TITLE_CHARS: usize = 100;

/// Persists one processed item and returns the folder it wrote.
pub trait Archiver: Send + Sync {
    fn archive(
        &self,
        source_type: SourceType,
        media: &MediaItem,
        transcript: &str,
        summary: &SummaryResult,
        cover: Option<&Path>,
    ) -> Result<PathBuf>;
}

#[derive(Debug, Serialize)]
struct Metadata<'a> {
    title: &'a str,
    summary_title: &'a str,
    source: SourceType,
    source_url: &'a str,
    video_id: &'a str,
    published_at: &'a str,
    author: &'a str,
    duration: Option<u32>,
    thumbnail: Option<&'a str>,
    core_points: &'a [String],
    insights: &'a [String],
    quotes: &'a [String],
    guests: &'a [Guest],
    created_at: String,
}

/// Writes Markdown and JSON files into per-item folders.
pub struct MarkdownArchiver {
    root: PathBuf,
}

impl MarkdownArchiver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder for an item: sanitized title, then the ID.
    pub fn folder_for(&self, media: &MediaItem) -> PathBuf {
        self.root
            .join(format!("{}_{}", sanitize_filename(&media.title), media.id))
    }

    fn write_files(
        &self,
        dir: &Path,
        source_type: SourceType,
        media: &MediaItem,
        transcript: &str,
        summary: &SummaryResult,
    ) -> Result<()> {
        std::fs::create_dir_all(dir)?;

        let metadata = Metadata {
            title: &media.title,
            summary_title: &summary.title,
            source: source_type,
            source_url: &media.url,
            video_id: &media.id,
            published_at: &media.published_at,
            author: &media.author,
            duration: media.duration_seconds,
            thumbnail: media.thumbnail_url.as_deref(),
            core_points: &summary.core_points,
            insights: &summary.insights,
            quotes: &summary.quotes,
            guests: &summary.guests,
            created_at: Utc::now().to_rfc3339(),
        };
        std::fs::write(dir.join("metadata.json"), serde_json::to_string_pretty(&metadata)?)?;
        std::fs::write(dir.join("transcript.md"), render_transcript(media, transcript))?;
        std::fs::write(dir.join("summary.md"), render_summary(media, summary))?;
        Ok(())
    }
}

impl Archiver for MarkdownArchiver {
    #[instrument(skip_all, fields(id = %media.id))]
    fn archive(
        &self,
        source_type: SourceType,
        media: &MediaItem,
        transcript: &str,
        summary: &SummaryResult,
        cover: Option<&Path>,
    ) -> Result<PathBuf> {
        let dir = self.folder_for(media);

        self.write_files(&dir, source_type, media, transcript, summary)
            .map_err(|e| SummaristError::Archive(format!("{}: {}", dir.display(), e)))?;

        if let Some(cover) = cover {
            if let Err(e) = std::fs::copy(cover, dir.join("cover.jpg")) {
                warn!("Failed to copy cover image: {}", e);
            }
        }

        info!("Archived to {}", dir.display());
        Ok(dir)
    }
}

/// Replace characters that are invalid in file names and cap the length.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .take(MAX_TITLE_CHARS)
        .collect()
}

fn render_transcript(media: &MediaItem, transcript: &str) -> String {
    format!(
        "# {title}\n\n\
         **Original title**: {title}\n\
         **Author**: {author}\n\
         **Published**: {published}\n\
         **Link**: {url}\n\n\
         ---\n\n\
         ## Transcript\n\n\
         {transcript}\n",
        title = media.title,
        author = media.author,
        published = media.published_at,
        url = media.url,
        transcript = transcript,
    )
}

fn render_summary(media: &MediaItem, summary: &SummaryResult) -> String {
    let mut out = String::new();
    let heading = if summary.title.is_empty() {
        &media.title
    } else {
        &summary.title
    };

    let _ = writeln!(out, "# {}\n", heading);
    let _ = writeln!(out, "**Original title**: {}", media.title);
    let _ = writeln!(out, "**Author**: {}", media.author);
    let _ = writeln!(out, "**Published**: {}\n", media.published_at);
    out.push_str("---\n");

    if !summary.core_points.is_empty() {
        out.push_str("\n## Core Points\n\n");
        for (i, point) in summary.core_points.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, point);
        }
    }

    if !summary.insights.is_empty() {
        out.push_str("\n## Insights\n\n");
        for (i, insight) in summary.insights.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, insight);
        }
    }

    if !summary.quotes.is_empty() {
        out.push_str("\n## Quotes\n\n");
        for quote in &summary.quotes {
            let _ = writeln!(out, "- **{}**", quote);
        }
    }

    if !summary.guests.is_empty() {
        out.push_str("\n## Guests\n\n");
        for guest in &summary.guests {
            match guest {
                Guest::Name(name) => {
                    let _ = writeln!(out, "- {}", name);
                }
                Guest::Profile { name, role, views } => {
                    let _ = writeln!(
                        out,
                        "- {} | {}",
                        name.as_deref().unwrap_or_default(),
                        role.as_deref().unwrap_or_default()
                    );
                    if let Some(views) = views.as_deref().filter(|v| !v.is_empty()) {
                        let _ = writeln!(out, "  - {}", views);
                    }
                }
            }
        }
    }

    let _ = write!(
        out,
        "\n---\n\n## Summary\n\n{}\n\n---\n\n*Generated by Summarist at {}*\n",
        summary.summary,
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    out
}
