//! External downloader (yt-dlp) integration.
//!
//! All metadata, listing, thumbnail and subtitle work goes through a single
//! [`Downloader::run`] call so that sources can be exercised with fakes.

mod subtitle;

pub use subtitle::{read_subtitle, strip_subtitle_markup};

use crate::config::DownloaderSettings;
use crate::error::{Result, SummaristError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Runs the external downloader and returns its standard output.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Invoke the downloader with `args` (the URL is expected as the last argument).
    async fn run(&self, args: &[String]) -> Result<String>;
}

/// yt-dlp process wrapper.
pub struct YtDlp {
    binary: String,
    timeout: Duration,
    extractor_args: Vec<String>,
}

impl YtDlp {
    pub fn new(settings: &DownloaderSettings) -> Self {
        Self {
            binary: settings.binary.clone(),
            timeout: Duration::from_secs(settings.timeout_seconds),
            extractor_args: settings.extractor_args.clone(),
        }
    }

    /// Invocation variants, tried in order: plain, then one per extractor option.
    fn variants(&self, args: &[String]) -> Vec<Vec<String>> {
        let mut variants = vec![args.to_vec()];
        for extractor in &self.extractor_args {
            let mut variant = vec!["--extractor-args".to_string(), extractor.clone()];
            variant.extend_from_slice(args);
            variants.push(variant);
        }
        variants
    }

    async fn run_once(&self, args: &[String]) -> Result<std::process::Output> {
        let child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(self.timeout, child).await {
            Err(_) => Err(SummaristError::Timeout(self.timeout.as_secs())),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SummaristError::ToolNotFound(self.binary.clone()))
            }
            Ok(Err(e)) => Err(SummaristError::ToolFailed(format!(
                "{} execution failed: {e}",
                self.binary
            ))),
            Ok(Ok(output)) => Ok(output),
        }
    }
}

#[async_trait]
impl Downloader for YtDlp {
    #[instrument(skip(self), fields(binary = %self.binary))]
    async fn run(&self, args: &[String]) -> Result<String> {
        let mut last_error = String::new();

        for variant in self.variants(args) {
            // Timeouts and a missing binary end the call; no further variants are tried.
            let output = self.run_once(&variant).await?;
            let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

            if output.status.success() {
                return Ok(stdout);
            }

            last_error = String::from_utf8_lossy(&output.stderr).trim().to_string();
            debug!("yt-dlp variant failed: {}", last_error);
        }

        Err(SummaristError::ToolFailed(format!("yt-dlp error: {last_error}")))
    }
}

fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}

/// Look up metadata for a single item.
///
/// Tries `--dump-json` first and falls back to `--print %(json)s`.
#[instrument(skip(downloader))]
pub async fn fetch_info(downloader: &dyn Downloader, url: &str) -> Result<serde_json::Value> {
    let attempts = [
        owned(&["--dump-json", "--no-download", "--no-playlist", url]),
        owned(&["--print", "%(json)s", "--skip-download", "--no-playlist", url]),
    ];

    let mut last_error = None;
    for args in attempts {
        match downloader.run(&args).await {
            Ok(output) => {
                let trimmed = output.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match serde_json::from_str(trimmed) {
                    Ok(info) => return Ok(info),
                    Err(e) => last_error = Some(e.to_string()),
                }
            }
            Err(e @ SummaristError::ToolNotFound(_)) => return Err(e),
            Err(e) => last_error = Some(e.to_string()),
        }
    }

    Err(SummaristError::Fetch(format!(
        "could not read metadata for {url}: {}",
        last_error.unwrap_or_else(|| "empty output".to_string())
    )))
}

/// Result of a flat listing call.
#[derive(Debug, Default)]
pub struct Listing {
    /// Entries that parsed as JSON.
    pub entries: Vec<serde_json::Value>,
    /// Lines that could not be parsed and were skipped.
    pub skipped_lines: usize,
}

/// Parse one JSON document per line, skipping lines that fail to parse.
pub fn parse_listing(output: &str) -> Listing {
    let mut listing = Listing::default();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<serde_json::Value>(line) {
            Ok(entry) => listing.entries.push(entry),
            Err(e) => {
                debug!("Skipping unparseable listing line: {}", e);
                listing.skipped_lines += 1;
            }
        }
    }

    listing
}

/// Enumerate the entries of a channel, playlist or show.
#[instrument(skip(downloader))]
pub async fn list_entries(downloader: &dyn Downloader, source_url: &str) -> Result<Listing> {
    let output = downloader
        .run(&owned(&["--dump-json", "--flat-playlist", source_url]))
        .await?;

    let listing = parse_listing(&output);
    if listing.skipped_lines > 0 {
        warn!(
            "Skipped {} malformed listing lines for {}",
            listing.skipped_lines, source_url
        );
    }
    Ok(listing)
}

/// Download the cover image into `output_dir` as `cover.jpg`.
///
/// Failures are logged and reported as `None`.
#[instrument(skip(downloader, output_dir))]
pub async fn download_cover(
    downloader: &dyn Downloader,
    url: &str,
    output_dir: &Path,
) -> Option<PathBuf> {
    let template = output_dir.join("cover");
    let args = vec![
        "--write-thumbnail".to_string(),
        "--convert-thumbnails".to_string(),
        "jpg".to_string(),
        "--skip-download".to_string(),
        "--no-playlist".to_string(),
        "-o".to_string(),
        template.to_string_lossy().into_owned(),
        url.to_string(),
    ];

    if let Err(e) = downloader.run(&args).await {
        warn!("Failed to download cover: {}", e);
        return None;
    }

    for ext in ["jpg", "jpeg", "png", "webp"] {
        let candidate = output_dir.join(format!("cover.{ext}"));
        if candidate.exists() {
            let normalized = output_dir.join("cover.jpg");
            if candidate != normalized {
                if let Err(e) = std::fs::rename(&candidate, &normalized) {
                    warn!("Failed to rename cover image: {}", e);
                    return Some(candidate);
                }
            }
            return Some(normalized);
        }
    }

    warn!("Downloader reported success but no cover image was written");
    None
}

/// Fetch subtitles and return them as plain text.
///
/// Subtitles are written to a private temporary directory that is removed
/// when this function returns. Any failure yields an empty transcript.
#[instrument(skip(downloader, languages))]
pub async fn download_transcript(
    downloader: &dyn Downloader,
    url: &str,
    languages: &[String],
) -> String {
    let temp_dir = match tempfile::Builder::new().prefix("summarist-subs-").tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            warn!("Failed to create subtitle directory: {}", e);
            return String::new();
        }
    };

    let template = temp_dir.path().join("%(id)s");
    let args = vec![
        "--write-subs".to_string(),
        "--write-auto-subs".to_string(),
        "--sub-lang".to_string(),
        languages.join(","),
        "--skip-download".to_string(),
        "--no-playlist".to_string(),
        "--output".to_string(),
        template.to_string_lossy().into_owned(),
        url.to_string(),
    ];

    if let Err(e) = downloader.run(&args).await {
        warn!("Failed to fetch subtitles: {}", e);
        return String::new();
    }

    match find_subtitle_file(temp_dir.path(), languages) {
        Some(path) => {
            info!("Reading subtitles from {:?}", path.file_name());
            read_subtitle(&path)
        }
        None => {
            info!("No subtitle track available");
            String::new()
        }
    }
}

/// Pick a subtitle file by language preference, `.vtt` before `.srt`.
fn find_subtitle_file(dir: &Path, languages: &[String]) -> Option<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("vtt") | Some("srt")
            )
        })
        .collect();
    files.sort();

    for ext in ["vtt", "srt"] {
        for lang in languages {
            let suffix = format!(".{lang}.{ext}");
            if let Some(found) = files
                .iter()
                .find(|p| p.to_string_lossy().ends_with(&suffix))
            {
                return Some(found.clone());
            }
        }
    }

    for ext in ["vtt", "srt"] {
        if let Some(found) = files
            .iter()
            .find(|p| p.extension().and_then(|e| e.to_str()) == Some(ext))
        {
            return Some(found.clone());
        }
    }

    None
}

/// Value of the `--output`/`-o` flag in an argument list.
pub fn output_arg(args: &[String]) -> Option<&str> {
    args.iter()
        .position(|a| a == "--output" || a == "-o")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}


#[cfg(test)]
mod tests {
    use super::testing::FakeDownloader;
    use super::*;

    #[test]
    fn test_parse_listing_skips_bad_lines() {
        let output = "{\"id\": \"a\"}\nnot json\n\n{\"id\": \"b\"}\n{broken";
        let listing = parse_listing(output);

        assert_eq!(listing.entries.len(), 2);
        assert_eq!(listing.entries[1]["id"], "b");
        assert_eq!(listing.skipped_lines, 2);
    }

    #[test]
    fn test_variants_order() {
        let ytdlp = YtDlp::new(&DownloaderSettings::default());
        let variants = ytdlp.variants(&owned(&["--dump-json", "URL"]));

        assert_eq!(variants.len(), 3);
        assert_eq!(variants[0], owned(&["--dump-json", "URL"]));
        assert_eq!(variants[1][0], "--extractor-args");
        assert_eq!(variants[1][1], "youtube:player_client=default");
        assert_eq!(variants[2][1], "youtube:player_client=android");
        assert_eq!(variants[2].last().unwrap(), "URL");
    }

    #[tokio::test]
    async fn test_missing_binary_is_tool_not_found() {
        let settings = DownloaderSettings {
            binary: "summarist-no-such-binary".to_string(),
            ..DownloaderSettings::default()
        };
        let err = YtDlp::new(&settings)
            .run(&owned(&["--version"]))
            .await
            .unwrap_err();
        assert!(matches!(err, SummaristError::ToolNotFound(_)));
    }

    /// Write an executable shell script that logs each invocation to `calls`.
    #[cfg(unix)]
    fn fake_binary(dir: &Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("yt-dlp");
        let calls = dir.join("calls");
        std::fs::write(
            &script,
            format!("#!/bin/sh\necho \"$@\" >> '{}'\n{}\n", calls.display(), body),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script.display().to_string()
    }

    #[cfg(unix)]
    fn invocations(dir: &Path) -> usize {
        std::fs::read_to_string(dir.join("calls"))
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_stops_variant_loop() {
        let dir = tempfile::tempdir().unwrap();
        let settings = DownloaderSettings {
            binary: fake_binary(dir.path(), "exec sleep 5"),
            timeout_seconds: 1,
            ..DownloaderSettings::default()
        };
        let ytdlp = YtDlp::new(&settings);
        assert_eq!(ytdlp.variants(&owned(&["URL"])).len(), 3);

        let err = ytdlp.run(&owned(&["--dump-json", "URL"])).await.unwrap_err();

        assert!(matches!(err, SummaristError::Timeout(1)));
        assert_eq!(invocations(dir.path()), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_binary_tries_every_variant() {
        let dir = tempfile::tempdir().unwrap();
        let settings = DownloaderSettings {
            binary: fake_binary(dir.path(), "echo 'ERROR: blocked' >&2\nexit 1"),
            ..DownloaderSettings::default()
        };

        let err = YtDlp::new(&settings)
            .run(&owned(&["--dump-json", "URL"]))
            .await
            .unwrap_err();

        match err {
            SummaristError::ToolFailed(msg) => assert!(msg.contains("ERROR: blocked")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(invocations(dir.path()), 3);
    }

    #[tokio::test]
    async fn test_fetch_info_unavailable_is_fetch_error() {
        let downloader = FakeDownloader::default();
        let err = fetch_info(&downloader, "https://youtu.be/dQw4w9WgXcQ")
            .await
            .unwrap_err();

        assert!(matches!(err, SummaristError::Fetch(_)));
        // Both lookup styles were attempted.
        assert_eq!(downloader.call_count(), 2);
    }

    #[tokio::test]
    async fn test_transcript_prefers_language_order() {
        let downloader = FakeDownloader {
            subtitles: vec![
                (".en.vtt".to_string(), "WEBVTT\n\n00:00.000 --> 00:01.000\nEnglish line".to_string()),
                (".zh-CN.vtt".to_string(), "WEBVTT\n\n00:00.000 --> 00:01.000\n中文".to_string()),
            ],
            ..FakeDownloader::default()
        };
        let languages = vec!["zh-CN".to_string(), "en".to_string()];

        let transcript = download_transcript(&downloader, "https://youtu.be/x", &languages).await;
        assert_eq!(transcript, "中文");
    }

    #[tokio::test]
    async fn test_transcript_without_subtitles_is_empty() {
        let downloader = FakeDownloader::default();
        let transcript =
            download_transcript(&downloader, "https://youtu.be/x", &["en".to_string()]).await;
        assert_eq!(transcript, "");
    }

    #[tokio::test]
    async fn test_cover_is_normalized_to_jpg() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = FakeDownloader {
            cover: true,
            ..FakeDownloader::default()
        };

        let cover = download_cover(&downloader, "https://youtu.be/x", dir.path()).await;
        assert_eq!(cover, Some(dir.path().join("cover.jpg")));
        assert!(dir.path().join("cover.jpg").exists());
    }
}
