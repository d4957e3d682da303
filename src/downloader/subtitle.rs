//! Subtitle to plain-text conversion (WebVTT and SRT).

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::warn;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// Read a subtitle file and return its spoken text. Unreadable files yield "".
pub fn read_subtitle(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => strip_subtitle_markup(&content),
        Err(e) => {
            warn!("Failed to read subtitle file {:?}: {}", path, e);
            String::new()
        }
    }
}

/// Remove headers, cue numbers, timing lines and inline tags.
///
/// Consecutive identical lines (rolling auto-captions) are collapsed.
pub fn strip_subtitle_markup(content: &str) -> String {
    let source: Vec<&str> = content.lines().map(str::trim).collect();
    let mut lines: Vec<String> = Vec::new();

    for (i, &line) in source.iter().enumerate() {
        if line.is_empty()
            || is_timing(line)
            || line.starts_with("WEBVTT")
            || line.starts_with("Kind:")
            || line.starts_with("Language:")
            || is_cue_index(line, source.get(i + 1).copied())
        {
            continue;
        }

        let text = TAG_RE.replace_all(line, "");
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        if lines.last().map(String::as_str) != Some(text) {
            lines.push(text.to_string());
        }
    }

    lines.join("\n")
}

fn is_timing(line: &str) -> bool {
    line.contains("-->")
}

/// A digit-only line directly above a timing line numbers the cue.
/// Elsewhere it is spoken text.
fn is_cue_index(line: &str, next: Option<&str>) -> bool {
    line.chars().all(|c| c.is_ascii_digit()) && next.is_some_and(is_timing)
}
