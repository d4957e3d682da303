//! Lenient extraction of a [`SummaryResult`] from model output.
//!
//! The model is asked for a fenced JSON block but may answer in Markdown
//! or plain prose. Each field group is filled by the first strategy that
//! produces it; the raw response is the last resort for the body.

use super::{Guest, SummaryResult};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

static JSON_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```json\s*([\s\S]*?)\s*```").expect("Invalid regex"));

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•+]\s+|\d+[.)]\s+|\d+、\s*)").expect("Invalid regex"));

const CORE_POINT_KEYWORDS: &[&str] = &["core points", "key points", "核心观点"];
const QUOTE_KEYWORDS: &[&str] = &["quotes", "金句"];
const QUOTE_PUNCTUATION: &[char] = &['"', '「', '」', '“', '”', '-', '*', '•'];

/// Field groups the JSON block set, even to an empty value.
#[derive(Debug, Default)]
struct Supplied {
    title: bool,
    core_points: bool,
    quotes: bool,
}

/// Parse a raw model response into a summary. Never fails.
pub fn parse_response(raw: &str) -> SummaryResult {
    let (mut result, supplied) = JSON_BLOCK
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|m| match serde_json::from_str::<Value>(m.as_str()) {
            Ok(value) => Some(from_json(&value)),
            Err(e) => {
                debug!("Fenced JSON block did not decode: {}", e);
                None
            }
        })
        .unwrap_or_default();

    // Markdown fallbacks only look at text outside fenced JSON
    let prose = JSON_BLOCK.replace_all(raw, "\n");
    let lines: Vec<&str> = prose.lines().collect();

    if !supplied.title {
        if let Some(title) = lines
            .iter()
            .map(|l| l.trim())
            .find_map(|l| l.strip_prefix("# "))
        {
            result.title = title.trim().to_string();
        }
    }

    if !supplied.core_points {
        result.core_points = collect_section(&lines, CORE_POINT_KEYWORDS, is_list_item, strip_marker);
    }

    if !supplied.quotes {
        result.quotes = collect_section(&lines, QUOTE_KEYWORDS, is_quote_item, strip_quote);
    }

    if result.summary.trim().is_empty() {
        result.summary = raw.to_string();
    }

    result
}

const TITLE_KEYS: &[&str] = &["title"];
const CORE_POINT_KEYS: &[&str] = &["core_points", "corePoints"];
const QUOTE_KEYS: &[&str] = &["quotes"];

fn from_json(value: &Value) -> (SummaryResult, Supplied) {
    let result = SummaryResult {
        title: string_field(value, TITLE_KEYS),
        core_points: list_field(value, CORE_POINT_KEYS),
        insights: list_field(value, &["insights"]),
        quotes: list_field(value, QUOTE_KEYS),
        guests: guests_field(value),
        summary: string_field(value, &["summary"]),
    };
    let supplied = Supplied {
        title: lookup(value, TITLE_KEYS).is_some(),
        core_points: lookup(value, CORE_POINT_KEYS).is_some(),
        quotes: lookup(value, QUOTE_KEYS).is_some(),
    };
    (result, supplied)
}

fn lookup<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| value.get(*k)).filter(|v| !v.is_null())
}

fn string_field(value: &Value, keys: &[&str]) -> String {
    match lookup(value, keys) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) if !other.is_object() && !other.is_array() => other.to_string(),
        _ => String::new(),
    }
}

fn list_field(value: &Value, keys: &[&str]) -> Vec<String> {
    match lookup(value, keys) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

fn guests_field(value: &Value) -> Vec<Guest> {
    let Some(Value::Array(items)) = lookup(value, &["guests"]) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| serde_json::from_value::<Guest>(item.clone()).ok())
        .collect()
}

/// Collect list lines following the first heading that names one of `keywords`.
fn collect_section(
    lines: &[&str],
    keywords: &[&str],
    is_item: fn(&str) -> bool,
    clean: fn(&str) -> String,
) -> Vec<String> {
    let Some(start) = lines.iter().position(|line| is_section_heading(line, keywords)) else {
        return Vec::new();
    };

    let mut items = Vec::new();
    for line in &lines[start + 1..] {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !is_item(line) {
            break;
        }
        let cleaned = clean(line);
        if !cleaned.is_empty() {
            items.push(cleaned);
        }
    }
    items
}

/// A heading-like line naming a section: `# ...`, `...:`, `**...**`, or the
/// bare keyword on its own line.
fn is_section_heading(line: &str, keywords: &[&str]) -> bool {
    let line = line.trim();
    if is_list_item(line) {
        return false;
    }

    let lower = line.to_lowercase();
    let Some(keyword) = keywords.iter().find(|k| lower.contains(*k)) else {
        return false;
    };

    let bare = lower.trim_matches(|c: char| !c.is_alphanumeric());
    line.starts_with('#')
        || line.ends_with([':', '：'])
        || (line.starts_with("**") && line.ends_with("**"))
        || bare == *keyword
}

/// `---`, `***`, `___` and spaced variants.
fn is_thematic_break(line: &str) -> bool {
    let marks: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
    marks.len() >= 3 && matches!(marks[0], '-' | '*' | '_') && marks.iter().all(|c| *c == marks[0])
}

fn is_list_item(line: &str) -> bool {
    !is_thematic_break(line) && LIST_MARKER.is_match(line)
}

fn is_quote_item(line: &str) -> bool {
    is_list_item(line) || line.starts_with(['"', '「', '“', '>'])
}

fn strip_marker(line: &str) -> String {
    LIST_MARKER.replace(line, "").trim().to_string()
}

fn strip_quote(line: &str) -> String {
    let line = line.trim_start_matches('>').trim();
    strip_marker(line)
        .trim_matches(|c: char| QUOTE_PUNCTUATION.contains(&c) || c.is_whitespace())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_json_fields() {
        let raw = "Here you go:\n```json\n{\"title\": \"T\", \"summary\": \"S\"}\n```\n";
        let result = parse_response(raw);

        assert_eq!(result.title, "T");
        assert_eq!(result.summary, "S");
        assert!(result.core_points.is_empty());
        assert!(result.guests.is_empty());
    }

    #[test]
    fn test_heading_title_without_json() {
        let result = parse_response("# My Title\n\nSome prose about the episode.");

        assert_eq!(result.title, "My Title");
        assert_eq!(result.summary, "# My Title\n\nSome prose about the episode.");
    }

    #[test]
    fn test_full_json_with_mixed_guests() {
        let raw = r#"```json
{
  "title": "Scaling Laws",
  "corePoints": ["Data matters", "Compute matters"],
  "insights": ["Bigger is not always better"],
  "quotes": ["We were wrong."],
  "guests": ["Alice", {"name": "Bob", "role": "Researcher"}],
  "summary": "A long talk."
}
```"#;
        let result = parse_response(raw);

        assert_eq!(result.core_points, vec!["Data matters", "Compute matters"]);
        assert_eq!(result.insights.len(), 1);
        assert_eq!(result.quotes, vec!["We were wrong."]);
        assert_eq!(result.guests[0], Guest::Name("Alice".to_string()));
        assert_eq!(
            result.guests[1],
            Guest::Profile {
                name: Some("Bob".to_string()),
                role: Some("Researcher".to_string()),
                views: None,
            }
        );
    }

    #[test]
    fn test_markdown_sections() {
        let raw = "# 标题\n\n## 核心观点\n- 第一点\n2. 第二点\n\n## 金句\n「不要停止学习」\n- \"Stay curious\"\n\n## 总结\n正文";
        let result = parse_response(raw);

        assert_eq!(result.title, "标题");
        assert_eq!(result.core_points, vec!["第一点", "第二点"]);
        assert_eq!(result.quotes, vec!["不要停止学习", "Stay curious"]);
    }

    #[test]
    fn test_section_stops_at_prose() {
        let raw = "Key Points:\n* one\n* two\nThat is all.\n* not a point";
        let result = parse_response(raw);
        assert_eq!(result.core_points, vec!["one", "two"]);
    }

    #[test]
    fn test_broken_json_falls_back_to_text() {
        let raw = "```json\n{\"title\": \n```\n# Recovered";
        let result = parse_response(raw);

        assert_eq!(result.title, "Recovered");
        assert_eq!(result.summary, raw);
    }

    #[test]
    fn test_json_wins_over_text_sections() {
        let raw = "```json\n{\"core_points\": [\"from json\"]}\n```\nCore points:\n- from text";
        let result = parse_response(raw);
        assert_eq!(result.core_points, vec!["from json"]);
    }

    #[test]
    fn test_empty_json_fields_stay_settled() {
        let raw = "```json\n{\n  \"title\": \"T\",\n  \"quotes\": [],\n  \"guests\": [\"Alice\"],\n  \"summary\": \"S\"\n}\n```";
        let result = parse_response(raw);

        assert_eq!(result.title, "T");
        assert!(result.quotes.is_empty());
        assert!(result.core_points.is_empty());
        assert_eq!(result.guests, vec![Guest::Name("Alice".to_string())]);
        assert_eq!(result.summary, "S");
    }

    #[test]
    fn test_sections_only_read_outside_the_json_block() {
        let raw = r#"```json
{
  "summary": "S",
  "insights": [
    "Quotes:",
    "\"hidden\""
  ]
}
```

## Quotes
- "visible"
"#;
        let result = parse_response(raw);

        assert_eq!(result.insights, vec!["Quotes:", "\"hidden\""]);
        assert_eq!(result.quotes, vec!["visible"]);
    }

    #[test]
    fn test_keyword_in_prose_is_not_a_heading() {
        let raw = "We went over the key points of the deal.\n- not a point\n\nKey points\n- real";
        let result = parse_response(raw);
        assert_eq!(result.core_points, vec!["real"]);
    }

    #[test]
    fn test_thematic_break_ends_section() {
        let raw = "# Title\n\n## Core Points\n- a\n- b\n\n---\n\n## Quotes\n- \"q\"\n";
        let result = parse_response(raw);

        assert_eq!(result.core_points, vec!["a", "b"]);
        assert_eq!(result.quotes, vec!["q"]);
    }

    #[test]
    fn test_bold_paragraph_is_not_a_list_item() {
        let raw = "**Key Points**\n* one\n**Next up** is the interview.\n* ignored";
        let result = parse_response(raw);
        assert_eq!(result.core_points, vec!["one"]);
    }

    #[test]
    fn test_guest_with_list_views_is_kept() {
        let raw = "```json\n{\"guests\": [{\"name\": \"Bob\", \"role\": \"Researcher\", \"views\": [\"a\", \"b\"]}], \"summary\": \"S\"}\n```";
        let result = parse_response(raw);

        assert_eq!(
            result.guests,
            vec![Guest::Profile {
                name: Some("Bob".to_string()),
                role: Some("Researcher".to_string()),
                views: Some("a; b".to_string()),
            }]
        );
    }

    #[test]
    fn test_plain_text_is_summary() {
        let result = parse_response("just words");

        assert_eq!(result.title, "");
        assert!(result.quotes.is_empty());
        assert_eq!(result.summary, "just words");
    }
}
