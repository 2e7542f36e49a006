//! Text helpers shared by the record builders.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// Number of characters kept in a generated excerpt.
pub const EXCERPT_CHARS: usize = 120;

static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#{1,6}\s+").unwrap());
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.+?)\*").unwrap());
static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`(.+?)`").unwrap());
static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[(.+?)\]\(.+?\)").unwrap());
static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[-*]\s+").unwrap());
static ORDERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\d+\.\s+").unwrap());
static MD_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[.*?\]\((https?://[^)]+|/[^)]+)\)").unwrap());

/// Remove Markdown syntax, keeping the visible text.
///
/// Handles headings, bold/italic markers, inline code, link brackets and
/// list markers. Images keep their alt text with a leading `!`.
pub fn strip_markdown(text: &str) -> String {
    let s = HEADING.replace_all(text, "");
    let s = BOLD.replace_all(&s, "$1");
    let s = ITALIC.replace_all(&s, "$1");
    let s = CODE.replace_all(&s, "$1");
    let s = LINK.replace_all(&s, "$1");
    let s = BULLET.replace_all(&s, "");
    let s = ORDERED.replace_all(&s, "");
    s.trim().to_string()
}

/// First [`EXCERPT_CHARS`] characters of `plain`, newlines collapsed to
/// spaces, with `...` appended when truncated.
pub fn make_excerpt(plain: &str) -> String {
    let mut excerpt: String = plain
        .chars()
        .take(EXCERPT_CHARS)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    if plain.chars().count() > EXCERPT_CHARS {
        excerpt.push_str("...");
    }
    excerpt
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// Normalize a loosely formatted date to `YYYY-MM-DD`.
///
/// Offset timestamps are converted to UTC first; naive timestamps keep
/// their calendar date. Returns `None` when nothing parses.
pub fn normalize_date(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(format_date(dt.with_timezone(&Utc).date_naive()));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(format_date(dt.date()));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(format_date(d));
        }
    }

    // Timestamps with fractional seconds or odd suffixes
    let prefix: String = s.chars().take(10).collect();
    NaiveDate::parse_from_str(&prefix, "%Y-%m-%d")
        .ok()
        .map(format_date)
}

fn format_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// Current UTC date as `YYYY-MM-DD`.
pub fn today() -> String {
    format_date(Utc::now().date_naive())
}

/// URL of the first Markdown image whose target is absolute or root-relative.
pub fn first_markdown_image(body: &str) -> Option<&str> {
    MD_IMAGE
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Non-empty trimmed lines, in order.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_common_markdown() {
        let md = "# Title\n\nSome **bold** and *italic* with `code`.\n\n- item one\n* item two\n1. first\n\nSee [the docs](https://x.y).";
        let plain = strip_markdown(md);
        assert_eq!(
            plain,
            "Title\n\nSome bold and italic with code.\n\nitem one\nitem two\nfirst\n\nSee the docs."
        );
    }

    #[test]
    fn excerpt_truncates_on_characters() {
        let long: String = "长".repeat(130);
        let e = make_excerpt(&long);
        assert_eq!(e.chars().count(), EXCERPT_CHARS + 3);
        assert!(e.ends_with("..."));
    }

    #[test]
    fn excerpt_short_text_unchanged_except_newlines() {
        assert_eq!(make_excerpt("a\nb"), "a b");
    }

    #[test]
    fn normalize_common_formats() {
        assert_eq!(normalize_date("2024-01-02").as_deref(), Some("2024-01-02"));
        assert_eq!(
            normalize_date("2024-01-02 23:10:00").as_deref(),
            Some("2024-01-02")
        );
        assert_eq!(
            normalize_date("2024-01-02T01:00:00+08:00").as_deref(),
            Some("2024-01-01")
        );
        assert_eq!(
            normalize_date("2024-01-02T10:00:00.000Z").as_deref(),
            Some("2024-01-02")
        );
        assert_eq!(normalize_date("2024/03/09").as_deref(), Some("2024-03-09"));
        assert_eq!(normalize_date("2024.03.09").as_deref(), Some("2024-03-09"));
    }

    #[test]
    fn normalize_rejects_garbage() {
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("someday"), None);
    }

    #[test]
    fn today_is_iso() {
        let t = today();
        assert_eq!(t.len(), 10);
        assert!(NaiveDate::parse_from_str(&t, "%Y-%m-%d").is_ok());
    }

    #[test]
    fn finds_first_image() {
        let body = "text ![a](relative.png) ![b](https://cdn.x/y.jpg) ![c](/images/z.png)";
        assert_eq!(first_markdown_image(body), Some("https://cdn.x/y.jpg"));
        assert_eq!(first_markdown_image("no images"), None);
    }

    #[test]
    fn split_lines_drops_blanks() {
        assert_eq!(split_lines(" a \n\n b\n"), vec!["a", "b"]);
    }
}
