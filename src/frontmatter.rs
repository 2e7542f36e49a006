//! Front-matter parser for exported Markdown.
//!
//! A document may start with a block of `key: value` lines fenced by `---`
//! lines. Keys are often localized Notion column names (`分类`, `拍摄地点`)
//! or opaque property ids, so nothing here assumes ASCII keys.
//!
//! ```text
//! ---
//! title: 测试
//! date: 2024-01-02
//! ---
//! Hello
//! ```

/// Ordered key/value pairs from a front-matter block.
///
/// Insertion order is kept because the category fallback scan walks
/// entries in document order. Re-inserting a key replaces its value in
/// place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    entries: Vec<(String, String)>,
}

impl FrontMatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Raw value for `key`, possibly empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FrontMatter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fm = FrontMatter::new();
        for (k, v) in iter {
            fm.insert(k, v);
        }
        fm
    }
}

/// Front matter and body of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub front_matter: FrontMatter,
    pub body: String,
}

/// Split `raw` into front matter and body.
///
/// Without an opening `---` line followed later by a closing `---` line the
/// whole text is the body. Lines inside the block without a colon are
/// ignored. CRLF line endings are accepted.
pub fn parse_front_matter(raw: &str) -> ParsedDocument {
    let text = raw.replace("\r\n", "\n");

    let Some(rest) = text.strip_prefix("---\n") else {
        return no_block(raw);
    };

    let (block, body) = if let Some(body) = rest.strip_prefix("---\n") {
        ("", body)
    } else if let Some(idx) = rest.find("\n---\n") {
        (&rest[..idx], &rest[idx + "\n---\n".len()..])
    } else if let Some(block) = rest.strip_suffix("\n---") {
        (block, "")
    } else {
        return no_block(raw);
    };

    let mut front_matter = FrontMatter::new();
    for line in block.split('\n') {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = strip_quotes(key.trim());
        if key.is_empty() {
            continue;
        }
        front_matter.insert(key, strip_quotes(value.trim()));
    }

    ParsedDocument {
        front_matter,
        body: body.to_string(),
    }
}

fn no_block(raw: &str) -> ParsedDocument {
    ParsedDocument {
        front_matter: FrontMatter::new(),
        body: raw.to_string(),
    }
}

/// Remove one pair of matching surrounding quotes.
fn strip_quotes(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return s[1..s.len() - 1].trim();
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_block_and_body() {
        let doc = parse_front_matter("---\ntitle: 测试\ndate: 2024-01-02\n---\nHello\n\nWorld");
        assert_eq!(doc.front_matter.get("title"), Some("测试"));
        assert_eq!(doc.front_matter.get("date"), Some("2024-01-02"));
        assert_eq!(doc.front_matter.len(), 2);
        assert_eq!(doc.body, "Hello\n\nWorld");
    }

    #[test]
    fn no_block_returns_whole_text() {
        let raw = "# Heading\n\ntitle: not front matter";
        let doc = parse_front_matter(raw);
        assert!(doc.front_matter.is_empty());
        assert_eq!(doc.body, raw);
    }

    #[test]
    fn unterminated_block_is_body() {
        let raw = "---\ntitle: x\nno closing fence";
        let doc = parse_front_matter(raw);
        assert!(doc.front_matter.is_empty());
        assert_eq!(doc.body, raw);
    }

    #[test]
    fn non_ascii_keys_and_first_colon_split() {
        let doc = parse_front_matter("---\n拍摄地点: 京都\nurl: https://a.b/c.png\n---\n");
        assert_eq!(doc.front_matter.get("拍摄地点"), Some("京都"));
        assert_eq!(doc.front_matter.get("url"), Some("https://a.b/c.png"));
        assert_eq!(doc.body, "");
    }

    #[test]
    fn strips_matching_quotes_only() {
        let doc = parse_front_matter(
            "---\n\"title\": \"Quoted\"\nsingle: 'x'\nmixed: \"y'\n---\nbody",
        );
        assert_eq!(doc.front_matter.get("title"), Some("Quoted"));
        assert_eq!(doc.front_matter.get("single"), Some("x"));
        assert_eq!(doc.front_matter.get("mixed"), Some("\"y'"));
    }

    #[test]
    fn skips_lines_without_colon() {
        let doc = parse_front_matter("---\ncategories:\n  - 随笔\ntitle: a\n---\nb");
        assert_eq!(doc.front_matter.get("categories"), Some(""));
        assert_eq!(doc.front_matter.get("title"), Some("a"));
        assert_eq!(doc.front_matter.len(), 2);
    }

    #[test]
    fn closing_fence_at_end_of_file() {
        let doc = parse_front_matter("---\ntitle: a\n---");
        assert_eq!(doc.front_matter.get("title"), Some("a"));
        assert_eq!(doc.body, "");
    }

    #[test]
    fn crlf_input() {
        let doc = parse_front_matter("---\r\ntitle: a\r\n---\r\nline1\r\nline2");
        assert_eq!(doc.front_matter.get("title"), Some("a"));
        assert_eq!(doc.body, "line1\nline2");
    }

    #[test]
    fn duplicate_key_keeps_position() {
        let fm: FrontMatter = [("a", "1"), ("b", "2"), ("a", "3")].into_iter().collect();
        let pairs: Vec<_> = fm.iter().collect();
        assert_eq!(pairs, vec![("a", "3"), ("b", "2")]);
    }
}
