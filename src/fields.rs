//! Field resolution over loosely named sources.
//!
//! Two kinds of input reach the builders with unpredictable keys:
//!
//! - Front matter from Markdown exports, where a field may appear under an
//!   English name, a localized column name, or an opaque property id.
//!   [`resolve`] picks the first non-empty candidate; [`resolve_category`]
//!   adds the heuristic scan for category-like values.
//! - Notion data-source schemas, where columns carry free-form names.
//!   [`KeyMap`] maps canonical aliases onto schema keys with an ordered
//!   table of [`AliasRule`]s.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::frontmatter::FrontMatter;

/// First non-empty value among `candidates`, in priority order.
pub fn resolve<'a>(fm: &'a FrontMatter, candidates: &[&str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|key| fm.get(key))
        .map(str::trim)
        .find(|v| !v.is_empty())
}

/// First element of an inline YAML list (`[a, b]`), or the value itself.
pub fn first_list_item(value: &str) -> &str {
    let v = value.trim();
    match v.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        Some(inner) => {
            let first = inner.split(',').next().unwrap_or_default().trim();
            first.trim_matches(|c: char| c == '"' || c == '\'').trim()
        }
        None => v,
    }
}

static DATE_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap());

/// True when `s` starts with a `YYYY-MM-DD` date.
pub fn looks_like_date(s: &str) -> bool {
    DATE_PREFIX.is_match(s)
}

/// Inputs to [`resolve_category`].
#[derive(Debug, Clone, Copy)]
pub struct CategoryRules<'a> {
    /// Keys checked first, in order.
    pub candidates: &'a [&'a str],
    /// Keys that never hold a category (title, date, ...).
    pub reserved_keys: &'a [&'a str],
    /// Values accepted regardless of length.
    pub known: &'a [&'a str],
}

/// Resolve a category value.
///
/// Direct candidates win. Otherwise every other entry is scanned in
/// document order and the first value that is not date-like and is either
/// a known category or 2–20 characters long is taken. The scan exists
/// because Notion exports some columns under opaque ids; it will also
/// accept any other short free-text field.
pub fn resolve_category(fm: &FrontMatter, rules: &CategoryRules<'_>) -> Option<String> {
    if let Some(v) = resolve(fm, rules.candidates) {
        let item = first_list_item(v);
        if !item.is_empty() {
            return Some(item.to_string());
        }
    }

    fm.iter()
        .filter(|(key, _)| !rules.reserved_keys.contains(key))
        .filter(|(key, _)| !rules.candidates.contains(key))
        .map(|(_, value)| first_list_item(value))
        .find(|s| {
            if s.is_empty() || looks_like_date(s) {
                return false;
            }
            let len = s.chars().count();
            rules.known.contains(s) || (2..=20).contains(&len)
        })
        .map(str::to_string)
}

// ============ Schema alias tables ============

/// Assigns `aliases` to any column whose name contains one of `matches`
/// or equals it case-insensitively.
#[derive(Debug, Clone, Copy)]
pub struct AliasRule {
    pub matches: &'static [&'static str],
    pub aliases: &'static [&'static str],
}

impl AliasRule {
    fn matches(&self, name: &str, name_lower: &str) -> bool {
        self.matches
            .iter()
            .any(|k| name.contains(k) || name_lower == k.to_lowercase())
    }
}

/// Alias → schema key lookup table for one data source.
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
    map: HashMap<String, String>,
}

impl KeyMap {
    /// Build the table from `(column name, schema key)` pairs.
    ///
    /// Every column is reachable by its own name and lowercase name. Rules
    /// then add aliases; a later column overrides an earlier one for the
    /// same alias.
    pub fn build<'a, I>(columns: I, rules: &[AliasRule]) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut map = HashMap::new();
        for (name, key) in columns {
            let name = name.trim();
            let name_lower = name.to_lowercase();
            map.insert(name.to_string(), key.to_string());
            map.insert(name_lower.clone(), key.to_string());
            for rule in rules {
                if rule.matches(name, &name_lower) {
                    for alias in rule.aliases {
                        map.insert(alias.to_string(), key.to_string());
                    }
                }
            }
        }
        Self { map }
    }

    /// Schema keys for `candidates`, in candidate order.
    pub fn keys_for<'s>(&'s self, candidates: &'s [&'s str]) -> impl Iterator<Item = &'s str> + 's {
        candidates
            .iter()
            .filter_map(|c| self.map.get(*c))
            .map(String::as_str)
    }

    pub fn get(&self, alias: &str) -> Option<&str> {
        self.map.get(alias).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATEGORY: CategoryRules<'static> = CategoryRules {
        candidates: &["选择", "分类", "categories", "tags"],
        reserved_keys: &["title", "date", "updated", "description", "urlname", "cover"],
        known: &["旅行感受", "随笔"],
    };

    fn fm(pairs: &[(&str, &str)]) -> FrontMatter {
        pairs.iter().copied().collect()
    }

    #[test]
    fn resolve_skips_empty_candidates() {
        let f = fm(&[("title", ""), ("标题", "  你好 ")]);
        assert_eq!(resolve(&f, &["title", "标题"]), Some("你好"));
        assert_eq!(resolve(&f, &["missing"]), None);
    }

    #[test]
    fn category_direct_candidate_priority() {
        let f = fm(&[("tags", "书评"), ("分类", "影评")]);
        assert_eq!(resolve_category(&f, &CATEGORY).as_deref(), Some("影评"));
    }

    #[test]
    fn category_inline_list_takes_first() {
        let f = fm(&[("categories", "[技术思考, 随笔]")]);
        assert_eq!(resolve_category(&f, &CATEGORY).as_deref(), Some("技术思考"));
    }

    #[test]
    fn category_fallback_scans_opaque_keys() {
        let f = fm(&[
            ("title", "京都"),
            ("date", "2024-03-01"),
            ("urlname", "abc123"),
            ("%3DyR%5C", "旅行感受"),
        ]);
        assert_eq!(resolve_category(&f, &CATEGORY).as_deref(), Some("旅行感受"));
    }

    #[test]
    fn category_fallback_ignores_dates_and_long_text() {
        let f = fm(&[
            ("created", "2024-03-01 10:00:00"),
            ("note", "this value is definitely far longer than twenty characters"),
            ("x", "a"),
        ]);
        assert_eq!(resolve_category(&f, &CATEGORY), None);
    }

    #[test]
    fn known_category_accepted_even_if_short() {
        let rules = CategoryRules {
            known: &["书"],
            ..CATEGORY
        };
        let f = fm(&[("opaque", "书")]);
        assert_eq!(resolve_category(&f, &rules).as_deref(), Some("书"));
    }

    #[test]
    fn date_detection() {
        assert!(looks_like_date("2024-01-02"));
        assert!(looks_like_date("2024-01-02T00:00:00Z"));
        assert!(!looks_like_date("Jan 2 2024"));
    }

    const RULES: &[AliasRule] = &[
        AliasRule {
            matches: &["类型", "type"],
            aliases: &["type", "类型"],
        },
        AliasRule {
            matches: &["职位", "role", "title"],
            aliases: &["role", "职位"],
        },
    ];

    #[test]
    fn key_map_aliases_by_substring_and_case() {
        let km = KeyMap::build([("简历类型", "k1"), ("Role", "k2")], RULES);
        assert_eq!(km.get("type"), Some("k1"));
        assert_eq!(km.get("简历类型"), Some("k1"));
        assert_eq!(km.get("role"), Some("k2"));
        assert_eq!(km.get("Role"), Some("k2"));
    }

    #[test]
    fn key_map_later_column_wins() {
        let km = KeyMap::build([("职位", "first"), ("title", "second")], RULES);
        assert_eq!(km.get("role"), Some("second"));
    }

    #[test]
    fn keys_for_preserves_candidate_order() {
        let km = KeyMap::build([("类型", "k1"), ("职位", "k2")], RULES);
        let keys: Vec<_> = km.keys_for(&["missing", "role", "type"]).collect();
        assert_eq!(keys, vec!["k2", "k1"]);
    }
}
