//! Timeline entries from Notion rows.

use crate::fields::{AliasRule, KeyMap};
use crate::models::{Influence, Portfolio, TimelineEntry};
use crate::notion::PageRow;

pub const UNKNOWN: &str = "未知";
pub const EMPTY_EVENT: &str = "岁月的留白";
pub const FUTURE: &str = "未来";
pub const DEFAULT_FULFILLMENT: i64 = 50;

const DEFAULT_INFLUENCE_KIND: &str = "book";

pub const ALIAS_RULES: &[AliasRule] = &[
    AliasRule {
        matches: &["年份", "year"],
        aliases: &["year", "年份"],
    },
    AliasRule {
        matches: &["时间轴", "title", "标题", "名称"],
        aliases: &["title", "时间轴", "label"],
    },
    AliasRule {
        matches: &["总结", "备注", "summary", "label"],
        aliases: &["summary", "总结", "备注"],
    },
    AliasRule {
        matches: &["地点", "location"],
        aliases: &["location", "地点"],
    },
    AliasRule {
        matches: &["事件", "event", "描述"],
        aliases: &["event", "事件"],
    },
    AliasRule {
        matches: &["充实度", "fulfillment"],
        aliases: &["fulfillment", "充实度"],
    },
    AliasRule {
        matches: &["关联文章", "essays", "文章"],
        aliases: &["essays", "关联文章"],
    },
    AliasRule {
        matches: &["关联项目", "projects", "项目"],
        aliases: &["projects", "关联项目"],
    },
    AliasRule {
        matches: &["关联照片", "photos", "照片"],
        aliases: &["photos", "关联照片"],
    },
    AliasRule {
        matches: &["书影音", "influences", "影响"],
        aliases: &["influences", "书影音"],
    },
];

/// Normalize a raw year cell: commas removed, numbers floored, the future
/// sentinel and free text kept as-is. Empty input yields [`UNKNOWN`].
pub fn normalize_year(raw: &str) -> String {
    let cleaned = raw.replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return UNKNOWN.to_string();
    }
    if cleaned == FUTURE {
        return FUTURE.to_string();
    }
    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() && n.floor() != 0.0 => format!("{}", n.floor() as i64),
        _ => cleaned.to_string(),
    }
}

/// Sort key for a year: the future sentinel last, unparseable first.
pub fn year_sort_key(year: &str) -> i64 {
    let year = year.trim();
    if year == FUTURE || year.eq_ignore_ascii_case("future") {
        return 9999;
    }
    let digits: String = year.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Parse `type|title|time` lines. Lines with fewer than two parts are ignored.
pub fn parse_influences(text: &str) -> Vec<Influence> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(|line| {
            let parts: Vec<&str> = line.split('|').map(str::trim).collect();
            if parts.len() < 2 {
                return None;
            }
            let kind = if parts[0].is_empty() {
                DEFAULT_INFLUENCE_KIND.to_string()
            } else {
                parts[0].to_lowercase()
            };
            Some(Influence {
                kind,
                title: parts[1].to_string(),
                time: parts.get(2).map(|s| s.to_string()).unwrap_or_default(),
            })
        })
        .collect()
}

pub fn entry_from_page(page: &PageRow, keys: &KeyMap) -> TimelineEntry {
    const YEAR: &[&str] = &["year", "年份"];

    let mut year_raw = page.text(keys, YEAR);
    if year_raw.is_empty() {
        if let Some(n) = page.lookup(keys, YEAR).and_then(|v| v.as_number()) {
            year_raw = n.round().to_string();
        }
    }

    let location = page.text(keys, &["location", "地点"]);
    let label = Some(page.text(keys, &["summary", "总结", "备注"]))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| page.text(keys, &["title", "时间轴", "label"]));
    let event = page.text(keys, &["event", "事件"]);

    let event = [label, event]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| EMPTY_EVENT.to_string());

    let fulfillment = page
        .lookup(keys, &["fulfillment", "充实度"])
        .and_then(|v| v.as_number())
        .map(|n| n.round() as i64)
        .unwrap_or(DEFAULT_FULFILLMENT);

    let names = |candidates: &[&str]| -> Vec<String> {
        page.lookup(keys, candidates)
            .map(|v| v.names().to_vec())
            .unwrap_or_default()
    };

    TimelineEntry {
        year: normalize_year(&year_raw),
        location: if location.is_empty() {
            UNKNOWN.to_string()
        } else {
            location
        },
        event,
        fulfillment,
        portfolio: Portfolio {
            photos: names(&["photos", "关联照片"]),
            essays: names(&["essays", "关联文章"]),
            projects: names(&["projects", "关联项目"]),
        },
        influences: parse_influences(&page.text(keys, &["influences", "书影音", "影响"])),
    }
}

/// Drop entries without any signal, date the yearless ones with
/// `fallback_year`, then sort ascending by year (stable).
///
/// Entries come paired with the id of the page they were built from.
pub fn finalize_entries(
    entries: Vec<(String, TimelineEntry)>,
    fallback_year: &str,
) -> Vec<TimelineEntry> {
    let mut kept: Vec<TimelineEntry> = entries
        .into_iter()
        .filter_map(|(page_id, mut entry)| {
            if entry.year != UNKNOWN {
                return Some(entry);
            }
            if entry.event == EMPTY_EVENT && entry.location == UNKNOWN {
                tracing::warn!(page = %page_id, "skipping timeline row without year, event or location");
                return None;
            }
            entry.year = fallback_year.to_string();
            Some(entry)
        })
        .collect();

    kept.sort_by_key(|e| year_sort_key(&e.year));
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notion::PropertyValue;

    fn entry(year: &str, event: &str, location: &str) -> (String, TimelineEntry) {
        let entry = TimelineEntry {
            year: year.into(),
            location: location.into(),
            event: event.into(),
            fulfillment: DEFAULT_FULFILLMENT,
            portfolio: Portfolio::default(),
            influences: Vec::new(),
        };
        (format!("page-{}", year), entry)
    }

    #[test]
    fn year_normalization() {
        assert_eq!(normalize_year("2,024"), "2024");
        assert_eq!(normalize_year("2019.7"), "2019");
        assert_eq!(normalize_year(" 未来 "), "未来");
        assert_eq!(normalize_year("大学时代"), "大学时代");
        assert_eq!(normalize_year(""), UNKNOWN);
    }

    #[test]
    fn year_sort_keys() {
        assert_eq!(year_sort_key("未来"), 9999);
        assert_eq!(year_sort_key("future"), 9999);
        assert_eq!(year_sort_key("2020年"), 2020);
        assert_eq!(year_sort_key("大学"), 0);
    }

    #[test]
    fn influences_parse() {
        let got = parse_influences("Book|禅与摩托车维修艺术|2024 春\nnot an influence\n|电影名\n");
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].kind, "book");
        assert_eq!(got[0].time, "2024 春");
        assert_eq!(got[1].kind, "book");
        assert_eq!(got[1].title, "电影名");
        assert_eq!(got[1].time, "");
    }

    #[test]
    fn finalize_filters_and_sorts() {
        let out = finalize_entries(
            vec![
                entry("未来", "远方", UNKNOWN),
                entry("2020", "毕业", "上海"),
                entry(UNKNOWN, EMPTY_EVENT, UNKNOWN),
                entry(UNKNOWN, "搬家", UNKNOWN),
                entry("2018", EMPTY_EVENT, UNKNOWN),
            ],
            "2026",
        );
        let years: Vec<_> = out.iter().map(|e| e.year.as_str()).collect();
        assert_eq!(years, vec!["2018", "2020", "2026", "未来"]);
        assert_eq!(out[2].event, "搬家");
    }

    #[test]
    fn entry_from_page_uses_label_over_event() {
        let keys = KeyMap::build(
            [
                ("时间轴", "k_title"),
                ("年份", "k_year"),
                ("事件", "k_event"),
                ("充实度", "k_ful"),
                ("关联文章", "k_essays"),
                ("书影音", "k_inf"),
            ],
            ALIAS_RULES,
        );
        let mut page = PageRow::default();
        let mut set = |k: &str, v: PropertyValue| {
            page.properties.insert(k.to_string(), v);
        };
        set("k_title", PropertyValue::Text("初到柏林".into()));
        set("k_year", PropertyValue::Number(2021.0));
        set("k_event", PropertyValue::Text("搬家".into()));
        set("k_ful", PropertyValue::Number(72.6));
        set("k_essays", PropertyValue::MultiSelect(vec!["1".into(), "3".into()]));
        set("k_inf", PropertyValue::Text("movie|Heat|2021 冬".into()));

        let e = entry_from_page(&page, &keys);
        assert_eq!(e.year, "2021");
        assert_eq!(e.event, "初到柏林");
        assert_eq!(e.location, UNKNOWN);
        assert_eq!(e.fulfillment, 73);
        assert_eq!(e.portfolio.essays, vec!["1", "3"]);
        assert!(e.portfolio.photos.is_empty());
        assert_eq!(e.influences[0].kind, "movie");
    }

    #[test]
    fn empty_page_defaults() {
        let e = entry_from_page(&PageRow::default(), &KeyMap::default());
        assert_eq!(e.year, UNKNOWN);
        assert_eq!(e.event, EMPTY_EVENT);
        assert_eq!(e.fulfillment, DEFAULT_FULFILLMENT);
    }
}
