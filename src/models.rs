//! Canonical records written to the per-language data documents.
//!
//! Field order in each struct is the key order in the emitted JSON.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::frontmatter::FrontMatter;

/// A site language. Chinese is the source language; English and German are
/// translation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Zh,
    En,
    De,
}

impl Language {
    /// Every language that has a data document, source language first.
    pub const ALL: [Language; 3] = [Language::Zh, Language::En, Language::De];
    /// Languages that essays are translated into.
    pub const TARGETS: [Language; 2] = [Language::En, Language::De];

    pub fn code(&self) -> &'static str {
        match self {
            Language::Zh => "zh",
            Language::En => "en",
            Language::De => "de",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "zh" => Some(Language::Zh),
            "en" => Some(Language::En),
            "de" => Some(Language::De),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A Markdown file read from an export directory.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    /// File name including extension, used in log messages.
    pub file_name: String,
    /// File name without the `.md` extension.
    pub stem: String,
    pub front_matter: FrontMatter,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Essay {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub date: String,
    pub category: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub url: String,
    pub caption: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resume {
    pub summary: String,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub skills: Skills,
}

impl Resume {
    /// True when no row produced any content.
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
            && self.experience.is_empty()
            && self.education.is_empty()
            && self.skills.development.is_empty()
            && self.skills.design.is_empty()
            && self.skills.languages.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub role: String,
    pub company: String,
    pub period: String,
    pub details: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub school: String,
    pub major: String,
    pub period: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skills {
    pub development: Vec<String>,
    pub design: Vec<String>,
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub year: String,
    pub location: String,
    pub event: String,
    pub fulfillment: i64,
    pub portfolio: Portfolio,
    pub influences: Vec<Influence>,
}

/// Site ids of records linked to a timeline entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portfolio {
    pub photos: Vec<String>,
    pub essays: Vec<String>,
    pub projects: Vec<String>,
}

/// A book, film, or album that shaped a timeline period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Influence {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub time: String,
}

/// Assign `"1".."N"` in current order.
pub(crate) fn assign_ids<T>(records: &mut [T], set: impl Fn(&mut T, String)) {
    for (i, record) in records.iter_mut().enumerate() {
        set(record, (i + 1).to_string());
    }
}
