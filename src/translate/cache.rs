//! Content-addressed translation cache.
//!
//! Entries are keyed by an essay fingerprint and never expire. The on-disk
//! form is a pretty-printed JSON object sorted by fingerprint:
//!
//! ```json
//! {
//!   "9e107d9d372bb6826bd81d3542a419d6": {
//!     "en": { "title": "...", "excerpt": "...", "content": "..." },
//!     "de": { "title": "...", "excerpt": "...", "content": "..." }
//!   }
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::models::Language;

/// Translated fields for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedFields {
    pub title: String,
    pub excerpt: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en: Option<CachedFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub de: Option<CachedFields>,
}

impl CacheEntry {
    pub fn get(&self, lang: Language) -> Option<&CachedFields> {
        match lang {
            Language::En => self.en.as_ref(),
            Language::De => self.de.as_ref(),
            Language::Zh => None,
        }
    }

    /// Usable only when every target language is present.
    pub fn is_complete(&self) -> bool {
        self.en.is_some() && self.de.is_some()
    }
}

/// Storage behind the translation cache.
pub trait TranslationStore {
    fn get(&self, fingerprint: &str) -> Option<&CacheEntry>;
    fn put(&mut self, fingerprint: String, entry: CacheEntry);
    /// Persist pending changes.
    fn flush(&mut self) -> Result<()>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cache held in memory and written to one JSON file on flush.
#[derive(Debug)]
pub struct JsonFileCache {
    path: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
}

impl JsonFileCache {
    /// Read `path`. A missing file is an empty cache; an unreadable or
    /// corrupt one is logged and also treated as empty.
    pub fn load(path: &Path) -> Self {
        let entries = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "translation cache is corrupt, starting empty: {}", e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), "cannot read translation cache, starting empty: {}", e);
                BTreeMap::new()
            }
        };
        tracing::debug!(path = %path.display(), entries = entries.len(), "translation cache loaded");
        Self {
            path: path.to_path_buf(),
            entries,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TranslationStore for JsonFileCache {
    fn get(&self, fingerprint: &str) -> Option<&CacheEntry> {
        self.entries.get(fingerprint)
    }

    fn put(&mut self, fingerprint: String, entry: CacheEntry) {
        self.entries.insert(fingerprint, entry);
    }

    /// Rewrites the file only when its contents would change.
    fn flush(&mut self) -> Result<()> {
        let mut out = serde_json::to_string_pretty(&self.entries)?;
        out.push('\n');

        if std::fs::read_to_string(&self.path).ok().as_deref() == Some(out.as_str()) {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&self.path, out)
            .with_context(|| format!("Failed to write translation cache: {}", self.path.display()))?;
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Cache that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: BTreeMap<String, CacheEntry>,
}

impl TranslationStore for MemoryCache {
    fn get(&self, fingerprint: &str) -> Option<&CacheEntry> {
        self.entries.get(fingerprint)
    }

    fn put(&mut self, fingerprint: String, entry: CacheEntry) {
        self.entries.insert(fingerprint, entry);
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fields(t: &str) -> CachedFields {
        CachedFields {
            title: t.into(),
            excerpt: format!("{t} excerpt"),
            content: format!("{t} content"),
        }
    }

    #[test]
    fn missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let cache = JsonFileCache::load(&tmp.path().join("cache.json"));
        assert!(cache.is_empty());
    }

    #[test]
    fn corrupt_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cache.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(JsonFileCache::load(&path).is_empty());
    }

    #[test]
    fn flush_and_reload_sorted_with_newline() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/cache.json");
        let mut cache = JsonFileCache::load(&path);
        let entry = CacheEntry {
            en: Some(fields("Hello")),
            de: Some(fields("Hallo")),
        };
        cache.put("bbb".into(), entry.clone());
        cache.put("aaa".into(), entry.clone());
        cache.flush().unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.ends_with("}\n"));
        assert!(raw.find("\"aaa\"").unwrap() < raw.find("\"bbb\"").unwrap());
        assert!(raw.contains("\n  \"aaa\": {"));

        let reloaded = JsonFileCache::load(&path);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("aaa"), Some(&entry));
    }

    #[test]
    fn partial_entry_is_incomplete() {
        let entry = CacheEntry {
            en: Some(fields("Hello")),
            de: None,
        };
        assert!(!entry.is_complete());
        assert_eq!(entry.get(Language::En).map(|f| f.title.as_str()), Some("Hello"));
        assert!(entry.get(Language::Zh).is_none());
    }
}
