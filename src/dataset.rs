//! Per-language data documents (`data.<lang>.json`).
//!
//! Each sync replaces a single top-level key and leaves every other key,
//! and the key order, untouched. Documents are written with two-space
//! indentation and a trailing newline, and only when their bytes change.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::models::Language;
use crate::photos::is_expiring_url;

/// Result of patching one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Written,
    Unchanged,
    /// The document does not exist; nothing was created.
    Missing,
}

pub struct DataDocuments {
    dir: PathBuf,
}

impl DataDocuments {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, lang: Language) -> PathBuf {
        self.dir.join(format!("data.{}.json", lang.code()))
    }

    /// Replace `key` in the document for `lang` with `value`.
    pub fn patch_key<T: Serialize + ?Sized>(
        &self,
        lang: Language,
        key: &str,
        value: &T,
    ) -> Result<PatchOutcome> {
        match self.prepare(lang, key, value)? {
            Some(patch) => patch.commit(),
            None => Ok(PatchOutcome::Missing),
        }
    }

    /// Replace `key` in every language document.
    ///
    /// All documents are read and checked before the first one is written,
    /// so a malformed document leaves every language untouched.
    pub fn patch_key_all<'a, T, F>(&self, key: &str, value_for: F) -> Result<Vec<(Language, PatchOutcome)>>
    where
        T: Serialize + ?Sized + 'a,
        F: Fn(Language) -> &'a T,
    {
        let mut prepared = Vec::with_capacity(Language::ALL.len());
        for lang in Language::ALL {
            prepared.push((lang, self.prepare(lang, key, value_for(lang))?));
        }

        let mut outcomes = Vec::with_capacity(prepared.len());
        for (lang, patch) in prepared {
            let outcome = match patch {
                Some(patch) => patch.commit()?,
                None => PatchOutcome::Missing,
            };
            outcomes.push((lang, outcome));
        }
        Ok(outcomes)
    }

    fn prepare<T: Serialize + ?Sized>(
        &self,
        lang: Language,
        key: &str,
        value: &T,
    ) -> Result<Option<PreparedPatch>> {
        let path = self.path_for(lang);
        let Some((original, mut doc)) = read_document(&path)? else {
            return Ok(None);
        };

        let value = serde_json::to_value(value)
            .with_context(|| format!("Failed to serialize '{}'", key))?;
        let Some(obj) = doc.as_object_mut() else {
            bail!("{} is not a JSON object", path.display());
        };
        obj.insert(key.to_string(), value);

        let rendered = render(&doc)?;
        let changed = rendered != original;
        Ok(Some(PreparedPatch {
            path,
            rendered,
            changed,
        }))
    }
}

/// A patched document rendered in memory, not yet written.
struct PreparedPatch {
    path: PathBuf,
    rendered: String,
    changed: bool,
}

impl PreparedPatch {
    fn commit(self) -> Result<PatchOutcome> {
        if !self.changed {
            return Ok(PatchOutcome::Unchanged);
        }
        std::fs::write(&self.path, self.rendered)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(PatchOutcome::Written)
    }
}

fn read_document(path: &Path) -> Result<Option<(String, Value)>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let doc: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some((raw, doc)))
}

/// Pretty JSON with a trailing newline.
pub fn render(doc: &Value) -> Result<String> {
    let mut out = serde_json::to_string_pretty(doc).context("Failed to serialize document")?;
    out.push('\n');
    Ok(out)
}

fn write_if_changed(path: &Path, original: &str, doc: &Value) -> Result<PatchOutcome> {
    let rendered = render(doc)?;
    if rendered == original {
        return Ok(PatchOutcome::Unchanged);
    }
    std::fs::write(path, rendered).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(PatchOutcome::Written)
}

/// Replace every string holding an expiring URL with `placeholder`.
/// Returns the number of replaced values.
pub fn scrub_expiring_urls(value: &mut Value, placeholder: &str) -> usize {
    match value {
        Value::String(s) if is_expiring_url(s) => {
            *s = placeholder.to_string();
            1
        }
        Value::Array(items) => items
            .iter_mut()
            .map(|v| scrub_expiring_urls(v, placeholder))
            .sum(),
        Value::Object(map) => map
            .values_mut()
            .map(|v| scrub_expiring_urls(v, placeholder))
            .sum(),
        _ => 0,
    }
}

/// Per-document scrub result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrubReport {
    pub lang: Language,
    pub path: PathBuf,
    pub replaced: usize,
    pub outcome: PatchOutcome,
}

impl DataDocuments {
    /// Scrub every language document. With `dry_run`, count only.
    pub fn scrub(&self, placeholder: &str, dry_run: bool) -> Result<Vec<ScrubReport>> {
        let mut reports = Vec::new();
        for lang in Language::ALL {
            let path = self.path_for(lang);
            let Some((original, mut doc)) = read_document(&path)? else {
                reports.push(ScrubReport {
                    lang,
                    path,
                    replaced: 0,
                    outcome: PatchOutcome::Missing,
                });
                continue;
            };

            let replaced = scrub_expiring_urls(&mut doc, placeholder);
            let outcome = if replaced == 0 || dry_run {
                PatchOutcome::Unchanged
            } else {
                write_if_changed(&path, &original, &doc)?
            };
            reports.push(ScrubReport {
                lang,
                path,
                replaced,
                outcome,
            });
        }
        Ok(reports)
    }
}

/// Placeholder image for scrubbed links, under the public image prefix.
pub fn redacted_placeholder(public_prefix: &str) -> String {
    format!("{}/photo-REDACTED.png", public_prefix.trim_end_matches('/'))
}

/// CLI entry point for `folio scrub`.
pub fn run_scrub(config: &Config, dry_run: bool) -> Result<()> {
    let docs = DataDocuments::new(&config.paths.data_dir);
    let placeholder = redacted_placeholder(&config.images.public_prefix);
    let reports = docs.scrub(&placeholder, dry_run)?;

    println!("scrub{}", if dry_run { " (dry-run)" } else { "" });
    for r in &reports {
        match r.outcome {
            PatchOutcome::Missing => println!("  {}: missing", r.path.display()),
            _ => println!("  {}: {} replaced", r.path.display(), r.replaced),
        }
    }
    let total: usize = reports.iter().map(|r| r.replaced).sum();
    println!("  total: {}", total);
    println!("ok");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup(doc: &str) -> (TempDir, DataDocuments) {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("data.zh.json"), doc).unwrap();
        let docs = DataDocuments::new(tmp.path());
        (tmp, docs)
    }

    #[test]
    fn patch_preserves_sibling_keys_and_order() {
        let (_tmp, docs) = setup("{\n  \"nav\": {\"home\": \"首页\"},\n  \"essays\": [],\n  \"footer\": \"x\"\n}\n");
        let outcome = docs
            .patch_key(Language::Zh, "essays", &json!([{"id": "1"}]))
            .unwrap();
        assert_eq!(outcome, PatchOutcome::Written);

        let raw = std::fs::read_to_string(docs.path_for(Language::Zh)).unwrap();
        assert!(raw.ends_with("}\n"));
        let nav = raw.find("\"nav\"").unwrap();
        let essays = raw.find("\"essays\"").unwrap();
        let footer = raw.find("\"footer\"").unwrap();
        assert!(nav < essays && essays < footer);
        assert!(raw.contains("\"home\": \"首页\""));
    }

    #[test]
    fn second_patch_is_unchanged() {
        let (_tmp, docs) = setup("{\"photos\": []}");
        let value = json!([{"id": "1", "url": "/images/elog/a.png"}]);
        assert_eq!(
            docs.patch_key(Language::Zh, "photos", &value).unwrap(),
            PatchOutcome::Written
        );
        assert_eq!(
            docs.patch_key(Language::Zh, "photos", &value).unwrap(),
            PatchOutcome::Unchanged
        );
    }

    #[test]
    fn missing_document_is_not_created() {
        let (_tmp, docs) = setup("{}");
        assert_eq!(
            docs.patch_key(Language::De, "essays", &json!([])).unwrap(),
            PatchOutcome::Missing
        );
        assert!(!docs.path_for(Language::De).exists());
    }

    #[test]
    fn non_object_document_is_an_error() {
        let (_tmp, docs) = setup("[]");
        assert!(docs.patch_key(Language::Zh, "essays", &json!([])).is_err());
    }

    #[test]
    fn malformed_document_blocks_every_language() {
        let seed = "{\"essays\": []}";
        let (tmp, docs) = setup(seed);
        std::fs::write(tmp.path().join("data.en.json"), "[]").unwrap();
        std::fs::write(tmp.path().join("data.de.json"), seed).unwrap();

        let value = json!([{"id": "1"}]);
        assert!(docs.patch_key_all("essays", |_| &value).is_err());
        for lang in Language::ALL {
            let raw = std::fs::read_to_string(docs.path_for(lang)).unwrap();
            assert!(!raw.contains("\"id\""), "{} was written", lang);
        }
    }

    #[test]
    fn patch_all_reports_each_language() {
        let (tmp, docs) = setup("{\"essays\": []}");
        std::fs::write(tmp.path().join("data.en.json"), "{\"essays\": []}").unwrap();

        let value = json!([]);
        let outcomes = docs.patch_key_all("essays", |_| &value).unwrap();
        assert_eq!(
            outcomes,
            vec![
                (Language::Zh, PatchOutcome::Written),
                (Language::En, PatchOutcome::Written),
                (Language::De, PatchOutcome::Missing),
            ]
        );
    }

    #[test]
    fn scrub_replaces_nested_expiring_urls() {
        let mut v = json!({
            "photos": [
                {"url": "https://prod-files-secure.s3.us-west-2.amazonaws.com/a.png?X-Amz-Expires=3600"},
                {"url": "/images/elog/ok.png"}
            ],
            "cover": "https://example.com/x.png?X-Amz-Expires=60"
        });
        let n = scrub_expiring_urls(&mut v, "/images/elog/photo-REDACTED.png");
        assert_eq!(n, 2);
        assert_eq!(v["photos"][0]["url"], "/images/elog/photo-REDACTED.png");
        assert_eq!(v["photos"][1]["url"], "/images/elog/ok.png");
    }

    #[test]
    fn placeholder_follows_prefix() {
        assert_eq!(redacted_placeholder("/images/elog/"), "/images/elog/photo-REDACTED.png");
    }

    #[test]
    fn scrub_dry_run_leaves_file() {
        let doc = "{\"u\": \"https://x/y?X-Amz-Expires=1\"}";
        let (_tmp, docs) = setup(doc);
        let reports = docs.scrub("/p.png", true).unwrap();
        assert_eq!(reports[0].replaced, 1);
        assert_eq!(reports[0].outcome, PatchOutcome::Unchanged);
        assert_eq!(reports[1].outcome, PatchOutcome::Missing);
        assert_eq!(std::fs::read_to_string(docs.path_for(Language::Zh)).unwrap(), doc);

        let reports = docs.scrub("/p.png", false).unwrap();
        assert_eq!(reports[0].outcome, PatchOutcome::Written);
        let raw = std::fs::read_to_string(docs.path_for(Language::Zh)).unwrap();
        assert!(raw.contains("/p.png"));
    }
}
