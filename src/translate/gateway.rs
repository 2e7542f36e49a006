//! Cached, soft-failing essay translation.
//!
//! Per essay:
//!
//! ```text
//! fingerprint ──▶ cache hit (en + de)? ──yes──▶ use cached text
//!                        │ no
//!                        ▼
//!              translate title/excerpt/content
//!              to en and de concurrently (6 requests)
//!                        │
//!          both languages changed? ──yes──▶ write cache entry
//!                        │ no
//!                        ▼
//!                 emit without caching
//! ```
//!
//! A provider error never aborts the batch: the field keeps its source text
//! and a warning is logged. Because unchanged text blocks the cache write,
//! a failed essay is retried on the next run.

use md5::{Digest, Md5};
use std::time::Duration;

use super::cache::{CacheEntry, CachedFields, TranslationStore};
use super::Translator;
use crate::models::{Essay, Language};
use crate::progress::{SyncProgressEvent, SyncProgressReporter};

/// MD5 over title, excerpt, content and date joined by NUL, lowercase hex.
pub fn fingerprint(essay: &Essay) -> String {
    let mut hasher = Md5::new();
    hasher.update(essay.title.as_bytes());
    hasher.update([0u8]);
    hasher.update(essay.excerpt.as_bytes());
    hasher.update([0u8]);
    hasher.update(essay.content.as_bytes());
    hasher.update([0u8]);
    hasher.update(essay.date.as_bytes());
    hex::encode(hasher.finalize())
}

/// Essays for every language, in the same order and with the same ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedEssays {
    pub zh: Vec<Essay>,
    pub en: Vec<Essay>,
    pub de: Vec<Essay>,
    pub hits: usize,
    pub misses: usize,
    pub cache_writes: usize,
}

impl LocalizedEssays {
    /// Source text for every language.
    pub fn passthrough(essays: Vec<Essay>) -> Self {
        Self {
            en: essays.clone(),
            de: essays.clone(),
            zh: essays,
            ..Default::default()
        }
    }

    pub fn for_language(&self, lang: Language) -> &[Essay] {
        match lang {
            Language::Zh => &self.zh,
            Language::En => &self.en,
            Language::De => &self.de,
        }
    }
}

fn apply(essay: &Essay, fields: &CachedFields) -> Essay {
    Essay {
        title: fields.title.clone(),
        excerpt: fields.excerpt.clone(),
        content: fields.content.clone(),
        ..essay.clone()
    }
}

/// A translation counts as real only when title or content moved.
fn changed(essay: &Essay, fields: &CachedFields) -> bool {
    fields.title != essay.title || fields.content != essay.content
}

pub struct TranslationGateway<'a> {
    translator: &'a dyn Translator,
    delay: Duration,
}

impl<'a> TranslationGateway<'a> {
    pub fn new(translator: &'a dyn Translator, delay: Duration) -> Self {
        Self { translator, delay }
    }

    /// Translate one field, returning the source text on any failure.
    pub async fn translate_soft(&self, text: &str, target: Language) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }
        match self.translator.translate(text, target).await {
            Ok(out) => {
                let out = out.trim();
                if out.is_empty() {
                    text.to_string()
                } else {
                    out.to_string()
                }
            }
            Err(e) => {
                tracing::warn!(provider = self.translator.name(), lang = %target, "translation failed, keeping source text: {}", e);
                text.to_string()
            }
        }
    }

    async fn translate_fields(&self, essay: &Essay, target: Language) -> CachedFields {
        let (title, excerpt, content) = tokio::join!(
            self.translate_soft(&essay.title, target),
            self.translate_soft(&essay.excerpt, target),
            self.translate_soft(&essay.content, target),
        );
        CachedFields {
            title,
            excerpt,
            content,
        }
    }

    /// Both target languages, all fields in flight at once.
    pub async fn translate_essay(&self, essay: &Essay) -> (CachedFields, CachedFields) {
        tokio::join!(
            self.translate_fields(essay, Language::En),
            self.translate_fields(essay, Language::De),
        )
    }

    /// Translate `essays` in order, consulting and updating `store`.
    ///
    /// The store is flushed by the caller.
    pub async fn translate_essays(
        &self,
        essays: Vec<Essay>,
        store: &mut dyn TranslationStore,
        progress: &dyn SyncProgressReporter,
    ) -> LocalizedEssays {
        let total = essays.len();
        let mut out = LocalizedEssays {
            en: Vec::with_capacity(total),
            de: Vec::with_capacity(total),
            ..Default::default()
        };

        for (i, essay) in essays.iter().enumerate() {
            let key = fingerprint(essay);

            let cached = store
                .get(&key)
                .filter(|entry| entry.is_complete())
                .and_then(|entry| Some((entry.en.clone()?, entry.de.clone()?)));

            let (en, de, hit) = match cached {
                Some((en, de)) => (en, de, true),
                None => {
                    let (en, de) = self.translate_essay(essay).await;
                    if changed(essay, &en) && changed(essay, &de) {
                        store.put(
                            key,
                            CacheEntry {
                                en: Some(en.clone()),
                                de: Some(de.clone()),
                            },
                        );
                        out.cache_writes += 1;
                    } else {
                        tracing::warn!(title = %essay.title, "translation unchanged for at least one language, not caching");
                    }
                    (en, de, false)
                }
            };

            if hit {
                out.hits += 1;
            } else {
                out.misses += 1;
            }
            progress.report(SyncProgressEvent::Translating {
                n: i + 1,
                total,
                title: essay.title.clone(),
                cached: hit,
            });

            out.en.push(apply(essay, &en));
            out.de.push(apply(essay, &de));

            if !hit && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        out.zh = essays;
        out
    }
}
