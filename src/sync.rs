//! Sync orchestration.
//!
//! Each content type runs as an independent step:
//!
//! ```text
//! corpus (Markdown dir | Notion data source)
//!   → builders (essays, photos, resume, timeline)
//!   → [essays] translation gateway + cache
//!   → [photos] asset materializer
//!   → data.<lang>.json, one top-level key replaced
//! ```
//!
//! A missing corpus or an unrecoverable API error is returned as an error.
//! An empty corpus, an empty build result, or an unconfigured optional
//! integration is a warned no-op that leaves every data document as is.

use anyhow::{anyhow, bail, Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

use crate::assets::AssetMaterializer;
use crate::config::{Config, Credentials};
use crate::dataset::{DataDocuments, PatchOutcome};
use crate::essays::build_essays;
use crate::fields::{AliasRule, KeyMap};
use crate::models::{Language, SourceDocument};
use crate::notion::{NotionClient, NotionError, PageRow};
use crate::photos::{build_draft, finalize_photos, materialize_photos};
use crate::progress::{SyncProgressEvent, SyncProgressReporter};
use crate::resume::{build_resume, ResumeRow};
use crate::source_fs::scan_markdown_dir;
use crate::timeline::{entry_from_page, finalize_entries};
use crate::translate::{
    create_translator, JsonFileCache, LocalizedEssays, TranslationGateway, TranslationStore,
    Translator,
};
use crate::{resume, timeline};

/// What `folio sync` should update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SyncTarget {
    Essays,
    Photos,
    Resume,
    Timeline,
    /// All four, in order. The first failure stops the run.
    All,
}

/// Counters for one sync step, printed as the command summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub corpus: &'static str,
    /// Records written to the data documents.
    pub records: usize,
    /// Source items dropped with a warning.
    pub dropped: usize,
    pub cache_hits: usize,
    pub translated: usize,
    pub documents_written: usize,
    /// Nothing to do; data documents were not touched.
    pub noop: bool,
}

impl SyncReport {
    fn noop(corpus: &'static str) -> Self {
        Self {
            corpus,
            noop: true,
            ..Default::default()
        }
    }

    pub fn print(&self) {
        println!("sync {}", self.corpus);
        if self.noop {
            println!("  nothing to do");
            println!("ok");
            return;
        }
        println!("  records: {}", self.records);
        if self.dropped > 0 {
            println!("  dropped: {}", self.dropped);
        }
        if self.corpus == "essays" {
            println!("  cache hits: {}", self.cache_hits);
            println!("  translated: {}", self.translated);
        }
        println!("  data files written: {}", self.documents_written);
        println!("ok");
    }
}

/// CLI entry point for `folio sync`.
pub async fn run_sync(
    config: &Config,
    creds: &Credentials,
    target: SyncTarget,
    progress: &dyn SyncProgressReporter,
) -> Result<()> {
    let steps: &[SyncTarget] = match target {
        SyncTarget::All => &[
            SyncTarget::Essays,
            SyncTarget::Photos,
            SyncTarget::Resume,
            SyncTarget::Timeline,
        ],
        SyncTarget::Essays => &[SyncTarget::Essays],
        SyncTarget::Photos => &[SyncTarget::Photos],
        SyncTarget::Resume => &[SyncTarget::Resume],
        SyncTarget::Timeline => &[SyncTarget::Timeline],
    };

    for step in steps {
        let report = match step {
            SyncTarget::Essays => sync_essays(config, creds, progress).await?,
            SyncTarget::Photos => sync_photos(config, progress).await?,
            SyncTarget::Resume => sync_resume(config, creds, progress).await?,
            SyncTarget::Timeline => sync_timeline(config, creds, progress).await?,
            SyncTarget::All => continue,
        };
        report.print();
    }
    Ok(())
}

// ============ Markdown corpora ============

/// Read an export directory. Missing is an error with guidance; empty is
/// returned as an empty list.
fn load_corpus(dir: &Path, corpus: &str, progress: &dyn SyncProgressReporter) -> Result<Vec<SourceDocument>> {
    progress.report(SyncProgressEvent::Discovering {
        corpus: corpus.to_string(),
    });
    if !dir.is_dir() {
        bail!(
            "{} export directory not found: {}\n  Export the Notion database to Markdown first, \
             or point paths.{}_dir in folio.toml at the export.",
            corpus,
            dir.display(),
            if corpus == "essays" { "posts" } else { corpus }
        );
    }
    let docs = scan_markdown_dir(dir)?;
    tracing::info!(corpus, dir = %dir.display(), files = docs.len(), "scanned export directory");
    Ok(docs)
}

/// Essays with the provider resolved from `creds`.
pub async fn sync_essays(
    config: &Config,
    creds: &Credentials,
    progress: &dyn SyncProgressReporter,
) -> Result<SyncReport> {
    let translator = create_translator(&config.translation, creds)?;
    sync_essays_with(config, translator.as_deref(), progress).await
}

/// Essays with an explicit translator; `None` passes source text through.
pub async fn sync_essays_with(
    config: &Config,
    translator: Option<&dyn Translator>,
    progress: &dyn SyncProgressReporter,
) -> Result<SyncReport> {
    let docs = load_corpus(&config.paths.posts_dir, "essays", progress)?;
    if docs.is_empty() {
        tracing::warn!(dir = %config.paths.posts_dir.display(), "no Markdown files found, essays left unchanged");
        return Ok(SyncReport::noop("essays"));
    }

    let essays = build_essays(&docs);

    let localized = match translator {
        Some(translator) => {
            tracing::info!(provider = translator.name(), essays = essays.len(), "translating essays");
            let mut cache = JsonFileCache::load(&config.paths.cache_file);
            let gateway = TranslationGateway::new(
                translator,
                Duration::from_millis(config.translation.delay_ms),
            );
            let localized = gateway.translate_essays(essays, &mut cache, progress).await;
            cache
                .flush()
                .with_context(|| format!("Failed to save {}", cache.path().display()))?;
            localized
        }
        None => {
            tracing::warn!(
                "no translation provider configured, en/de essays keep the Chinese text. \
                 Set DEEPL_AUTH_KEY, BAIDU_APP_ID + BAIDU_SECRET_KEY, or VOLC_ACCESSKEY + VOLC_SECRETKEY"
            );
            LocalizedEssays::passthrough(essays)
        }
    };

    let documents_written =
        write_documents(config, "essays", |lang| localized.for_language(lang))?;

    Ok(SyncReport {
        corpus: "essays",
        records: localized.zh.len(),
        dropped: 0,
        cache_hits: localized.hits,
        translated: localized.misses,
        documents_written,
        noop: false,
    })
}

pub async fn sync_photos(config: &Config, progress: &dyn SyncProgressReporter) -> Result<SyncReport> {
    let docs = load_corpus(&config.paths.photos_dir, "photos", progress)?;
    if docs.is_empty() {
        tracing::warn!(dir = %config.paths.photos_dir.display(), "no Markdown files found, photos left unchanged");
        return Ok(SyncReport::noop("photos"));
    }

    let prefix = &config.images.public_prefix;
    let drafts: Vec<_> = docs
        .iter()
        .enumerate()
        .filter_map(|(i, doc)| build_draft(doc, i, prefix))
        .collect();

    let assets = AssetMaterializer::new(
        &config.paths.images_dir,
        prefix,
        config.images.download_timeout_secs,
    )?;
    let mut photos = materialize_photos(drafts, &assets).await;
    finalize_photos(&mut photos);

    let dropped = docs.len() - photos.len();
    if photos.is_empty() {
        tracing::warn!(files = docs.len(), "no photo could be built, photos left unchanged");
        return Ok(SyncReport {
            dropped,
            ..SyncReport::noop("photos")
        });
    }

    let documents_written = write_documents(config, "photos", |_| photos.as_slice())?;

    Ok(SyncReport {
        corpus: "photos",
        records: photos.len(),
        dropped,
        documents_written,
        ..Default::default()
    })
}

// ============ Notion corpora ============

/// Token and database id, or `None` after warning how to configure them.
fn notion_settings<'a>(
    creds: &'a Credentials,
    database_id: Option<&'a str>,
    env_var: &str,
    corpus: &str,
) -> Option<(&'a str, &'a str)> {
    match (creds.notion_token.as_deref(), database_id) {
        (Some(token), Some(id)) => Some((token, id)),
        _ => {
            tracing::warn!(
                "NOTION_TOKEN or {} is not set, skipping {} sync. Add both to .elog.env",
                env_var,
                corpus
            );
            None
        }
    }
}

fn notion_error(err: NotionError, env_var: &str) -> anyhow::Error {
    if err.is_not_found() {
        anyhow!(
            "Notion database not found. Check that {} is correct and that the database \
             is connected to your integration.",
            env_var
        )
    } else {
        anyhow::Error::new(err).context("Notion API error")
    }
}

/// Resolve the data source behind `database_id` and drain every row.
async fn fetch_rows(
    config: &Config,
    token: &str,
    database_id: &str,
    rules: &[AliasRule],
    env_var: &str,
) -> Result<(KeyMap, Vec<PageRow>)> {
    let client = NotionClient::new(&config.notion, token)?;
    let source = client
        .resolve_source(database_id)
        .await
        .map_err(|e| notion_error(e, env_var))?;
    let rows = client
        .query_all(&source.id)
        .await
        .map_err(|e| notion_error(e, env_var))?;
    tracing::info!(data_source = %source.id, columns = source.columns.len(), rows = rows.len(), "queried Notion");
    Ok((source.key_map(rules), rows))
}

pub async fn sync_resume(
    config: &Config,
    creds: &Credentials,
    progress: &dyn SyncProgressReporter,
) -> Result<SyncReport> {
    const ENV: &str = "NOTION_DATABASE_RESUME_ID";
    let Some((token, database_id)) =
        notion_settings(creds, creds.resume_database_id.as_deref(), ENV, "resume")
    else {
        return Ok(SyncReport::noop("resume"));
    };

    progress.report(SyncProgressEvent::Discovering {
        corpus: "resume".to_string(),
    });
    let (keys, pages) = fetch_rows(config, token, database_id, resume::ALIAS_RULES, ENV).await?;
    let rows: Vec<ResumeRow> = pages.iter().map(|p| ResumeRow::from_page(p, &keys)).collect();
    let built = build_resume(&rows);

    if built.is_empty() {
        tracing::warn!(rows = rows.len(), "resume database is empty or has no usable rows, resume left unchanged");
        return Ok(SyncReport::noop("resume"));
    }

    let documents_written = write_documents(config, "resume", |_| &built)?;
    tracing::info!(
        experience = built.experience.len(),
        education = built.education.len(),
        "resume built"
    );

    Ok(SyncReport {
        corpus: "resume",
        records: rows.len(),
        documents_written,
        ..Default::default()
    })
}

pub async fn sync_timeline(
    config: &Config,
    creds: &Credentials,
    progress: &dyn SyncProgressReporter,
) -> Result<SyncReport> {
    const ENV: &str = "NOTION_DATABASE_TIMELINE_ID";
    let Some((token, database_id)) =
        notion_settings(creds, creds.timeline_database_id.as_deref(), ENV, "timeline")
    else {
        return Ok(SyncReport::noop("timeline"));
    };

    progress.report(SyncProgressEvent::Discovering {
        corpus: "timeline".to_string(),
    });
    let (keys, pages) = fetch_rows(config, token, database_id, timeline::ALIAS_RULES, ENV).await?;
    let entries = pages
        .iter()
        .map(|p| (p.id.clone(), entry_from_page(p, &keys)))
        .collect();
    let current_year = chrono::Utc::now().format("%Y").to_string();
    let entries = finalize_entries(entries, &current_year);

    if entries.is_empty() {
        tracing::warn!(rows = pages.len(), "timeline database is empty or has no usable rows, timeline left unchanged");
        return Ok(SyncReport::noop("timeline"));
    }

    let documents_written = write_documents(config, "timeline", |_| entries.as_slice())?;

    Ok(SyncReport {
        corpus: "timeline",
        records: entries.len(),
        dropped: pages.len() - entries.len(),
        documents_written,
        ..Default::default()
    })
}

// ============ Output ============

/// Patch `key` in every language document. Returns how many were rewritten.
fn write_documents<'a, T, F>(config: &Config, key: &str, value_for: F) -> Result<usize>
where
    T: Serialize + ?Sized + 'a,
    F: Fn(Language) -> &'a T,
{
    let docs = DataDocuments::new(&config.paths.data_dir);
    let mut written = 0;
    for (lang, outcome) in docs.patch_key_all(key, value_for)? {
        match outcome {
            PatchOutcome::Written => written += 1,
            PatchOutcome::Unchanged => {}
            PatchOutcome::Missing => {
                tracing::warn!(path = %docs.path_for(lang).display(), "data document missing, skipped")
            }
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_report() {
        let r = SyncReport::noop("resume");
        assert!(r.noop);
        assert_eq!(r.records, 0);
        assert_eq!(r.corpus, "resume");
    }

    #[test]
    fn target_parses_from_cli_names() {
        assert_eq!(SyncTarget::from_str("timeline", true), Ok(SyncTarget::Timeline));
        assert!(SyncTarget::from_str("videos", true).is_err());
    }
}
