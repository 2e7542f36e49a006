//! Input corpus and integration status listing.
//!
//! Reports which inputs are configured and usable. Used by `folio sources`.
//!
//! # Health Checks
//!
//! | Source | Healthy When |
//! |--------|-------------|
//! | `essays`, `photos` | Export directory exists |
//! | `resume`, `timeline` | `NOTION_TOKEN` and the database id are set |
//! | `translation` | A provider has credentials |
//! | `data` | Every language data document exists |
//!
//! No network calls are made; remote access is checked at sync time.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use crate::config::{Config, Credentials};
use crate::dataset::DataDocuments;
use crate::models::Language;
use crate::translate::{forced_provider, ProviderKind};

/// Configuration and health status of a single input.
#[derive(Debug, Clone, Serialize)]
pub struct SourceStatus {
    pub name: String,
    pub configured: bool,
    pub healthy: bool,
    pub notes: Option<String>,
}

fn directory_status(name: &str, dir: &Path) -> SourceStatus {
    let exists = dir.is_dir();
    SourceStatus {
        name: name.to_string(),
        configured: true,
        healthy: exists,
        notes: Some(if exists {
            format!("dir: {}", dir.display())
        } else {
            format!("directory does not exist: {}", dir.display())
        }),
    }
}

fn notion_status(name: &str, token: bool, database_id: Option<&str>, env_var: &str) -> SourceStatus {
    let configured = database_id.is_some();
    let healthy = configured && token;
    let notes = match (token, database_id) {
        (_, None) => format!("{} is not set", env_var),
        (false, Some(_)) => "NOTION_TOKEN is not set".to_string(),
        (true, Some(id)) => format!("database: {}", id),
    };
    SourceStatus {
        name: name.to_string(),
        configured,
        healthy,
        notes: Some(notes),
    }
}

/// Returns the status of every input the sync commands read.
pub fn get_sources(config: &Config, creds: &Credentials) -> Vec<SourceStatus> {
    let mut sources = vec![
        directory_status("essays", &config.paths.posts_dir),
        directory_status("photos", &config.paths.photos_dir),
    ];

    let token = creds.notion_token.is_some();
    sources.push(notion_status(
        "resume",
        token,
        creds.resume_database_id.as_deref(),
        "NOTION_DATABASE_RESUME_ID",
    ));
    sources.push(notion_status(
        "timeline",
        token,
        creds.timeline_database_id.as_deref(),
        "NOTION_DATABASE_TIMELINE_ID",
    ));

    let provider = ProviderKind::select(forced_provider(&config.translation, creds), creds);
    sources.push(SourceStatus {
        name: "translation".to_string(),
        configured: provider.is_some(),
        healthy: provider.is_some(),
        notes: Some(match provider {
            Some(kind) => format!("provider: {}", kind.label()),
            None => "no provider credentials, essays pass through".to_string(),
        }),
    });

    let docs = DataDocuments::new(&config.paths.data_dir);
    let missing: Vec<&str> = Language::ALL
        .iter()
        .filter(|lang| !docs.path_for(**lang).exists())
        .map(|lang| lang.code())
        .collect();
    sources.push(SourceStatus {
        name: "data".to_string(),
        configured: true,
        healthy: missing.is_empty(),
        notes: Some(if missing.is_empty() {
            format!("dir: {}", config.paths.data_dir.display())
        } else {
            format!("missing data.{{{}}}.json", missing.join(","))
        }),
    });

    sources
}

/// CLI entry point for `folio sources`.
pub fn list_sources(config: &Config, creds: &Credentials) -> Result<()> {
    let sources = get_sources(config, creds);

    println!("{:<12} {:<16} {:<8} NOTES", "SOURCE", "STATUS", "HEALTHY");
    for s in &sources {
        let status_str = if s.configured { "OK" } else { "NOT CONFIGURED" };
        println!(
            "{:<12} {:<16} {:<8} {}",
            s.name,
            status_str,
            s.healthy,
            s.notes.as_deref().unwrap_or("")
        );
    }

    Ok(())
}
