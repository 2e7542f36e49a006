//! # Folio CLI (`folio`)
//!
//! Syncs portfolio content into the site's per-language data documents.
//!
//! ## Usage
//!
//! ```bash
//! folio [--config folio.toml] [--env-file .elog.env] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `folio sync essays` | Markdown posts → `essays`, translated to en/de |
//! | `folio sync photos` | Markdown photo pages → `photos`, expiring images mirrored |
//! | `folio sync resume` | Notion resume database → `resume` |
//! | `folio sync timeline` | Notion timeline database → `timeline` |
//! | `folio sync all` | All of the above, in order |
//! | `folio sources` | Show inputs, credentials and provider status |
//! | `folio translate [TEXT]` | Probe the active translation provider |
//! | `folio scrub` | Replace leaked expiring image links in the data documents |
//!
//! ## Examples
//!
//! ```bash
//! # Refresh essays after a Notion export
//! folio sync essays
//!
//! # Check that the Baidu credentials work
//! TRANSLATION_PROVIDER=baidu folio translate "你好" --to de
//!
//! # See what scrub would change
//! folio scrub --dry-run
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use folio_sync::config::{self, Credentials};
use folio_sync::models::Language;
use folio_sync::progress::ProgressMode;
use folio_sync::sync::SyncTarget;
use folio_sync::{dataset, logging, sources, sync, translate};

/// Folio: Notion exports and databases to multilingual site data.
///
/// File settings come from `--config` (optional). Secrets and database ids
/// come from the environment, loaded first from `--env-file`.
#[derive(Parser)]
#[command(
    name = "folio",
    about = "Folio: sync Notion content into per-language JSON data documents",
    version,
    long_about = "Folio reads essays and photos from Notion Markdown exports and the resume and \
    timeline from Notion databases, builds canonical records, mirrors expiring images locally, \
    translates essays with a cached provider gateway, and patches data.zh/en/de.json."
)]
struct Cli {
    /// Path to the settings file (TOML). Missing file means defaults.
    #[arg(long, global = true, default_value = "./folio.toml")]
    config: PathBuf,

    /// Dotfile with credentials. Variables already set in the environment win.
    #[arg(long, global = true, default_value = "./.elog.env")]
    env_file: PathBuf,

    /// Never print per-record progress, even on a terminal.
    #[arg(long, global = true)]
    no_progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync one content type (or all) into the data documents.
    Sync {
        #[arg(value_enum)]
        target: SyncTarget,
    },

    /// List inputs and integrations and whether they are usable.
    Sources,

    /// Translate a text once with the active provider.
    ///
    /// Prints the provider and masked credentials. Exits non-zero on any
    /// provider error.
    Translate {
        #[arg(default_value = "你好")]
        text: String,

        /// Target language (`en` or `de`).
        #[arg(long, default_value = "en", value_parser = parse_target)]
        to: Language,
    },

    /// Replace expiring signed image links in every data document.
    Scrub {
        /// Count replacements without writing.
        #[arg(long)]
        dry_run: bool,
    },
}

fn parse_target(s: &str) -> Result<Language, String> {
    match Language::parse(s) {
        Some(lang) if Language::TARGETS.contains(&lang) => Ok(lang),
        _ => Err(format!("unsupported target language '{}': use en or de", s)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init()?;

    let cfg = config::load_config(&cli.config)?;
    let creds = Credentials::load(&cli.env_file);

    match cli.command {
        Commands::Sync { target } => {
            let mode = if cli.no_progress {
                ProgressMode::Off
            } else {
                ProgressMode::default_for_tty()
            };
            let progress = mode.reporter();
            sync::run_sync(&cfg, &creds, target, progress.as_ref()).await?;
        }
        Commands::Sources => {
            sources::list_sources(&cfg, &creds)?;
        }
        Commands::Translate { text, to } => {
            translate::run_translate_probe(&cfg.translation, &creds, &text, to).await?;
        }
        Commands::Scrub { dry_run } => {
            dataset::run_scrub(&cfg, dry_run)?;
        }
    }

    Ok(())
}
