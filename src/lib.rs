//! # Folio Sync
//!
//! Incremental content sync for a multilingual portfolio site.
//!
//! Folio Sync pulls content out of a Notion workspace (either as Markdown
//! exports on disk or straight from the Notion API), turns it into canonical
//! records, mirrors expiring images to durable local storage, translates
//! essays with a cached provider gateway, and patches one JSON data document
//! per site language.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌───────────────┐   ┌──────────────┐
//! │   Sources    │──▶│ Front matter │──▶│   Builders    │──▶│   Dataset    │
//! │ Markdown dir │   │ Field resolve│   │ essay / photo │   │ data.zh.json │
//! │ Notion API   │   │ Alias tables │   │ resume / time │   │ data.en.json │
//! └──────────────┘   └──────────────┘   └──────┬────────┘   │ data.de.json │
//!                                              │            └──────▲───────┘
//!                               ┌──────────────┴─────────┐         │
//!                               ▼                        ▼         │
//!                        ┌────────────┐          ┌──────────────┐  │
//!                        │   Assets   │          │  Translate   │──┘
//!                        │ (photos)   │          │ cache + APIs │
//!                        └────────────┘          └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! folio sources            # show which inputs and credentials are present
//! folio sync essays        # Markdown export → essays (zh/en/de)
//! folio sync photos        # Markdown export → photos, images mirrored locally
//! folio sync resume        # Notion data source → resume
//! folio sync timeline      # Notion data source → timeline
//! folio sync all
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | File settings and environment credentials |
//! | [`models`] | Canonical records and languages |
//! | [`frontmatter`] | Markdown front-matter parser |
//! | [`fields`] | Field resolver and schema alias tables |
//! | [`text`] | Markdown stripping, excerpts, date normalization |
//! | [`classify`] | Resume row classification rules |
//! | [`source_fs`] | Markdown directory scanner |
//! | [`notion`] | Notion data-source client |
//! | [`essays`], [`photos`], [`resume`], [`timeline`] | Record builders |
//! | [`assets`] | Expiring image materializer |
//! | [`translate`] | Translation providers, cache, and gateway |
//! | [`dataset`] | Per-language JSON documents |
//! | [`sync`] | Sync orchestration |
//! | [`sources`] | Input and integration status |
//! | [`progress`] | Per-record progress reporting |
//! | [`logging`] | Tracing subscriber setup |

pub mod assets;
pub mod classify;
pub mod config;
pub mod dataset;
pub mod essays;
pub mod fields;
pub mod frontmatter;
pub mod logging;
pub mod models;
pub mod notion;
pub mod photos;
pub mod progress;
pub mod resume;
pub mod source_fs;
pub mod sources;
pub mod sync;
pub mod text;
pub mod timeline;
pub mod translate;
