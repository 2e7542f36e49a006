use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use walkdir::WalkDir;

use crate::frontmatter::parse_front_matter;
use crate::models::SourceDocument;

/// Read every top-level `*.md` file under `root`, sorted by file name.
///
/// Subdirectories are not descended into. A file that cannot be read is
/// logged and skipped; a missing `root` is an error.
pub fn scan_markdown_dir(root: &Path) -> Result<Vec<SourceDocument>> {
    if !root.is_dir() {
        bail!("Export directory does not exist: {}", root.display());
    }

    let include_set = build_globset(&["*.md"])?;
    let mut docs = Vec::new();

    let walker = WalkDir::new(root).min_depth(1).max_depth(1);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().to_string();
        if !include_set.is_match(&file_name) {
            continue;
        }

        match file_to_document(entry.path(), file_name) {
            Ok(doc) => docs.push(doc),
            Err(e) => tracing::warn!(path = %entry.path().display(), "skipping unreadable file: {:#}", e),
        }
    }

    docs.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(docs)
}

fn file_to_document(path: &Path, file_name: String) -> Result<SourceDocument> {
    let raw = std::fs::read_to_string(path)?;
    let parsed = parse_front_matter(&raw);

    let stem = file_name
        .strip_suffix(".md")
        .unwrap_or(&file_name)
        .to_string();

    Ok(SourceDocument {
        path: path.to_path_buf(),
        file_name,
        stem,
        front_matter: parsed.front_matter,
        body: parsed.body,
    })
}

fn build_globset(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
