//! Durable local copies of remote images.
//!
//! Signed storage links expire after about an hour, so photos that point at
//! them are downloaded into the public image directory and referenced by a
//! root-relative path instead. The local file name is derived from a stable
//! upstream document id, not from the URL, which changes on every export.
//! An image that already exists on disk is never fetched again.

use anyhow::Context;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

const MAX_BASE_LEN: usize = 60;
const DEFAULT_EXT: &str = "png";

static IMAGE_EXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(png|jpg|jpeg|gif|webp)$").unwrap());

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("HTTP {status}{}", expired_hint(.status))]
    Http { status: u16 },
    #[error("timed out after {0}s")]
    Timeout(u64),
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn expired_hint<S: std::borrow::Borrow<u16>>(status: S) -> &'static str {
    if *status.borrow() == 403 {
        " (signed link has expired; refresh the Markdown export and retry)"
    } else {
        ""
    }
}

/// Downloads images into `dir` and serves them under `public_prefix`.
pub struct AssetMaterializer {
    dir: PathBuf,
    public_prefix: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl AssetMaterializer {
    pub fn new(dir: impl Into<PathBuf>, public_prefix: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build HTTP client for image downloads")?;
        Ok(Self {
            dir: dir.into(),
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
            timeout_secs,
            client,
        })
    }

    /// Return the public path of `base_name`'s image, downloading `url`
    /// first if no local copy exists.
    pub async fn materialize(&self, url: &str, base_name: &str) -> Result<String, AssetError> {
        let file_name = local_file_name(url, base_name);
        let public = format!("{}/{}", self.public_prefix, file_name);
        let out_path = self.dir.join(&file_name);

        if out_path.exists() {
            tracing::debug!(path = %out_path.display(), "image already stored");
            return Ok(public);
        }

        let bytes = self.fetch(url).await?;
        self.write(&out_path, &bytes)?;
        Ok(public)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AssetError::Http {
                status: status.as_u16(),
            });
        }

        let bytes = resp.bytes().await.map_err(|e| self.classify(e))?;
        Ok(bytes.to_vec())
    }

    fn classify(&self, e: reqwest::Error) -> AssetError {
        if e.is_timeout() {
            AssetError::Timeout(self.timeout_secs)
        } else {
            AssetError::Transport(e)
        }
    }

    /// The image only appears under its final name once fully written.
    fn write(&self, out_path: &Path, bytes: &[u8]) -> Result<(), AssetError> {
        let io_err = |source| AssetError::Io {
            path: out_path.to_path_buf(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        let part = out_path.with_extension("part");
        std::fs::write(&part, bytes).map_err(io_err)?;
        std::fs::rename(&part, out_path).map_err(io_err)?;
        Ok(())
    }
}

/// Sanitized `base_name` (at most 60 chars of `[A-Za-z0-9_-]`, others
/// replaced by `_`) plus the URL's image extension, default `png`.
pub fn local_file_name(url: &str, base_name: &str) -> String {
    let safe: String = base_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_BASE_LEN)
        .collect();
    format!("{}.{}", safe, extension_of(url))
}

fn extension_of(url: &str) -> String {
    let path = match url::Url::parse(url) {
        Ok(u) => u.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    IMAGE_EXT
        .captures(&path)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_else(|| DEFAULT_EXT.to_string())
}
