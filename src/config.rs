//! Configuration: file settings plus environment credentials.
//!
//! Settings that describe *where* things live (directories, endpoints,
//! timeouts) come from an optional TOML file. Secrets and remote
//! identifiers come from environment variables, which are first loaded
//! from a dotfile. Both are resolved once in `main` and passed down as
//! values; nothing below this module reads the environment.
//!
//! # Example
//!
//! ```toml
//! [paths]
//! posts_dir = "content/elog-posts"
//! data_dir = "src/i18n"
//!
//! [translation]
//! provider = "baidu"
//! delay_ms = 500
//! ```

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub images: ImagesConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub notion: NotionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    #[serde(default = "default_posts_dir")]
    pub posts_dir: PathBuf,
    #[serde(default = "default_photos_dir")]
    pub photos_dir: PathBuf,
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            posts_dir: default_posts_dir(),
            photos_dir: default_photos_dir(),
            images_dir: default_images_dir(),
            data_dir: default_data_dir(),
            cache_file: default_cache_file(),
        }
    }
}

fn default_posts_dir() -> PathBuf {
    PathBuf::from("content/elog-posts")
}
fn default_photos_dir() -> PathBuf {
    PathBuf::from("content/elog-photos")
}
fn default_images_dir() -> PathBuf {
    PathBuf::from("public/images/elog")
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("src/i18n")
}
fn default_cache_file() -> PathBuf {
    PathBuf::from("scripts/.essay-translation-cache.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImagesConfig {
    /// URL prefix under which `images_dir` is served.
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
    #[serde(default = "default_timeout_secs")]
    pub download_timeout_secs: u64,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            public_prefix: default_public_prefix(),
            download_timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_public_prefix() -> String {
    "/images/elog".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Forced provider (`deepl`, `baidu`, `volc`). `TRANSLATION_PROVIDER`
    /// takes precedence over this value.
    #[serde(default)]
    pub provider: Option<String>,
    /// Pause after every essay that missed the cache.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_deepl_url")]
    pub deepl_url: String,
    #[serde(default = "default_baidu_url")]
    pub baidu_url: String,
    #[serde(default = "default_volc_endpoint")]
    pub volc_endpoint: String,
    #[serde(default = "default_volc_region")]
    pub volc_region: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: None,
            delay_ms: default_delay_ms(),
            timeout_secs: default_timeout_secs(),
            deepl_url: default_deepl_url(),
            baidu_url: default_baidu_url(),
            volc_endpoint: default_volc_endpoint(),
            volc_region: default_volc_region(),
        }
    }
}

fn default_delay_ms() -> u64 {
    300
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_deepl_url() -> String {
    "https://api-free.deepl.com/v2/translate".to_string()
}
fn default_baidu_url() -> String {
    "https://fanyi-api.baidu.com/api/trans/vip/translate".to_string()
}
fn default_volc_endpoint() -> String {
    "https://translate.volcengineapi.com".to_string()
}
fn default_volc_region() -> String {
    "cn-north-1".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotionConfig {
    #[serde(default = "default_notion_api_base")]
    pub api_base: String,
    #[serde(default = "default_notion_version")]
    pub version: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_base: default_notion_api_base(),
            version: default_notion_version(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_notion_api_base() -> String {
    "https://api.notion.com/v1".to_string()
}
fn default_notion_version() -> String {
    "2025-09-03".to_string()
}

/// Load settings from `path`. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.images.download_timeout_secs == 0 {
        bail!("images.download_timeout_secs must be > 0");
    }
    if config.translation.timeout_secs == 0 {
        bail!("translation.timeout_secs must be > 0");
    }
    if config.notion.timeout_secs == 0 {
        bail!("notion.timeout_secs must be > 0");
    }
    if !config.images.public_prefix.starts_with('/') {
        bail!(
            "images.public_prefix must be root-relative (start with '/'), got '{}'",
            config.images.public_prefix
        );
    }

    match config.translation.provider.as_deref() {
        None | Some("deepl" | "baidu" | "volc") => {}
        Some(other) => bail!(
            "Unknown translation provider: '{}'. Must be deepl, baidu, or volc.",
            other
        ),
    }

    Ok(())
}

// ============ Credentials ============

/// Secrets and remote identifiers read from the environment.
///
/// Every value is trimmed; blank variables count as unset.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub notion_token: Option<String>,
    pub resume_database_id: Option<String>,
    pub timeline_database_id: Option<String>,
    pub translation_provider: Option<String>,
    pub deepl_auth_key: Option<String>,
    pub baidu_app_id: Option<String>,
    pub baidu_secret_key: Option<String>,
    pub volc_access_key: Option<String>,
    pub volc_secret_key: Option<String>,
}

impl Credentials {
    /// Load `env_file` into the process environment (existing variables
    /// win), then read all credentials.
    pub fn load(env_file: &Path) -> Self {
        match dotenvy::from_path(env_file) {
            Ok(()) => tracing::debug!(path = %env_file.display(), "loaded env file"),
            Err(e) if e.not_found() => {
                tracing::debug!(path = %env_file.display(), "env file not found")
            }
            Err(e) => tracing::warn!(path = %env_file.display(), "failed to load env file: {}", e),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build credentials from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            notion_token: get("NOTION_TOKEN"),
            resume_database_id: get("NOTION_DATABASE_RESUME_ID")
                .and_then(|v| extract_database_id(&v)),
            timeline_database_id: get("NOTION_DATABASE_TIMELINE_ID")
                .and_then(|v| extract_database_id(&v)),
            translation_provider: get("TRANSLATION_PROVIDER").map(|v| v.to_lowercase()),
            deepl_auth_key: get("DEEPL_AUTH_KEY"),
            baidu_app_id: get("BAIDU_APP_ID"),
            baidu_secret_key: get("BAIDU_SECRET_KEY"),
            volc_access_key: get("VOLC_ACCESSKEY"),
            volc_secret_key: get("VOLC_SECRETKEY"),
        }
    }
}

static HEX32: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)[a-f0-9]{32}").unwrap());
static URL_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^https?://[^/]+/").unwrap());

/// Extract a 32-hex database id from a bare id, a dashed UUID, or a share URL.
pub fn extract_database_id(raw: &str) -> Option<String> {
    let s = raw.trim();
    if let Some(m) = HEX32.find(s) {
        return Some(m.as_str().to_string());
    }

    let without_host = URL_PREFIX.replace(s, "");
    let without_query = without_host
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .replace('-', "");

    if without_query.is_empty() {
        None
    } else {
        Some(without_query)
    }
}
