//! Essay translation: providers, cache, and the soft-failing gateway.
//!
//! # Providers
//!
//! | Provider | Credentials | Request |
//! |----------|-------------|---------|
//! | DeepL | `DEEPL_AUTH_KEY` | form POST, `DeepL-Auth-Key` header |
//! | Baidu | `BAIDU_APP_ID` + `BAIDU_SECRET_KEY` | GET, MD5 signed query |
//! | Volcano Engine | `VOLC_ACCESSKEY` + `VOLC_SECRETKEY` | JSON POST, HMAC-SHA256 signed headers |
//!
//! One provider is selected per run by [`ProviderKind::select`]: a forced
//! provider whose credentials are present, then DeepL, Baidu, Volcano
//! Engine in that order. With none available essays pass through
//! untranslated.
//!
//! Every provider implements [`Translator`] and returns a typed
//! [`ProviderError`]. The [`gateway`] is the single place that turns an
//! error into "keep the source text and warn".

pub mod baidu;
pub mod cache;
pub mod deepl;
pub mod gateway;
pub mod volc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::config::{Credentials, TranslationConfig};
use crate::models::Language;

pub use cache::{CacheEntry, CachedFields, JsonFileCache, MemoryCache, TranslationStore};
pub use gateway::{fingerprint, LocalizedEssays, TranslationGateway};

/// Maximum number of response-body characters kept in errors.
const ERROR_BODY_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} HTTP {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("{provider} {code}: {message}")]
    Remote {
        provider: &'static str,
        code: String,
        message: String,
    },
    #[error("{provider} returned no translation")]
    EmptyResponse { provider: &'static str },
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl ProviderError {
    pub(crate) fn status(provider: &'static str, status: reqwest::StatusCode, body: &str) -> Self {
        ProviderError::Status {
            provider,
            status: status.as_u16(),
            body: body.chars().take(ERROR_BODY_CHARS).collect(),
        }
    }

    pub(crate) fn transport(provider: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| ProviderError::Transport { provider, source }
    }
}

/// Translates Chinese source text into a target language.
///
/// Implementations make exactly one HTTP request per call and never
/// substitute the input on failure; that policy belongs to the gateway.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Short provider identifier used in logs.
    fn name(&self) -> &str;

    async fn translate(&self, text: &str, target: Language) -> Result<String, ProviderError>;
}

/// The translation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    DeepL,
    Baidu,
    Volc,
}

impl ProviderKind {
    /// Automatic selection order.
    const PRECEDENCE: [ProviderKind; 3] = [ProviderKind::DeepL, ProviderKind::Baidu, ProviderKind::Volc];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "deepl" => Some(ProviderKind::DeepL),
            "baidu" => Some(ProviderKind::Baidu),
            "volc" => Some(ProviderKind::Volc),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::DeepL => "deepl",
            ProviderKind::Baidu => "baidu",
            ProviderKind::Volc => "volc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::DeepL => "DeepL",
            ProviderKind::Baidu => "Baidu Translate",
            ProviderKind::Volc => "Volcano Engine",
        }
    }

    pub fn has_credentials(&self, creds: &Credentials) -> bool {
        match self {
            ProviderKind::DeepL => creds.deepl_auth_key.is_some(),
            ProviderKind::Baidu => creds.baidu_app_id.is_some() && creds.baidu_secret_key.is_some(),
            ProviderKind::Volc => creds.volc_access_key.is_some() && creds.volc_secret_key.is_some(),
        }
    }

    /// Pick the provider for this run.
    ///
    /// `forced` wins only when its credentials are present; otherwise the
    /// first provider in precedence order with credentials is used.
    pub fn select(forced: Option<&str>, creds: &Credentials) -> Option<Self> {
        if let Some(kind) = forced.and_then(ProviderKind::parse) {
            if kind.has_credentials(creds) {
                return Some(kind);
            }
            tracing::warn!(
                provider = kind.id(),
                "forced translation provider has no credentials, falling back"
            );
        }
        Self::PRECEDENCE
            .into_iter()
            .find(|kind| kind.has_credentials(creds))
    }
}

/// Forced provider name: `TRANSLATION_PROVIDER`, then the config file.
pub fn forced_provider<'a>(config: &'a TranslationConfig, creds: &'a Credentials) -> Option<&'a str> {
    creds
        .translation_provider
        .as_deref()
        .or(config.provider.as_deref())
}

/// Resolve the active provider and construct its client.
pub fn create_translator(
    config: &TranslationConfig,
    creds: &Credentials,
) -> Result<Option<Box<dyn Translator>>> {
    let Some(kind) = ProviderKind::select(forced_provider(config, creds), creds) else {
        return Ok(None);
    };
    build_translator(kind, config, creds).map(Some)
}

fn build_translator(
    kind: ProviderKind,
    config: &TranslationConfig,
    creds: &Credentials,
) -> Result<Box<dyn Translator>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    let missing = || format!("{} credentials are not set", kind.label());

    let translator: Box<dyn Translator> = match kind {
        ProviderKind::DeepL => Box::new(deepl::DeepL::new(
            client,
            &config.deepl_url,
            creds.deepl_auth_key.clone().with_context(missing)?,
        )),
        ProviderKind::Baidu => Box::new(baidu::Baidu::new(
            client,
            &config.baidu_url,
            creds.baidu_app_id.clone().with_context(missing)?,
            creds.baidu_secret_key.clone().with_context(missing)?,
        )),
        ProviderKind::Volc => Box::new(volc::Volc::new(
            client,
            &config.volc_endpoint,
            &config.volc_region,
            volc::VolcCredentials {
                access_key: creds.volc_access_key.clone().with_context(missing)?,
                secret_key: creds.volc_secret_key.clone().with_context(missing)?,
            },
        )?),
    };
    Ok(translator)
}

// ============ Connectivity probe ============

/// `abcd...wxyz (len 32)`; values of 8 chars or fewer are fully masked.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    let len = chars.len();
    if len <= 8 {
        return format!("{} (len {})", "*".repeat(len), len);
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[len - 4..].iter().collect();
    format!("{}...{} (len {})", head, tail, len)
}

fn credential_lines(kind: ProviderKind, creds: &Credentials) -> Vec<(&'static str, Option<&str>)> {
    match kind {
        ProviderKind::DeepL => vec![("DEEPL_AUTH_KEY", creds.deepl_auth_key.as_deref())],
        ProviderKind::Baidu => vec![
            ("BAIDU_APP_ID", creds.baidu_app_id.as_deref()),
            ("BAIDU_SECRET_KEY", creds.baidu_secret_key.as_deref()),
        ],
        ProviderKind::Volc => vec![
            ("VOLC_ACCESSKEY", creds.volc_access_key.as_deref()),
            ("VOLC_SECRETKEY", creds.volc_secret_key.as_deref()),
        ],
    }
}

/// Translate `text` once with the active provider and print the result.
///
/// Unlike the sync gateway this fails hard on any provider error.
pub async fn run_translate_probe(
    config: &TranslationConfig,
    creds: &Credentials,
    text: &str,
    target: Language,
) -> Result<()> {
    let Some(kind) = ProviderKind::select(forced_provider(config, creds), creds) else {
        bail!(
            "No translation provider configured. Set DEEPL_AUTH_KEY, \
             BAIDU_APP_ID + BAIDU_SECRET_KEY, or VOLC_ACCESSKEY + VOLC_SECRETKEY."
        );
    };

    println!("provider: {}", kind.label());
    for (var, value) in credential_lines(kind, creds) {
        println!("  {:<18} {}", var, value.map(mask_secret).unwrap_or_default());
    }

    let translator = build_translator(kind, config, creds)?;
    match translator.translate(text, target).await {
        Ok(out) => {
            println!("ok: {} -> {}", text, out.trim());
            Ok(())
        }
        Err(ProviderError::Remote { code, message, .. }) if kind == ProviderKind::Baidu && code == "54001" => {
            bail!(
                "Baidu 54001: {}. This usually means BAIDU_SECRET_KEY is wrong; check it in the Baidu Translate console.",
                message
            )
        }
        Err(e) => Err(e).with_context(|| format!("{} translation failed", kind.label())),
    }
}
