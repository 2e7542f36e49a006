//! Volcano Engine machine translation (`TranslateText`, version 2020-06-01).
//!
//! Requests are signed with the Volcano Engine HMAC-SHA256 scheme:
//!
//! ```text
//! kDate    = HMAC(secret, yyyymmdd)
//! kRegion  = HMAC(kDate, region)
//! kService = HMAC(kRegion, "translate")
//! kSigning = HMAC(kService, "request")
//! ```
//!
//! The signature covers `content-type`, `host`, `x-content-sha256` and
//! `x-date`, and is sent as
//! `Authorization: HMAC-SHA256 Credential=<ak>/<scope>, SignedHeaders=..., Signature=...`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::{ProviderError, Translator};
use crate::models::Language;

const PROVIDER: &str = "volc";
const SERVICE: &str = "translate";
const QUERY: &str = "Action=TranslateText&Version=2020-06-01";
const CONTENT_TYPE: &str = "application/json";

type HmacSha256 = Hmac<Sha256>;

pub struct VolcCredentials {
    pub access_key: String,
    pub secret_key: String,
}

pub struct Volc {
    client: reqwest::Client,
    url: String,
    host: String,
    region: String,
    creds: VolcCredentials,
}

impl Volc {
    pub fn new(
        client: reqwest::Client,
        endpoint: &str,
        region: &str,
        creds: VolcCredentials,
    ) -> Result<Self> {
        let parsed = url::Url::parse(endpoint)
            .with_context(|| format!("Invalid Volcano Engine endpoint: {}", endpoint))?;
        let host = authority(&parsed)
            .with_context(|| format!("Volcano Engine endpoint has no host: {}", endpoint))?;
        Ok(Self {
            client,
            url: format!("{}/?{}", endpoint.trim_end_matches('/'), QUERY),
            host,
            region: region.to_string(),
            creds,
        })
    }
}

/// `host[:port]` exactly as sent in the `Host` header.
fn authority(url: &url::Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Headers to attach to a signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SignedHeaders {
    pub x_date: String,
    pub x_content_sha256: String,
    pub authorization: String,
}

pub(crate) fn sign(
    creds: &VolcCredentials,
    region: &str,
    host: &str,
    body: &[u8],
    now: DateTime<Utc>,
) -> SignedHeaders {
    let x_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let short_date = now.format("%Y%m%d").to_string();
    let payload_hash = hex_sha256(body);

    let headers = [
        ("content-type", CONTENT_TYPE),
        ("host", host),
        ("x-content-sha256", payload_hash.as_str()),
        ("x-date", x_date.as_str()),
    ];
    let signed_headers = headers
        .iter()
        .map(|(k, _)| *k)
        .collect::<Vec<_>>()
        .join(";");
    let canonical_headers: String = headers
        .iter()
        .map(|(k, v)| format!("{}:{}\n", k, v))
        .collect();

    let canonical_request = format!(
        "POST\n/\n{}\n{}\n{}\n{}",
        QUERY, canonical_headers, signed_headers, payload_hash
    );

    let credential_scope = format!("{}/{}/{}/request", short_date, region, SERVICE);
    let string_to_sign = format!(
        "HMAC-SHA256\n{}\n{}\n{}",
        x_date,
        credential_scope,
        hex_sha256(canonical_request.as_bytes())
    );

    let signing_key = derive_signing_key(&creds.secret_key, &short_date, region);
    let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

    SignedHeaders {
        authorization: format!(
            "HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            creds.access_key, credential_scope, signed_headers, signature
        ),
        x_date,
        x_content_sha256: payload_hash,
    }
}

fn hex_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn derive_signing_key(secret_key: &str, short_date: &str, region: &str) -> Vec<u8> {
    let k_date = hmac_sha256(secret_key.as_bytes(), short_date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, SERVICE.as_bytes());
    hmac_sha256(&k_service, b"request")
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VolcResponse {
    #[serde(default)]
    translation_list: Vec<VolcTranslation>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VolcTranslation {
    translation: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResponseMetadata {
    #[serde(default)]
    error: Option<VolcError>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VolcError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[async_trait]
impl Translator for Volc {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn translate(&self, text: &str, target: Language) -> Result<String, ProviderError> {
        let body = serde_json::json!({
            "SourceLanguage": "zh",
            "TargetLanguage": target.code(),
            "TextList": [text],
        })
        .to_string()
        .into_bytes();

        let signed = sign(&self.creds, &self.region, &self.host, &body, Utc::now());

        let resp = self
            .client
            .post(&self.url)
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Date", &signed.x_date)
            .header("X-Content-Sha256", &signed.x_content_sha256)
            .header("Authorization", &signed.authorization)
            .body(body)
            .send()
            .await
            .map_err(ProviderError::transport(PROVIDER))?;

        let status = resp.status();
        let raw = resp.text().await.map_err(ProviderError::transport(PROVIDER))?;

        // Errors arrive as JSON metadata, often with a non-2xx status
        let parsed: Option<VolcResponse> = serde_json::from_str(&raw).ok();
        if let Some(err) = parsed
            .as_ref()
            .and_then(|p| p.response_metadata.as_ref())
            .and_then(|m| m.error.as_ref())
        {
            return Err(ProviderError::Remote {
                provider: PROVIDER,
                code: err.code.clone(),
                message: err.message.clone(),
            });
        }
        if !status.is_success() {
            return Err(ProviderError::status(PROVIDER, status, &raw));
        }

        parsed
            .and_then(|p| p.translation_list.into_iter().next())
            .map(|t| t.translation)
            .filter(|t| !t.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse { provider: PROVIDER })
    }
}
